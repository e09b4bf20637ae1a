//! Structured rich text as delivered by the document API.
//!
//! A rich-text field is a JSON array of blocks. Text-bearing blocks carry a
//! `text` string plus `spans` that decorate ranges of it:
//!
//! ```json
//! [
//!   { "type": "heading2", "text": "Proin et varius", "spans": [] },
//!   { "type": "paragraph", "text": "Nullam dolor sapien",
//!     "spans": [{ "start": 0, "end": 6, "type": "strong" }] },
//!   { "type": "image", "url": "https://images.example/cover.png", "alt": null }
//! ]
//! ```
//!
//! Span offsets count UTF-16 code units, the way the API's JavaScript side
//! indexes strings. [`as_text`] flattens a field to plain text for word
//! counting; [`as_html`] renders it to escaped markup.

use maud::{Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};

/// A rich-text field: an ordered sequence of blocks.
pub type RichText = Vec<RichTextBlock>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    /// Block kind: `paragraph`, `heading1`..`heading6`, `preformatted`,
    /// `list-item`, `o-list-item`, `image` or `embed`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image source (image blocks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Embed>,
}

/// Inline decoration of a `[start, end)` range of a block's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// `strong`, `em`, `hyperlink` or `label`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// oEmbed payload of an embed block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl RichTextBlock {
    /// Convenience constructor for a span-less text block.
    pub fn text(kind: &str, text: &str) -> Self {
        Self {
            kind: kind.to_string(),
            text: text.to_string(),
            ..Self::default()
        }
    }

    fn has_text(&self) -> bool {
        !matches!(self.kind.as_str(), "image" | "embed")
    }
}

/// Flatten a rich-text field to plain text.
///
/// The text of every text-bearing block is joined with a single space;
/// images and embeds contribute nothing. No markup survives.
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .filter(|b| b.has_text())
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a rich-text field to markup.
///
/// All text is escaped by Maud. Consecutive list items share one list
/// element; embed HTML is trusted as delivered by the API.
pub fn as_html(blocks: &[RichTextBlock]) -> Markup {
    html! {
        @for group in group_blocks(blocks) {
            @match group {
                Group::Single(block) => {
                    (render_block(block))
                }
                Group::List { ordered: true, items } => {
                    ol {
                        @for item in items {
                            li { (render_text(item)) }
                        }
                    }
                }
                Group::List { ordered: false, items } => {
                    ul {
                        @for item in items {
                            li { (render_text(item)) }
                        }
                    }
                }
            }
        }
    }
}

enum Group<'a> {
    Single(&'a RichTextBlock),
    List {
        ordered: bool,
        items: Vec<&'a RichTextBlock>,
    },
}

fn list_kind(block: &RichTextBlock) -> Option<bool> {
    match block.kind.as_str() {
        "list-item" => Some(false),
        "o-list-item" => Some(true),
        _ => None,
    }
}

fn group_blocks(blocks: &[RichTextBlock]) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for block in blocks {
        match (list_kind(block), groups.last_mut()) {
            (Some(ordered), Some(Group::List { ordered: open, items })) if *open == ordered => {
                items.push(block);
            }
            (Some(ordered), _) => groups.push(Group::List {
                ordered,
                items: vec![block],
            }),
            (None, _) => groups.push(Group::Single(block)),
        }
    }
    groups
}

fn render_block(block: &RichTextBlock) -> Markup {
    let text = render_text(block);
    match block.kind.as_str() {
        "heading1" => html! { h1 { (text) } },
        "heading2" => html! { h2 { (text) } },
        "heading3" => html! { h3 { (text) } },
        "heading4" => html! { h4 { (text) } },
        "heading5" => html! { h5 { (text) } },
        "heading6" => html! { h6 { (text) } },
        "preformatted" => html! { pre { (text) } },
        "image" => html! {
            p.block-img {
                img src=[block.url.as_deref()] alt=(block.alt.as_deref().unwrap_or_default());
            }
        },
        "embed" => match &block.oembed {
            Some(embed) => html! {
                div data-oembed=[embed.embed_url.as_deref()] data-oembed-type=[embed.kind.as_deref()] {
                    (PreEscaped(&embed.html))
                }
            },
            None => html! {},
        },
        _ => html! { p { (text) } },
    }
}

/// Render a block's text with its spans applied.
///
/// The text is cut at every span boundary; each segment is wrapped in the
/// spans covering it, so overlapping spans still yield well-formed markup.
fn render_text(block: &RichTextBlock) -> Markup {
    let text = block.text.as_str();
    let spans: Vec<(usize, usize, &Span)> = block
        .spans
        .iter()
        .map(|s| (utf16_to_byte(text, s.start), utf16_to_byte(text, s.end), s))
        .filter(|(start, end, _)| start < end)
        .collect();

    let mut cuts: Vec<usize> = vec![0, text.len()];
    for (start, end, _) in &spans {
        cuts.push(*start);
        cuts.push(*end);
    }
    cuts.sort_unstable();
    cuts.dedup();

    html! {
        @for pair in cuts.windows(2) {
            @let (from, to) = (pair[0], pair[1]);
            @let covering: Vec<&Span> = spans
                .iter()
                .filter(|(start, end, _)| *start <= from && to <= *end)
                .map(|(_, _, span)| *span)
                .collect();
            (wrap_segment(&text[from..to], &covering))
        }
    }
}

fn wrap_segment(segment: &str, spans: &[&Span]) -> Markup {
    let Some((span, rest)) = spans.split_first() else {
        return html! {
            @for (i, line) in segment.split('\n').enumerate() {
                @if i > 0 { br; }
                (line)
            }
        };
    };
    let inner = wrap_segment(segment, rest);
    let data = span.data.as_ref();
    match span.kind.as_str() {
        "strong" => html! { strong { (inner) } },
        "em" => html! { em { (inner) } },
        "hyperlink" => {
            let href = data.and_then(|d| d.url.as_deref()).unwrap_or("#");
            let target = data.and_then(|d| d.target.as_deref());
            let rel = target.map(|_| "noopener noreferrer");
            html! { a href=(href) target=[target] rel=[rel] { (inner) } }
        }
        "label" => {
            let class = data.and_then(|d| d.label.as_deref());
            html! { span class=[class] { (inner) } }
        }
        _ => inner,
    }
}

/// Map a UTF-16 code unit offset to a byte offset into `text`.
///
/// Offsets past the end, or falling inside a surrogate pair, snap forward to
/// the next character boundary.
fn utf16_to_byte(text: &str, offset: usize) -> usize {
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        if units >= offset {
            return byte;
        }
        units += ch.len_utf16();
    }
    text.len()
}
