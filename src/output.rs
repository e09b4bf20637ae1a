//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not API-centric**. The primary display
//! for every post is its semantic identity (positional index and title), with
//! the UID, dates, and navigation shown as indented context lines. The output
//! reads as a content inventory while still letting users trace a page back
//! to the document it came from.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! Posts
//! 001 Como utilizar Hooks
//!     UID: como-utilizar-hooks
//!     Published: 15 mar 2021
//!     Reading time: 4 min
//!     Previous: Criando um app CRA do zero
//!
//! Skipped
//!     vanished-post (not found)
//!
//! Index
//!     2 posts on the first page, more available
//! ```
//!
//! ## Generate
//!
//! ```text
//! Home → index.html
//! 001 Como utilizar Hooks → post/como-utilizar-hooks/index.html
//! Not found → 404.html
//!
//! Generated 1 post page
//! ```
//!
//! ## Load more
//!
//! ```text
//! Index
//! 001 Como utilizar Hooks
//! 002 Criando um app CRA do zero
//! 003 Mapas com React usando Leaflet
//! Loaded 1 post, 3 in total, more available
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::config::SiteConfig;
use crate::fetch::{FetchResult, Manifest};
use crate::generate::format_date;
use crate::pagination::PaginationState;
use crate::types::Post;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Pluralize a count: `1 post`, `2 posts`.
fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn availability(state: &PaginationState) -> &'static str {
    if state.has_more() {
        "more available"
    } else {
        "no more pages"
    }
}

/// Index + title lines of a post list.
fn post_lines(posts: &[Post]) -> Vec<String> {
    posts
        .iter()
        .enumerate()
        .map(|(i, post)| format!("{} {}", format_index(i + 1), post.title))
        .collect()
}

// ============================================================================
// Fetch output
// ============================================================================

/// Format fetch stage output: every assembled post with its context.
pub fn format_fetch_output(result: &FetchResult) -> Vec<String> {
    let manifest = &result.manifest;
    let config = &manifest.config;
    let mut lines = vec!["Posts".to_string()];

    for (i, page) in manifest.posts.iter().enumerate() {
        let post = &page.detail;
        lines.push(format!("{} {}", format_index(i + 1), post.title));
        lines.push(format!("    UID: {}", post.uid));
        let published = format_date(post.published_at.as_ref(), config);
        if !published.is_empty() {
            lines.push(format!("    Published: {}", published));
        }
        lines.push(format!("    Reading time: {} min", post.reading_time_minutes));
        if let Some(label) = &post.edited_label {
            lines.push(format!("    Edited: {}", label.trim_start_matches("* ")));
        }
        if let Some(prev) = &page.adjacent.prev {
            lines.push(format!("    Previous: {}", prev.title));
        }
        if let Some(next) = &page.adjacent.next {
            lines.push(format!("    Next: {}", next.title));
        }
    }

    if !result.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for uid in &result.skipped {
            lines.push(format!("    {} (not found)", uid));
        }
    }

    lines.push(String::new());
    lines.push("Index".to_string());
    lines.push(format!(
        "    {} on the first page, {}",
        count(manifest.index.posts().len(), "post"),
        availability(&manifest.index)
    ));
    if manifest.preview {
        lines.push("    Preview content".to_string());
    }

    lines
}

/// Print fetch output to stdout.
pub fn print_fetch_output(result: &FetchResult) {
    for line in format_fetch_output(result) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate output
// ============================================================================

/// Format generate stage output showing generated HTML files.
///
/// Information-first: each post leads with its positional index and title,
/// followed by `→` and the output path.
pub fn format_generate_output(manifest: &Manifest) -> Vec<String> {
    let mut lines = vec!["Home \u{2192} index.html".to_string()];

    for (i, page) in manifest.posts.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} post/{}/index.html",
            format_index(i + 1),
            page.detail.title,
            page.detail.uid
        ));
    }
    lines.push("Not found \u{2192} 404.html".to_string());

    lines.push(String::new());
    lines.push(format!(
        "Generated {}",
        count(manifest.posts.len(), "post page")
    ));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(manifest: &Manifest) {
    for line in format_generate_output(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Load more output
// ============================================================================

/// Format the post list after a "load more".
pub fn format_load_more_output(before: usize, state: &PaginationState) -> Vec<String> {
    let mut lines = vec!["Index".to_string()];
    lines.extend(post_lines(state.posts()));
    lines.push(format!(
        "Loaded {}, {} in total, {}",
        count(state.posts().len().saturating_sub(before), "post"),
        state.posts().len(),
        availability(state)
    ));
    lines
}

/// Print load-more output to stdout.
pub fn print_load_more_output(before: usize, state: &PaginationState) {
    for line in format_load_more_output(before, state) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format check output: the resolved settings and the first list page.
pub fn format_check_output(config: &SiteConfig, first_page: &PaginationState) -> Vec<String> {
    let mut lines = vec![
        "Config".to_string(),
        format!("    Endpoint: {}", config.cms.endpoint),
        format!("    Document type: {}", config.cms.document_type),
        format!("    Page size: {}", config.cms.page_size),
        format!("    Locale: {}", config.locale.name),
    ];
    if config.comments.enabled() {
        lines.push(format!("    Comments: {}", config.comments.repo));
    }

    lines.push(String::new());
    lines.push("First page".to_string());
    for post in first_page.posts() {
        let mut line = format!("    {} ({})", post.title, post.uid);
        if !post.subtitle.is_empty() {
            line = format!("{}: {}", line, truncate(&post.subtitle, 40));
        }
        lines.push(line);
    }
    lines.push(format!("    {}", availability(first_page)));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(config: &SiteConfig, first_page: &PaginationState) {
    for line in format_check_output(config, first_page) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
