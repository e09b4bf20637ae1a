//! Projection of raw API documents onto the shapes the pages need.
//!
//! The API returns `data` as free-form JSON. Projection pulls out the few
//! fields the site renders and rejects documents that lack the essentials
//! (a UID and a title) with [`CmsError::MalformedDocument`].
//!
//! Text fields may be configured in the CMS either as key text (a JSON
//! string) or as rich text (a block array); both project to a plain string.

use crate::cms::{CmsError, RawDocument};
use crate::richtext::{self, RichText};
use crate::types::{Post, is_safe_uid};
use serde::Deserialize;
use serde_json::Value;

/// Fields fetched for list entries; keeps list queries small.
pub fn list_fetch_fields(doc_type: &str) -> Vec<String> {
    ["title", "subtitle", "author"]
        .iter()
        .map(|field| format!("{doc_type}.{field}"))
        .collect()
}

/// Project a document onto the post list shape.
pub fn project_post(doc: &RawDocument) -> Result<Post, CmsError> {
    Ok(Post {
        uid: require_uid(doc)?,
        published_at: doc.published_at()?,
        title: require_text(doc, "title")?,
        subtitle: optional_text(doc, "subtitle"),
        author: optional_text(doc, "author"),
    })
}

/// A content section before rendering keys are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSection {
    pub heading: String,
    pub body: RichText,
}

/// The fields of a post page, before assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailFields {
    pub uid: String,
    pub title: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub content: Vec<ContentSection>,
}

#[derive(Deserialize)]
struct RawSection {
    #[serde(default)]
    heading: Option<Value>,
    #[serde(default)]
    body: Option<RichText>,
}

/// Extract the post page fields of a document.
///
/// An absent `content` group means a post with zero sections.
pub fn project_detail_fields(doc: &RawDocument) -> Result<DetailFields, CmsError> {
    let content = match doc.data.get("content") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => {
            let sections: Vec<RawSection> = serde_json::from_value(value.clone())
                .map_err(|e| CmsError::malformed(&doc.id, format!("bad content group: {e}")))?;
            sections
                .into_iter()
                .map(|s| ContentSection {
                    heading: s.heading.as_ref().map(flatten_text).unwrap_or_default(),
                    body: s.body.unwrap_or_default(),
                })
                .collect()
        }
    };

    let banner_url = doc
        .data
        .get("banner")
        .and_then(|b| b.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(DetailFields {
        uid: require_uid(doc)?,
        title: require_text(doc, "title")?,
        author: optional_text(doc, "author"),
        banner_url,
        content,
    })
}

fn require_uid(doc: &RawDocument) -> Result<String, CmsError> {
    let uid = doc
        .uid
        .clone()
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| CmsError::malformed(&doc.id, "missing uid"))?;
    if !is_safe_uid(&uid) {
        return Err(CmsError::malformed(&doc.id, format!("uid {uid:?} is not a path segment")));
    }
    Ok(uid)
}

fn require_text(doc: &RawDocument, field: &str) -> Result<String, CmsError> {
    doc.data
        .get(field)
        .filter(|v| !v.is_null())
        .map(flatten_text)
        .ok_or_else(|| CmsError::malformed(&doc.id, format!("missing {field}")))
}

fn optional_text(doc: &RawDocument, field: &str) -> String {
    doc.data.get(field).map(flatten_text).unwrap_or_default()
}

/// Read a key-text or rich-text value as plain text.
fn flatten_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) => serde_json::from_value::<RichText>(value.clone())
            .map(|blocks| richtext::as_text(&blocks))
            .unwrap_or_default(),
        _ => String::new(),
    }
}
