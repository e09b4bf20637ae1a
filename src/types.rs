//! Shared types used across pipeline stages.
//!
//! These types are serialized into the fetch manifest and read back by the
//! generate stage, so both sides must agree on them.

use crate::richtext::RichText;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use uuid::Uuid;

/// A post as shown in the post list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Document UID, used to build the post URL.
    pub uid: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl Post {
    /// Site-relative URL of the post page.
    pub fn href(&self) -> String {
        post_href(&self.uid)
    }
}

pub fn post_href(uid: &str) -> String {
    format!("/post/{uid}/")
}

/// Whether `uid` can name its own directory under `post/`: exactly one
/// normal path component, with no separators of either platform.
pub fn is_safe_uid(uid: &str) -> bool {
    if uid.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(uid).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// One section of a post body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Rendering key. Random per assembly and carries no meaning.
    pub key: Uuid,
    pub heading: String,
    pub body: RichText,
}

/// A fully assembled post page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    /// API document ID, the anchor of adjacency queries.
    pub document_id: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub last_edited_at: Option<DateTime<FixedOffset>>,
    /// Localized "edited" note; `None` when the post was never edited.
    pub edited_label: Option<String>,
    pub title: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub blocks: Vec<Block>,
    pub reading_time_minutes: u32,
}

/// Title and UID of a neighbouring post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacentPostRef {
    pub uid: String,
    pub title: String,
}

/// Chronological neighbours of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacent {
    /// Nearest earlier post.
    pub prev: Option<AdjacentPostRef>,
    /// Nearest later post.
    pub next: Option<AdjacentPostRef>,
}
