//! Preview mode.
//!
//! A preview session carries the CMS ref of unpublished content. Every query
//! of a build made in preview mode runs against that ref, and every page
//! offers a button leading out of preview mode.

use crate::config::PreviewConfig;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

/// The content ref a build runs against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSession {
    reference: Option<String>,
}

impl PreviewSession {
    /// A session over the given ref, kept exactly as given. Blank refs
    /// select published content.
    pub fn new(reference: Option<String>) -> Self {
        let reference = reference.filter(|r| !r.trim().is_empty());
        Self { reference }
    }

    /// Published content only.
    pub fn published() -> Self {
        Self::default()
    }

    /// The ref to pass to queries; `None` means the master ref.
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.reference.is_some()
    }
}

/// The "exit preview" link, rendered as a button.
pub fn exit_preview_button(config: &PreviewConfig, label: &str) -> Markup {
    html! {
        aside.exit-preview {
            a href=(config.exit_url) { (label) }
        }
    }
}
