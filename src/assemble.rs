//! Post page assembly: rendering keys, reading time, and the edited label.

use crate::cms::{CmsError, RawDocument};
use crate::config::SiteConfig;
use crate::projection::project_detail_fields;
use crate::richtext;
use crate::types::{Block, PostDetail};
use chrono::{DateTime, FixedOffset, Locale};
use uuid::Uuid;

/// Words per minute assumed when none is configured.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Estimated reading time in whole minutes, rounded up.
///
/// `text` is split on single spaces and every piece counts as a word. An
/// empty text has no words and reads in 0 minutes.
pub fn reading_time_minutes(text: &str, words_per_minute: u32) -> u32 {
    let words = count_words(text);
    words.div_ceil(words_per_minute.max(1) as usize) as u32
}

fn count_words(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.split(' ').count()
    }
}

/// Turns raw post documents into [`PostDetail`]s.
#[derive(Debug, Clone)]
pub struct PostAssembler {
    words_per_minute: u32,
    locale: Locale,
    edited_format: String,
}

impl PostAssembler {
    pub fn new(words_per_minute: u32, locale: Locale, edited_format: impl Into<String>) -> Self {
        Self {
            words_per_minute,
            locale,
            edited_format: edited_format.into(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            config.reading.words_per_minute,
            config.chrono_locale(),
            config.locale.edited_format.clone(),
        )
    }

    /// Assemble a post page.
    ///
    /// Every block gets a fresh random key, so assembling the same document
    /// twice yields different keys.
    pub fn assemble(&self, doc: &RawDocument) -> Result<PostDetail, CmsError> {
        let fields = project_detail_fields(doc)?;
        let published_at = doc.published_at()?;
        let last_edited_at = doc.last_edited_at()?;

        let text: String = fields
            .content
            .iter()
            .map(|section| richtext::as_text(&section.body))
            .collect();
        let reading_time_minutes = reading_time_minutes(&text, self.words_per_minute);

        let edited_label = if doc.first_publication_date != doc.last_publication_date {
            last_edited_at.map(|at| self.format_edited(&at))
        } else {
            None
        };

        let blocks = fields
            .content
            .into_iter()
            .map(|section| Block {
                key: Uuid::new_v4(),
                heading: section.heading,
                body: section.body,
            })
            .collect();

        Ok(PostDetail {
            uid: fields.uid,
            document_id: doc.id.clone(),
            published_at,
            last_edited_at,
            edited_label,
            title: fields.title,
            author: fields.author,
            banner_url: fields.banner_url,
            blocks,
            reading_time_minutes,
        })
    }

    fn format_edited(&self, at: &DateTime<FixedOffset>) -> String {
        at.format_localized(&self.edited_format, self.locale)
            .to_string()
    }
}

impl Default for PostAssembler {
    fn default() -> Self {
        Self::from_config(&SiteConfig::default())
    }
}
