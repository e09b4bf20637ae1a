//! Wire types of the document API.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use url::Url;

use super::CmsError;

/// A document exactly as the API returns it.
///
/// Timestamps stay the raw upstream strings so they can be compared
/// verbatim; `data` is left untyped and projected by [`crate::projection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RawDocument {
    pub fn published_at(&self) -> Result<Option<DateTime<FixedOffset>>, CmsError> {
        self.timestamp(self.first_publication_date.as_deref())
    }

    pub fn last_edited_at(&self) -> Result<Option<DateTime<FixedOffset>>, CmsError> {
        self.timestamp(self.last_publication_date.as_deref())
    }

    fn timestamp(&self, raw: Option<&str>) -> Result<Option<DateTime<FixedOffset>>, CmsError> {
        raw.map(|value| {
            parse_timestamp(value).map_err(|e| {
                CmsError::malformed(&self.id, format!("bad timestamp '{value}': {e}"))
            })
        })
        .transpose()
    }
}

/// Parse an API timestamp.
///
/// The API writes offsets without a colon (`2021-03-25T19:25:28+0000`);
/// RFC 3339 is accepted as well.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z").or_else(|_| DateTime::parse_from_rfc3339(raw))
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    /// Cursor of the following page; `None` on the last page.
    #[serde(default)]
    pub next_page: Option<Url>,
    #[serde(default)]
    pub results: Vec<RawDocument>,
}

fn first_page() -> u32 {
    1
}

/// Root endpoint payload: the content refs the API can serve.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

impl ApiInfo {
    pub fn master_ref(&self) -> Option<&ApiRef> {
        self.refs.iter().find(|r| r.is_master_ref)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}
