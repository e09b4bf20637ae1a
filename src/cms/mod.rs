//! Document API adapter.
//!
//! Everything the rest of the crate knows about the headless CMS goes
//! through [`DocumentClient`]: a predicate query returning one page of raw
//! documents plus a cursor for the next page, a direct fetch of such a
//! cursor, and a lookup by UID. [`ApiClient`] implements it over HTTP;
//! tests drive the pipeline with an in-memory implementation.
//!
//! Field-level projection of documents is not the adapter's job; see
//! [`crate::projection`].

mod api;
mod document;

pub use api::ApiClient;
pub use document::{ApiInfo, ApiRef, QueryResponse, RawDocument, parse_timestamp};

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Publication date path used for chronological orderings.
pub const FIRST_PUBLICATION_DATE: &str = "document.first_publication_date";

#[derive(Error, Debug)]
pub enum CmsError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} responded with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("endpoint cannot be used as a base URL: {0}")]
    NotABase(String),
    #[error("API at {0} advertises no master ref")]
    NoMasterRef(String),
    #[error("no {doc_type} document with uid '{uid}'")]
    NotFound { doc_type: String, uid: String },
    #[error("document {id} is malformed: {reason}")]
    MalformedDocument { id: String, reason: String },
}

impl CmsError {
    pub fn malformed(id: &str, reason: impl Into<String>) -> Self {
        CmsError::MalformedDocument {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CmsError::NotFound { .. })
    }
}

/// A query predicate, rendered in the API's `[at(path, "value")]` syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Exact match of a document path (`document.type`, `my.post.uid`, ...).
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Documents of the given custom type.
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    /// The document of `doc_type` whose UID is `uid`.
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{doc_type}.uid"), uid)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => {
                write!(f, "[at({path}, \"{}\")]", value.replace('"', "\\\""))
            }
        }
    }
}

/// Render predicates as the value of the `q` query parameter.
pub fn predicates_param(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(|p| p.to_string()).collect();
    format!("[{inner}]")
}

/// A sort key of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }
}

/// Render orderings as the value of the `orderings` query parameter.
pub fn orderings_param(orderings: &[Ordering]) -> String {
    let keys: Vec<String> = orderings
        .iter()
        .map(|o| {
            if o.descending {
                format!("{} desc", o.field)
            } else {
                o.field.clone()
            }
        })
        .collect();
    format!("[{}]", keys.join(","))
}

/// Pagination and selection options of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: Option<u32>,
    /// Content ref (preview token). `None` selects the master ref.
    pub reference: Option<String>,
    /// Only return documents after this document ID in the query's ordering.
    pub after: Option<String>,
    pub orderings: Vec<Ordering>,
    /// Restrict `data` to these `type.field` paths.
    pub fetch: Vec<String>,
}

/// A paginated document-query API.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Run a predicate query and return the first page of results.
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse, CmsError>;

    /// Fetch a page by the cursor URL returned in a previous response.
    async fn fetch_page(&self, cursor: &Url) -> Result<QueryResponse, CmsError>;

    /// Look up a single document by its UID.
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<RawDocument, CmsError> {
        let options = QueryOptions {
            page_size: Some(1),
            reference: reference.map(str::to_string),
            ..QueryOptions::default()
        };
        let response = self
            .query(&[Predicate::uid(doc_type, uid)], &options)
            .await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }
}
