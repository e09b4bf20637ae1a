//! Shared test utilities.
//!
//! Provides fixture documents shaped like real API payloads and
//! [`MemoryClient`], an in-memory [`DocumentClient`] that honours the query
//! semantics the pipeline relies on: type and UID predicates, publication
//! date orderings, `after` anchors, page size, and next-page cursors.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let client = MemoryClient::new(vec![
//!     post_document("D1", "first", "A", "2021-03-01T10:00:00+0000"),
//!     post_document("D2", "second", "B", "2021-03-02T10:00:00+0000"),
//! ]);
//! let page = client.query(&[Predicate::document_type("post")], &options).await?;
//! ```

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use crate::cms::{
    CmsError, DocumentClient, FIRST_PUBLICATION_DATE, Predicate, QueryOptions, QueryResponse,
    RawDocument, parse_timestamp,
};

// =========================================================================
// Fixture documents
// =========================================================================

/// A post document with two content sections, never edited.
pub fn post_document(id: &str, uid: &str, title: &str, published: &str) -> RawDocument {
    RawDocument {
        id: id.to_string(),
        uid: Some(uid.to_string()),
        doc_type: "post".to_string(),
        first_publication_date: Some(published.to_string()),
        last_publication_date: Some(published.to_string()),
        data: json!({
            "title": title,
            "subtitle": "Pensando em sincronização em vez de ciclos de vida",
            "author": "Joseph Oliveira",
            "banner": { "url": "https://images.prismic.io/spacetraveling/banner.png" },
            "content": [
                {
                    "heading": "Proin et varius",
                    "body": [
                        { "type": "paragraph", "text": "Lorem ipsum dolor sit amet", "spans": [] }
                    ]
                },
                {
                    "heading": "Cras laoreet",
                    "body": [
                        { "type": "paragraph", "text": "Nullam dolor sapien", "spans": [
                            { "start": 0, "end": 6, "type": "strong" }
                        ] },
                        { "type": "list-item", "text": "vulputate", "spans": [] }
                    ]
                }
            ]
        }),
    }
}

/// A post whose single section body holds exactly `words` words.
pub fn post_with_words(id: &str, uid: &str, words: usize) -> RawDocument {
    let text = vec!["palavra"; words].join(" ");
    let mut doc = post_document(id, uid, "Words", "2021-03-15T19:25:28+0000");
    doc.data["content"] = json!([
        { "heading": "Only", "body": [{ "type": "paragraph", "text": text, "spans": [] }] }
    ]);
    doc
}

/// `count` posts published on consecutive days, oldest first.
///
/// IDs are `D1..`, UIDs `post-1..`, titles `Post 1..`.
pub fn dated_posts(count: usize) -> Vec<RawDocument> {
    (1..=count)
        .map(|n| {
            post_document(
                &format!("D{n}"),
                &format!("post-{n}"),
                &format!("Post {n}"),
                &format!("2021-03-{n:02}T10:00:00+0000"),
            )
        })
        .collect()
}

/// A page response holding the given documents.
pub fn page_of(results: Vec<RawDocument>, next_page: Option<&str>) -> QueryResponse {
    QueryResponse {
        page: 1,
        results_per_page: results.len() as u32,
        total_results_size: results.len() as u32,
        total_pages: 1,
        next_page: next_page.map(|u| Url::parse(u).unwrap()),
        results,
    }
}

// =========================================================================
// In-memory document client
// =========================================================================

const DEFAULT_PAGE_SIZE: usize = 20;

/// In-memory [`DocumentClient`] over a fixed document collection.
pub struct MemoryClient {
    docs: Vec<RawDocument>,
    pages: Mutex<HashMap<String, QueryResponse>>,
    cursor_seq: AtomicUsize,
    fail_cursors: AtomicBool,
    /// Every query's options, in call order.
    pub queries: Mutex<Vec<QueryOptions>>,
    /// Every cursor fetched, in call order.
    pub fetched: Mutex<Vec<Url>>,
}

impl MemoryClient {
    pub fn new(docs: Vec<RawDocument>) -> Self {
        Self {
            docs,
            pages: Mutex::new(HashMap::new()),
            cursor_seq: AtomicUsize::new(0),
            fail_cursors: AtomicBool::new(false),
            queries: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// Serve `response` for `cursor`.
    pub fn respond_with(&self, cursor: &str, response: QueryResponse) {
        self.pages
            .lock()
            .unwrap()
            .insert(cursor.to_string(), response);
    }

    /// Make every subsequent cursor fetch fail with a 503.
    pub fn fail_cursor_fetches(&self) {
        self.fail_cursors.store(true, AtomicOrdering::SeqCst);
    }

    pub fn recorded_references(&self) -> Vec<Option<String>> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.reference.clone())
            .collect()
    }

    fn matches(doc: &RawDocument, predicate: &Predicate) -> bool {
        let Predicate::At { path, value } = predicate;
        if path == "document.type" {
            return &doc.doc_type == value;
        }
        if path == "document.id" {
            return &doc.id == value;
        }
        match path.strip_prefix("my.").and_then(|p| p.strip_suffix(".uid")) {
            Some(doc_type) => doc.doc_type == doc_type && doc.uid.as_deref() == Some(value.as_str()),
            None => false,
        }
    }

    fn sorted(&self, predicates: &[Predicate], options: &QueryOptions) -> Vec<RawDocument> {
        let mut docs: Vec<RawDocument> = self
            .docs
            .iter()
            .filter(|d| predicates.iter().all(|p| Self::matches(d, p)))
            .cloned()
            .collect();
        if let Some(ordering) = options
            .orderings
            .iter()
            .find(|o| o.field == FIRST_PUBLICATION_DATE)
        {
            docs.sort_by_key(|d| {
                d.first_publication_date
                    .as_deref()
                    .and_then(|raw| parse_timestamp(raw).ok())
            });
            if ordering.descending {
                docs.reverse();
            }
        }
        if let Some(after) = &options.after {
            if let Some(pos) = docs.iter().position(|d| &d.id == after) {
                docs.drain(..=pos);
            }
        }
        docs
    }
}

#[async_trait]
impl DocumentClient for MemoryClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse, CmsError> {
        self.queries.lock().unwrap().push(options.clone());

        let docs = self.sorted(predicates, options);
        let size = options.page_size.map_or(DEFAULT_PAGE_SIZE, |s| s as usize);
        let chunks: Vec<Vec<RawDocument>> = if docs.is_empty() {
            vec![Vec::new()]
        } else {
            docs.chunks(size).map(<[RawDocument]>::to_vec).collect()
        };
        let total_pages = chunks.len() as u32;
        let total = docs.len() as u32;
        let query_id = self.cursor_seq.fetch_add(1, AtomicOrdering::SeqCst);
        let cursor =
            |page: usize| format!("https://cms.test/api/v2/documents/search?query={query_id}&page={page}");

        let mut responses: Vec<QueryResponse> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, results)| QueryResponse {
                page: i as u32 + 1,
                results_per_page: size as u32,
                total_results_size: total,
                total_pages,
                next_page: ((i as u32 + 1) < total_pages)
                    .then(|| Url::parse(&cursor(i + 2)).unwrap()),
                results,
            })
            .collect();

        let first = responses.remove(0);
        for response in responses {
            self.respond_with(&cursor(response.page as usize), response);
        }
        Ok(first)
    }

    async fn fetch_page(&self, cursor: &Url) -> Result<QueryResponse, CmsError> {
        self.fetched.lock().unwrap().push(cursor.clone());
        if self.fail_cursors.load(AtomicOrdering::SeqCst) {
            return Err(CmsError::Status {
                url: cursor.to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.pages
            .lock()
            .unwrap()
            .get(cursor.as_str())
            .cloned()
            .ok_or_else(|| CmsError::Status {
                url: cursor.to_string(),
                status: 404,
                body: "unknown cursor".to_string(),
            })
    }
}
