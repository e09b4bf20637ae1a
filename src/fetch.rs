//! Fetch stage: pulls posts from the document API into a manifest.
//!
//! ## Stage Flow
//!
//! 1. Query the first page of the post list (newest first, list fields only)
//! 2. Follow the next-page cursors to enumerate every post UID
//! 3. For each UID: fetch the document, assemble the post page, resolve the
//!    previous/next posts
//! 4. Serialize everything the generate stage needs as `manifest.json`
//!
//! The manifest keeps only the *first* list page as the index state: that is
//! what the post list shows before any "load more". Enumeration walks a copy.
//!
//! A UID that vanishes between enumeration and lookup is skipped with a
//! warning; the remaining posts still build.

use crate::adjacent;
use crate::assemble::PostAssembler;
use crate::cms::{
    CmsError, DocumentClient, FIRST_PUBLICATION_DATE, Ordering, Predicate, QueryOptions,
    QueryResponse,
};
use crate::config::{ConfigError, SiteConfig};
use crate::pagination::{self, PaginationError, PaginationState};
use crate::preview::PreviewSession;
use crate::projection::list_fetch_fields;
use crate::types::{Adjacent, PostDetail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("document API error: {0}")]
    Cms(#[from] CmsError),
    #[error("pagination error: {0}")]
    Pagination(#[from] PaginationError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the generate stage renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub config: SiteConfig,
    /// The post list as first shown: page one and its cursor.
    pub index: PaginationState,
    pub posts: Vec<PostPage>,
    /// Whether the content came from a preview ref.
    pub preview: bool,
}

/// One post page with its navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPage {
    pub detail: PostDetail,
    pub adjacent: Adjacent,
}

/// Result of a fetch run.
#[derive(Debug)]
pub struct FetchResult {
    pub manifest: Manifest,
    /// UIDs enumerated from the list but missing on lookup.
    pub skipped: Vec<String>,
}

/// Location of the manifest inside the temp directory.
pub fn manifest_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join("manifest.json")
}

/// Query the first page of the post list, newest first.
pub async fn query_first_page<C>(
    client: &C,
    config: &SiteConfig,
    session: &PreviewSession,
) -> Result<QueryResponse, CmsError>
where
    C: DocumentClient + ?Sized,
{
    let doc_type = &config.cms.document_type;
    let options = QueryOptions {
        page_size: Some(config.cms.page_size),
        reference: session.reference().map(str::to_string),
        after: None,
        orderings: vec![Ordering::desc(FIRST_PUBLICATION_DATE)],
        fetch: list_fetch_fields(doc_type),
    };
    client
        .query(&[Predicate::document_type(doc_type)], &options)
        .await
}

/// Run the fetch stage and build the manifest.
pub async fn fetch<C>(
    client: &C,
    config: &SiteConfig,
    session: &PreviewSession,
) -> Result<FetchResult, FetchError>
where
    C: DocumentClient + ?Sized,
{
    let doc_type = config.cms.document_type.as_str();
    let reference = session.reference();
    info!(doc_type, preview = session.is_active(), "fetching post list");

    let index = PaginationState::first_page(query_first_page(client, config, session).await?)?;
    let all = pagination::collect_all(client, index.clone()).await?;
    info!(count = all.posts().len(), "enumerated posts");

    let assembler = PostAssembler::from_config(config);
    let mut posts = Vec::with_capacity(all.posts().len());
    let mut skipped = Vec::new();
    let mut seen = HashSet::new();

    for post in all.posts() {
        if !seen.insert(post.uid.as_str()) {
            debug!(uid = %post.uid, "post listed twice, page already built");
            continue;
        }
        let doc = match client.get_by_uid(doc_type, &post.uid, reference).await {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => {
                warn!(uid = %post.uid, "post disappeared during fetch, skipping");
                skipped.push(post.uid.clone());
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let detail = assembler.assemble(&doc)?;
        let adjacent = adjacent::resolve(client, doc_type, &doc.id, reference).await?;
        debug!(uid = %detail.uid, blocks = detail.blocks.len(), "assembled post");
        posts.push(PostPage { detail, adjacent });
    }

    Ok(FetchResult {
        manifest: Manifest {
            config: config.clone(),
            index,
            posts,
            preview: session.is_active(),
        },
        skipped,
    })
}

pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<Manifest, FetchError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load the next list page into the manifest at `path`.
///
/// The manifest file is rewritten only when the page loaded; on any error it
/// is left as it was.
pub async fn load_more<C>(client: &C, path: &Path) -> Result<Manifest, FetchError>
where
    C: DocumentClient + ?Sized,
{
    let mut manifest = read_manifest(path)?;
    let before = manifest.index.posts().len();
    manifest.index = pagination::load_next_page(client, &manifest.index).await?;
    info!(
        loaded = manifest.index.posts().len() - before,
        has_more = manifest.index.has_more(),
        "loaded next page"
    );
    write_manifest(&manifest, path)?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::RawDocument;
    use crate::test_helpers::*;
    use async_trait::async_trait;
    use url::Url;

    fn config(page_size: u32) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.cms.page_size = page_size;
        config
    }

    #[tokio::test]
    async fn manifest_index_holds_first_page_newest_first() {
        let client = MemoryClient::new(dated_posts(5));
        let result = fetch(&client, &config(2), &PreviewSession::published())
            .await
            .unwrap();

        let uids: Vec<&str> = result
            .manifest
            .index
            .posts()
            .iter()
            .map(|p| p.uid.as_str())
            .collect();
        assert_eq!(uids, vec!["post-5", "post-4"]);
        assert!(result.manifest.index.has_more());
        assert!(!result.manifest.preview);
    }

    #[tokio::test]
    async fn every_post_gets_a_page() {
        let client = MemoryClient::new(dated_posts(5));
        let result = fetch(&client, &config(2), &PreviewSession::published())
            .await
            .unwrap();
        assert_eq!(result.manifest.posts.len(), 5);
        assert!(result.skipped.is_empty());
    }

    #[tokio::test]
    async fn pages_carry_adjacency() {
        let client = MemoryClient::new(dated_posts(3));
        let result = fetch(&client, &config(2), &PreviewSession::published())
            .await
            .unwrap();
        let middle = result
            .manifest
            .posts
            .iter()
            .find(|p| p.detail.uid == "post-2")
            .unwrap();
        assert_eq!(middle.adjacent.prev.as_ref().unwrap().uid, "post-1");
        assert_eq!(middle.adjacent.next.as_ref().unwrap().uid, "post-3");
    }

    #[tokio::test]
    async fn list_query_uses_configured_page_size_and_fields() {
        let client = MemoryClient::new(dated_posts(1));
        fetch(&client, &config(7), &PreviewSession::published())
            .await
            .unwrap();
        let queries = client.queries.lock().unwrap();
        let list = &queries[0];
        assert_eq!(list.page_size, Some(7));
        assert_eq!(list.fetch, vec!["post.title", "post.subtitle", "post.author"]);
        assert_eq!(list.orderings, vec![Ordering::desc(FIRST_PUBLICATION_DATE)]);
    }

    #[tokio::test]
    async fn preview_ref_reaches_every_query() {
        let client = MemoryClient::new(dated_posts(3));
        let session = PreviewSession::new(Some("draft-ref".into()));
        let result = fetch(&client, &config(2), &session).await.unwrap();

        assert!(result.manifest.preview);
        let refs = client.recorded_references();
        assert!(!refs.is_empty());
        assert!(refs.iter().all(|r| r.as_deref() == Some("draft-ref")));
    }

    #[tokio::test]
    async fn empty_collection_builds_empty_manifest() {
        let client = MemoryClient::new(vec![]);
        let result = fetch(&client, &config(2), &PreviewSession::published())
            .await
            .unwrap();
        assert!(result.manifest.index.posts().is_empty());
        assert!(!result.manifest.index.has_more());
        assert!(result.manifest.posts.is_empty());
    }

    /// Lists every document but cannot find `missing` by UID.
    struct Vanishing {
        inner: MemoryClient,
        missing: &'static str,
    }

    #[async_trait]
    impl DocumentClient for Vanishing {
        async fn query(
            &self,
            predicates: &[Predicate],
            options: &QueryOptions,
        ) -> Result<QueryResponse, CmsError> {
            let looks_up_missing = predicates.iter().any(|p| {
                let Predicate::At { path, value } = p;
                path.ends_with(".uid") && value == self.missing
            });
            if looks_up_missing {
                return Ok(page_of(Vec::<RawDocument>::new(), None));
            }
            self.inner.query(predicates, options).await
        }

        async fn fetch_page(&self, cursor: &Url) -> Result<QueryResponse, CmsError> {
            self.inner.fetch_page(cursor).await
        }
    }

    #[tokio::test]
    async fn missing_post_is_skipped() {
        let client = Vanishing {
            inner: MemoryClient::new(dated_posts(3)),
            missing: "post-2",
        };
        let result = fetch(&client, &config(2), &PreviewSession::published())
            .await
            .unwrap();
        assert_eq!(result.skipped, vec!["post-2".to_string()]);
        assert_eq!(result.manifest.posts.len(), 2);
    }

    /// Serves every document again as the second page.
    struct Overlapping {
        inner: MemoryClient,
        docs: Vec<RawDocument>,
    }

    #[async_trait]
    impl DocumentClient for Overlapping {
        async fn query(
            &self,
            predicates: &[Predicate],
            options: &QueryOptions,
        ) -> Result<QueryResponse, CmsError> {
            self.inner.query(predicates, options).await
        }

        async fn fetch_page(&self, _cursor: &Url) -> Result<QueryResponse, CmsError> {
            Ok(page_of(self.docs.clone(), None))
        }
    }

    #[tokio::test]
    async fn overlapping_pages_build_each_post_once() {
        let client = Overlapping {
            inner: MemoryClient::new(dated_posts(3)),
            docs: dated_posts(3),
        };
        let result = fetch(&client, &config(2), &PreviewSession::published())
            .await
            .unwrap();

        let mut uids: Vec<&str> = result
            .manifest
            .posts
            .iter()
            .map(|p| p.detail.uid.as_str())
            .collect();
        uids.sort();
        assert_eq!(uids, vec!["post-1", "post-2", "post-3"]);

        let queries = client.inner.queries.lock().unwrap();
        let lookups = queries
            .iter()
            .filter(|q| q.page_size == Some(1) && q.after.is_none())
            .count();
        let neighbours = queries.iter().filter(|q| q.after.is_some()).count();
        assert_eq!(lookups, 3);
        assert_eq!(neighbours, 6);
    }

    #[tokio::test]
    async fn malformed_post_fails_the_stage() {
        let mut docs = dated_posts(2);
        docs[0].first_publication_date = Some("yesterday".into());
        let client = MemoryClient::new(docs);
        let err = fetch(&client, &config(2), &PreviewSession::published())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Cms(CmsError::MalformedDocument { .. })));
    }

    #[tokio::test]
    async fn manifest_roundtrips_through_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let client = MemoryClient::new(dated_posts(2));
        let result = fetch(&client, &config(2), &PreviewSession::published())
            .await
            .unwrap();
        let path = manifest_path(&tmp.path().join("temp"));

        write_manifest(&result.manifest, &path).unwrap();
        let back = read_manifest(&path).unwrap();

        assert_eq!(back.index, result.manifest.index);
        assert_eq!(back.posts.len(), 2);
        assert_eq!(back.posts[0].detail, result.manifest.posts[0].detail);
    }

    #[tokio::test]
    async fn load_more_appends_and_rewrites_manifest() {
        let tmp = tempfile::TempDir::new().unwrap();
        let client = MemoryClient::new(dated_posts(5));
        let result = fetch(&client, &config(2), &PreviewSession::published())
            .await
            .unwrap();
        let path = manifest_path(tmp.path());
        write_manifest(&result.manifest, &path).unwrap();

        let updated = load_more(&client, &path).await.unwrap();

        assert_eq!(updated.index.posts().len(), 4);
        assert_eq!(read_manifest(&path).unwrap().index, updated.index);
    }

    #[tokio::test]
    async fn failed_load_more_leaves_manifest_untouched() {
        let tmp = tempfile::TempDir::new().unwrap();
        let client = MemoryClient::new(dated_posts(5));
        let result = fetch(&client, &config(2), &PreviewSession::published())
            .await
            .unwrap();
        let path = manifest_path(tmp.path());
        write_manifest(&result.manifest, &path).unwrap();
        let before = fs::read_to_string(&path).unwrap();
        client.fail_cursor_fetches();

        let err = load_more(&client, &path).await.unwrap_err();

        assert!(matches!(err, FetchError::Pagination(PaginationError::Cms(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn load_more_on_last_page_is_exhausted() {
        let tmp = tempfile::TempDir::new().unwrap();
        let client = MemoryClient::new(dated_posts(2));
        let result = fetch(&client, &config(2), &PreviewSession::published())
            .await
            .unwrap();
        let path = manifest_path(tmp.path());
        write_manifest(&result.manifest, &path).unwrap();

        let err = load_more(&client, &path).await.unwrap_err();
        assert!(matches!(err, FetchError::Pagination(PaginationError::Exhausted)));
    }
}
