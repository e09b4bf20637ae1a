//! Post list pagination ("load more").
//!
//! The API pages query results and hands back the URL of the following
//! page with each response. [`PaginationState`] holds the posts loaded so
//! far plus that cursor; [`load_next_page`] fetches the cursor and returns a
//! new state with the page appended. States are values: the input state is
//! never modified, so a failed load leaves the caller holding the last good
//! state.
//!
//! Pages are appended as delivered. If the upstream ever returns
//! overlapping pages the resulting list holds duplicates; nothing here
//! tries to remove them.

use crate::cms::{CmsError, DocumentClient, QueryResponse};
use crate::projection::project_post;
use crate::types::Post;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum PaginationError {
    #[error("no further pages to load")]
    Exhausted,
    #[error(transparent)]
    Cms(#[from] CmsError),
}

/// Posts loaded so far and the cursor of the next page.
///
/// `next_cursor` is `None` iff there are no further pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginationState {
    posts: Vec<Post>,
    next_cursor: Option<Url>,
}

impl PaginationState {
    pub fn new(posts: Vec<Post>, next_cursor: Option<Url>) -> Self {
        Self { posts, next_cursor }
    }

    /// Build the initial state from the response of the list query.
    pub fn first_page(response: QueryResponse) -> Result<Self, CmsError> {
        let posts = project_page(&response)?;
        Ok(Self::new(posts, response.next_page))
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn next_cursor(&self) -> Option<&Url> {
        self.next_cursor.as_ref()
    }

    /// Whether the "load more" action should be offered.
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    fn appended(&self, page: Vec<Post>, next_cursor: Option<Url>) -> Self {
        let mut posts = Vec::with_capacity(self.posts.len() + page.len());
        posts.extend_from_slice(&self.posts);
        posts.extend(page);
        Self { posts, next_cursor }
    }
}

fn project_page(response: &QueryResponse) -> Result<Vec<Post>, CmsError> {
    response.results.iter().map(project_post).collect()
}

/// Fetch the page behind `state`'s cursor and return the extended state.
///
/// Issues exactly one request. Fails with [`PaginationError::Exhausted`],
/// without touching the network, when the state has no cursor.
pub async fn load_next_page<C>(
    client: &C,
    state: &PaginationState,
) -> Result<PaginationState, PaginationError>
where
    C: DocumentClient + ?Sized,
{
    let cursor = state.next_cursor().ok_or(PaginationError::Exhausted)?;
    debug!(%cursor, loaded = state.posts.len(), "loading next page");
    let response = client.fetch_page(cursor).await?;
    let page = project_page(&response)?;
    Ok(state.appended(page, response.next_page))
}

/// Follow cursors until the last page and return the complete state.
pub async fn collect_all<C>(
    client: &C,
    state: PaginationState,
) -> Result<PaginationState, PaginationError>
where
    C: DocumentClient + ?Sized,
{
    let mut state = state;
    while state.has_more() {
        state = load_next_page(client, &state).await?;
    }
    Ok(state)
}
