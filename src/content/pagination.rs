//! "Load more" pagination over a post listing
//!
//! [`PaginationState`] is the session-scoped list of loaded summaries plus the
//! cursor of the next page. [`Paginator`] owns one state and serializes loads:
//! while a fetch is outstanding, further calls return
//! [`LoadOutcome::InFlight`] without touching the network.

use serde::Serialize;
use tokio::sync::Mutex;

use super::summary::{to_post_summary, PostSummary};
use crate::cms::{CmsError, ContentSource, SearchResponse};
use crate::helpers::DateStyle;

/// Loaded posts in fetch order and the cursor of the next page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    posts: Vec<PostSummary>,
    next_cursor: Option<String>,
    /// Listing pages loaded so far
    pages: usize,
}

impl PaginationState {
    /// A state holding one loaded page
    pub fn new(posts: Vec<PostSummary>, next_cursor: Option<String>) -> Self {
        Self {
            posts,
            next_cursor,
            pages: 1,
        }
    }

    /// Build the initial state from a first page of results
    pub fn from_response(response: &SearchResponse, dates: &DateStyle) -> Self {
        Self::new(
            response
                .results
                .iter()
                .map(|doc| to_post_summary(doc, dates))
                .collect(),
            response.next_page.clone(),
        )
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Whether a "load more" action can fetch anything
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    fn append_page(&mut self, page: Vec<PostSummary>, next_cursor: Option<String>) {
        self.posts.extend(page);
        self.next_cursor = next_cursor;
        self.pages += 1;
    }
}

/// Result of a [`Paginator::load_next_page`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and this many posts were appended
    Appended(usize),
    /// There is no next page
    Exhausted,
    /// Another load is still running; nothing was fetched
    InFlight,
}

/// Single-flight owner of a [`PaginationState`]
#[derive(Debug, Default)]
pub struct Paginator {
    state: Mutex<PaginationState>,
}

impl Paginator {
    pub fn new(state: PaginationState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Fetch the next page and append all of its posts
    ///
    /// On error the state is left as it was, so the same call can be retried.
    pub async fn load_next_page(
        &self,
        source: &dyn ContentSource,
        dates: &DateStyle,
    ) -> Result<LoadOutcome, CmsError> {
        let Ok(mut state) = self.state.try_lock() else {
            tracing::debug!("Next page already loading");
            return Ok(LoadOutcome::InFlight);
        };

        let Some(cursor) = state.next_cursor.clone() else {
            return Ok(LoadOutcome::Exhausted);
        };

        let response = source.fetch_page(&cursor).await?;
        let page: Vec<PostSummary> = response
            .results
            .iter()
            .map(|doc| to_post_summary(doc, dates))
            .collect();
        let appended = page.len();

        state.append_page(page, response.next_page);
        tracing::debug!(
            "Appended {} posts ({} loaded, more: {})",
            appended,
            state.len(),
            state.has_more()
        );

        Ok(LoadOutcome::Appended(appended))
    }

    /// Load pages until the cursor runs out
    pub async fn load_all(
        &self,
        source: &dyn ContentSource,
        dates: &DateStyle,
    ) -> Result<usize, CmsError> {
        let mut pages = 0;
        while let LoadOutcome::Appended(_) = self.load_next_page(source, dates).await? {
            pages += 1;
        }
        Ok(pages)
    }

    /// A copy of the current state
    pub async fn snapshot(&self) -> PaginationState {
        self.state.lock().await.clone()
    }

    pub fn into_state(self) -> PaginationState {
        self.state.into_inner()
    }
}
