//! Content source adapter
//!
//! [`ContentSource`] is the seam between page generation and the headless
//! CMS. [`PrismicClient`] talks to a Prismic repository over HTTP; tests plug
//! in in-memory sources.

mod document;
mod error;
mod prismic;
mod query;

pub use document::{
    parse_timestamp, ApiInfo, ApiRef, Banner, BlockKind, ContentSection, Embed, PostFields,
    RawDocument, RichField, RichText, RichTextBlock, SearchResponse, Span, SpanData, SpanKind,
};
pub use error::CmsError;
pub use prismic::PrismicClient;
pub use query::{Predicate, Query};

use async_trait::async_trait;

/// A remote repository of documents
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a search and return its first page
    async fn query(&self, query: &Query) -> Result<SearchResponse, CmsError>;

    /// Fetch the page a `next_page` cursor points at
    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, CmsError>;

    /// Look up a single document by custom type and uid
    async fn get_by_uid(&self, doc_type: &str, uid: &str)
        -> Result<Option<RawDocument>, CmsError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory content sources shared by the test modules

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) use super::document::tests::SEARCH_FIXTURE;

    /// Serves canned pages keyed by cursor; the first query returns `first`
    #[derive(Default)]
    pub(crate) struct MemorySource {
        pub first: Option<SearchResponse>,
        pub pages: HashMap<String, SearchResponse>,
        pub documents: HashMap<String, RawDocument>,
        pub failing_cursors: Mutex<Vec<String>>,
        pub queries: Mutex<Vec<Query>>,
        pub page_fetches: AtomicUsize,
    }

    impl MemorySource {
        pub(crate) fn fetch_count(&self) -> usize {
            self.page_fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentSource for MemorySource {
        async fn query(&self, query: &Query) -> Result<SearchResponse, CmsError> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(self.first.clone().unwrap_or_else(SearchResponse::empty))
        }

        async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, CmsError> {
            self.page_fetches.fetch_add(1, Ordering::SeqCst);
            let mut failing = self.failing_cursors.lock().unwrap();
            if let Some(pos) = failing.iter().position(|c| c == cursor) {
                failing.remove(pos);
                return Err(CmsError::Status {
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    url: cursor.to_string(),
                });
            }
            self.pages
                .get(cursor)
                .cloned()
                .ok_or_else(|| CmsError::InvalidCursor(cursor.to_string()))
        }

        async fn get_by_uid(
            &self,
            _doc_type: &str,
            uid: &str,
        ) -> Result<Option<RawDocument>, CmsError> {
            Ok(self.documents.get(uid).cloned())
        }
    }

    /// A minimal post with key-text fields
    pub(crate) fn post(uid: &str) -> RawDocument {
        RawDocument::from_json(&format!(
            r#"{{
                "uid": "{uid}",
                "type": "posts",
                "first_publication_date": "2021-03-15T00:00:00Z",
                "data": {{ "title": "Post {uid}", "subtitle": "About {uid}", "author": "Ana" }}
            }}"#
        ))
        .unwrap()
    }

    /// A page of `count` posts named `{prefix}-{i}`
    pub(crate) fn page(prefix: &str, count: usize, next_page: Option<&str>) -> SearchResponse {
        SearchResponse {
            page: 1,
            results_per_page: count as u32,
            total_results_size: count as u32,
            total_pages: 1,
            next_page: next_page.map(str::to_string),
            prev_page: None,
            results: (0..count).map(|i| post(&format!("{}-{}", prefix, i))).collect(),
        }
    }
}
