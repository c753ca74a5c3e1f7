//! Prismic REST API client

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use super::{ApiInfo, CmsError, ContentSource, Predicate, Query, RawDocument, SearchResponse};
use crate::config::CmsConfig;

/// Client for a single Prismic repository
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    /// Build a client from the `cms` section of the site config
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let endpoint = Url::parse(config.endpoint.trim_end_matches('/'))
            .map_err(|e| CmsError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;
        if endpoint.host_str().is_none() {
            return Err(CmsError::InvalidEndpoint(config.endpoint.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            master_ref: OnceCell::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Cursors must point at this repository's scheme, host and port
    fn cursor_url(&self, cursor: &str) -> Result<Url, CmsError> {
        let url = Url::parse(cursor).map_err(|_| CmsError::InvalidCursor(cursor.to_string()))?;
        if url.scheme() != self.endpoint.scheme()
            || url.host_str() != self.endpoint.host_str()
            || url.port_or_known_default() != self.endpoint.port_or_known_default()
        {
            return Err(CmsError::InvalidCursor(cursor.to_string()));
        }
        Ok(url)
    }

    fn search_url(&self) -> Result<Url, CmsError> {
        let url = format!("{}/documents/search", self.endpoint.as_str().trim_end_matches('/'));
        Url::parse(&url).map_err(|e| CmsError::InvalidEndpoint(format!("{}: {}", url, e)))
    }

    fn with_token(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(key, _)| key == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        url
    }

    /// Resolve the master ref once per client
    async fn master_ref(&self) -> Result<&str, CmsError> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let info: ApiInfo = self
                    .get_json(self.with_token(self.endpoint.clone()), "API metadata")
                    .await?;
                let reference = info.master_ref().ok_or(CmsError::NoMasterRef)?;
                debug!("Resolved master ref {}", reference);
                Ok::<_, CmsError>(reference.to_string())
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        context: &'static str,
    ) -> Result<T, CmsError> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                status,
                url: redact_token(&url),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CmsError::decode(context, e))
    }

    async fn search(&self, query: &Query) -> Result<SearchResponse, CmsError> {
        let master_ref = self.master_ref().await?;
        let mut url = self.search_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", master_ref);
            for (key, value) in query.params() {
                pairs.append_pair(key, &value);
            }
        }
        let response = self.get_json(self.with_token(url), "search response").await?;
        Ok(without_token(response))
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    #[instrument(skip(self, query), fields(q = %query.q(), page_size = query.page_size))]
    async fn query(&self, query: &Query) -> Result<SearchResponse, CmsError> {
        let response = self.search(query).await?;
        debug!(
            "Fetched {} of {} documents",
            response.results.len(),
            response.total_results_size
        );
        Ok(response)
    }

    #[instrument(skip(self))]
    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, CmsError> {
        let url = self.cursor_url(cursor)?;
        let response = self.get_json(self.with_token(url), "search response").await?;
        Ok(without_token(response))
    }

    #[instrument(skip(self))]
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
    ) -> Result<Option<RawDocument>, CmsError> {
        let query = Query::new(Predicate::uid(doc_type, uid)).page_size(1);
        let response = self.search(&query).await?;
        Ok(response.results.into_iter().next())
    }
}

/// Drop the access token Prismic echoes into page cursors
///
/// Cursors end up in logs and listing state; the token is added back when a
/// cursor is fetched.
fn without_token(mut response: SearchResponse) -> SearchResponse {
    let strip = |cursor: String| match Url::parse(&cursor) {
        Ok(url) => redact_token(&url),
        Err(_) => cursor,
    };
    response.next_page = response.next_page.map(strip);
    response.prev_page = response.prev_page.map(strip);
    response
}

/// Strip the access token from a URL before it lands in logs or errors
fn redact_token(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    redacted.set_query(None);
    if !pairs.is_empty() {
        redacted.query_pairs_mut().extend_pairs(pairs);
    }
    redacted.to_string()
}
