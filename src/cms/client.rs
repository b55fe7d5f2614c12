use super::{
    error::CmsError,
    types::{ApiInfo, Document, QueryResponse},
};
use crate::CmsConfig;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a Prismic-style document API. Built from an explicit
/// configuration value so callers control which repository and token are
/// in play; nothing is read from the process environment.
pub struct CmsClient {
    config: CmsConfig,
    http: reqwest::Client,
    master_ref: RwLock<Option<String>>,
}

impl CmsClient {
    pub fn new(config: CmsConfig) -> Result<Self, CmsError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            config,
            http,
            master_ref: RwLock::new(None),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    /// Fetches the API descriptor. Used by startup checks to confirm the
    /// repository answers at all.
    pub async fn ping(&self) -> Result<(), CmsError> {
        self.fetch_api_info().await.map(|_| ())
    }

    /// Queries all documents of `doc_type`, optionally projected down to
    /// `fetch` fields and capped at `page_size` results per page.
    pub async fn query_type(
        &self,
        doc_type: &str,
        fetch: &[String],
        page_size: Option<usize>,
    ) -> Result<QueryResponse, CmsError> {
        let predicate = format!("at(document.type,\"{}\")", doc_type);
        self.search(&predicate, fetch, page_size).await
    }

    /// Looks up a single document by its uid. `Ok(None)` when the
    /// repository has no document with that uid.
    pub async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
    ) -> Result<Option<Document>, CmsError> {
        let predicate = format!("at(my.{}.uid,\"{}\")", doc_type, uid);
        let response = self.search(&predicate, &[], Some(1)).await?;
        Ok(response.results.into_iter().next())
    }

    /// Follows an opaque next-page cursor. The cursor is a complete URL
    /// issued by the API; no structure is assumed beyond it being
    /// fetchable and answering with the usual result envelope.
    pub async fn fetch_page(&self, cursor: &str) -> Result<QueryResponse, CmsError> {
        debug!("Fetching cursor page: {}", cursor);

        let response = self.http.get(cursor).send().await?;
        if !response.status().is_success() {
            return Err(CmsError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: cursor.to_string(),
            });
        }

        Ok(response.json().await?)
    }

    /// True when `cursor` points at the same scheme/host/port as the
    /// configured API. The load-more endpoint refuses anything else so it
    /// cannot be used as an open proxy.
    pub fn is_same_origin(&self, cursor: &str) -> bool {
        let Ok(api) = Url::parse(&self.config.api_url) else {
            return false;
        };
        let Ok(other) = Url::parse(cursor) else {
            return false;
        };

        api.scheme() == other.scheme()
            && api.host() == other.host()
            && api.port_or_known_default() == other.port_or_known_default()
    }

    async fn search(
        &self,
        predicate: &str,
        fetch: &[String],
        page_size: Option<usize>,
    ) -> Result<QueryResponse, CmsError> {
        let master_ref = self.master_ref().await?;

        let base = self.config.api_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/documents/search", base))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &master_ref);
            pairs.append_pair("q", &format!("[[{}]]", predicate));
            if !fetch.is_empty() {
                pairs.append_pair("fetch", &fetch.join(","));
            }
            if let Some(size) = page_size {
                pairs.append_pair("pageSize", &size.to_string());
            }
            if let Some(token) = &self.config.access_token {
                pairs.append_pair("access_token", token);
            }
        }

        debug!("Querying documents: {}", predicate);

        let response = self.http.get(url.clone()).send().await?;
        if !response.status().is_success() {
            // A stale ref is the usual cause of a rejected query. Drop the
            // cached one so the next attempt re-resolves it.
            *self.master_ref.write().await = None;
            return Err(CmsError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }

    async fn master_ref(&self) -> Result<String, CmsError> {
        if let Some(cached) = self.master_ref.read().await.clone() {
            return Ok(cached);
        }

        let info = self.fetch_api_info().await?;
        let master = info
            .refs
            .iter()
            .find(|r| r.is_master_ref)
            .ok_or(CmsError::MissingMasterRef)?;

        info!("Resolved master ref {}", master.ref_token);

        let mut cached = self.master_ref.write().await;
        *cached = Some(master.ref_token.clone());
        Ok(master.ref_token.clone())
    }

    async fn fetch_api_info(&self) -> Result<ApiInfo, CmsError> {
        let mut url = Url::parse(&self.config.api_url)?;
        if let Some(token) = &self.config.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }

        let response = self.http.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(CmsError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}
