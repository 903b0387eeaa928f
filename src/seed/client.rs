//! HTTP client for the public starship catalog

use super::remote::{CatalogRoot, FetchError, PageSource, StarshipPage};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CATALOG_URL: &str = "https://swapi.dev/api/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the catalog client
#[derive(Debug, Clone)]
pub struct SwapiConfig {
    /// Catalog root listing the resource URLs (e.g. "https://swapi.dev/api/")
    pub catalog_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Identifying client header the catalog's usage policy asks for
    pub user_agent: String,
}

impl Default for SwapiConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
        }
    }
}

pub fn default_user_agent() -> String {
    format!(
        "{}/{} (starship inventory seeder)",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

pub struct SwapiClient {
    client: Client,
    config: SwapiConfig,
}

impl SwapiClient {
    pub fn new(config: SwapiConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!(url, "fetching catalog resource");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnsupportedResponse {
                url: url.to_string(),
                reason: format!("HTTP status {status}"),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !content_type.contains("json") {
            return Err(FetchError::UnsupportedResponse {
                url: url.to_string(),
                reason: format!("content type '{content_type}'"),
            });
        }

        let body = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&body)
            .map_err(|e| FetchError::MalformedPayload(format!("{url}: {e}")))
    }
}

#[async_trait]
impl PageSource for SwapiClient {
    async fn first_page_url(&self) -> Result<String, FetchError> {
        let root: CatalogRoot = self.get_json(&self.config.catalog_url).await?;
        root.starships.filter(|u| !u.is_empty()).ok_or_else(|| {
            FetchError::MalformedPayload("catalog does not list a starships resource".to_string())
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<StarshipPage, FetchError> {
        self.get_json(url).await
    }
}

fn map_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else if err.is_decode() {
        FetchError::MalformedPayload(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}
