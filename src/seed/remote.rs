//! Wire types for the remote starship catalog and the page-source seam.

use crate::core::{Starship, is_web_url};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Why a remote fetch was abandoned. Always recovered by the seed loader.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("unsupported response from {url}: {reason}")]
    UnsupportedResponse { url: String, reason: String },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// A paginated source of raw starship records.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// URL of the first page, as advertised by the remote catalog.
    async fn first_page_url(&self) -> Result<String, FetchError>;

    async fn fetch_page(&self, url: &str) -> Result<StarshipPage, FetchError>;
}

/// Top-level catalog document listing the resource roots.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRoot {
    pub starships: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StarshipPage {
    #[serde(default)]
    pub results: Vec<RawStarship>,
    #[serde(default)]
    pub next: Option<String>,
}

/// A starship as the remote catalog sends it.
///
/// Every field is optional; text fields that are absent, null, or not
/// textual decode as `None` and are normalized to empty strings later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawStarship {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub starship_class: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub crew: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub passengers: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
}

impl RawStarship {
    pub fn normalize(self) -> Starship {
        Starship {
            id: 0,
            name: self.name.unwrap_or_default(),
            model: self.model.unwrap_or_default(),
            manufacturer: self.manufacturer.unwrap_or_default(),
            starship_class: self.starship_class.unwrap_or_default(),
            crew: self.crew.unwrap_or_default(),
            passengers: self.passengers.unwrap_or_default(),
            source_url: self.url.filter(|u| is_web_url(u)),
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
