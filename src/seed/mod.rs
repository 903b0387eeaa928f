//! Startup seeding
//!
//! Runs once before the server accepts requests. An empty store is filled
//! from the remote catalog, following `next` links page by page; any
//! failure along the way discards what was fetched and the built-in
//! fallback records are inserted instead.

mod client;
mod fallback;
mod remote;

pub use client::{DEFAULT_CATALOG_URL, DEFAULT_TIMEOUT_SECS, SwapiClient, SwapiConfig, default_user_agent};
pub use fallback::fallback_starships;
pub use remote::{CatalogRoot, FetchError, PageSource, RawStarship, StarshipPage};

use crate::core::{Starship, StoreError};
use crate::storage::RecordStore;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store already held records; nothing was written.
    AlreadySeeded { existing: usize },
    Remote { inserted: usize },
    Fallback { inserted: usize },
}

impl SeedOutcome {
    pub fn source(&self) -> &'static str {
        match self {
            Self::AlreadySeeded { .. } => "existing",
            Self::Remote { .. } => "remote",
            Self::Fallback { .. } => "fallback",
        }
    }
}

/// Seeding failures that must stop startup.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("could not inspect the store before seeding: {0}")]
    Store(#[source] StoreError),

    #[error("fallback seed could not be committed: {0}")]
    FallbackFailed(#[source] StoreError),
}

pub struct SeedLoader {
    store: Arc<dyn RecordStore>,
    source: Option<Arc<dyn PageSource>>,
}

impl SeedLoader {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            source: None,
        }
    }

    /// Seeds from `source` first; without one the loader goes straight to
    /// the fallback records.
    pub fn with_remote(mut self, source: Arc<dyn PageSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub async fn run(&self, cancel: &CancellationToken) -> Result<SeedOutcome, SeedError> {
        let existing = self.store.count().await.map_err(SeedError::Store)?;
        if existing > 0 {
            debug!(existing, "store already populated, skipping seed");
            return Ok(SeedOutcome::AlreadySeeded { existing });
        }

        if let Some(source) = &self.source {
            match fetch_all(source.as_ref(), cancel).await {
                Ok(records) if !records.is_empty() => match self.store.insert_many(records).await {
                    Ok(saved) => {
                        info!(count = saved.len(), source = "remote", "seeded starship inventory");
                        return Ok(SeedOutcome::Remote {
                            inserted: saved.len(),
                        });
                    }
                    Err(err) => {
                        warn!(error = %err, "could not commit remote starships, using fallback");
                    }
                },
                Ok(_) => {
                    info!("remote catalog returned no starships, using fallback");
                }
                Err(err) => {
                    warn!(error = %err, "remote starship fetch failed, using fallback");
                }
            }
        }

        let saved = self
            .store
            .insert_many(fallback_starships())
            .await
            .map_err(SeedError::FallbackFailed)?;
        info!(count = saved.len(), source = "fallback", "seeded starship inventory");
        Ok(SeedOutcome::Fallback {
            inserted: saved.len(),
        })
    }
}

/// Follows `next` links until the last page, accumulating normalized records.
///
/// Cancellation is checked once before every page request.
pub async fn fetch_all(
    source: &dyn PageSource,
    cancel: &CancellationToken,
) -> Result<Vec<Starship>, FetchError> {
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    let mut next = Some(source.first_page_url().await?);
    let mut visited = HashSet::new();
    let mut records = Vec::new();

    while let Some(url) = next {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        if !visited.insert(url.clone()) {
            return Err(FetchError::MalformedPayload(format!(
                "pagination revisits {url}"
            )));
        }

        let page = source.fetch_page(&url).await?;
        debug!(url = %url, results = page.results.len(), "fetched starship page");
        records.extend(page.results.into_iter().map(RawStarship::normalize));
        next = page.next.filter(|n| !n.is_empty());
    }

    Ok(records)
}
