use super::engine::RecordStore;
use super::persistence::{SnapshotManager, ensure_writable_dir};
use super::table::{VersionedRow, VersionedTable};
use crate::core::{Result, Starship, StarshipId, StoreError};
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// The production record store.
///
/// The table lives in memory behind a single lock. When a snapshot file is
/// configured, each write is staged on a copy, persisted, and only then made
/// visible, so a failed write never leaves half-applied state behind.
pub struct StarshipStore {
    table: RwLock<VersionedTable>,
    persistence: Option<SnapshotManager>,
}

impl Default for StarshipStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl StarshipStore {
    /// Non-persistent store, used for `:memory:` and tests
    pub fn in_memory() -> Self {
        Self {
            table: RwLock::new(VersionedTable::new()),
            persistence: None,
        }
    }

    /// Opens (or creates) a store backed by a snapshot file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        ensure_writable_dir(dir)?;

        let persistence = SnapshotManager::new(path);
        let table = match persistence.load()? {
            Some(table) => {
                info!(path = %path.display(), rows = table.len(), "recovered starship store");
                table
            }
            None => {
                info!(path = %path.display(), "starting empty starship store");
                VersionedTable::new()
            }
        };

        Ok(Self {
            table: RwLock::new(table),
            persistence: Some(persistence),
        })
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    /// Runs `op` against a staged copy, persists it on the blocking pool, then
    /// publishes it.
    async fn write<T>(
        &self,
        op: impl FnOnce(&mut VersionedTable) -> Result<T> + Send,
    ) -> Result<T> {
        let mut guard = self.table.write().await;
        let mut staged = guard.clone();
        let out = op(&mut staged)?;
        if let Some(persistence) = &self.persistence {
            let persistence = persistence.clone();
            staged = tokio::task::spawn_blocking(move || persistence.save(&staged).map(|()| staged))
                .await
                .map_err(|e| StoreError::Io(format!("snapshot task failed: {e}")))??;
        }
        *guard = staged;
        Ok(out)
    }
}

#[async_trait]
impl RecordStore for StarshipStore {
    async fn count(&self) -> Result<usize> {
        Ok(self.table.read().await.len())
    }

    async fn scan(&self) -> Result<Vec<Starship>> {
        Ok(self.table.read().await.scan())
    }

    async fn find(&self, id: StarshipId) -> Result<Option<VersionedRow>> {
        Ok(self.table.read().await.get(id).cloned())
    }

    async fn insert(&self, record: Starship) -> Result<Starship> {
        let saved = self.write(|table| Ok(table.insert(record))).await?;
        debug!(id = saved.id, "inserted starship");
        Ok(saved)
    }

    async fn insert_many(&self, records: Vec<Starship>) -> Result<Vec<Starship>> {
        let saved = self.write(|table| Ok(table.insert_many(records))).await?;
        debug!(count = saved.len(), "inserted starship batch");
        Ok(saved)
    }

    async fn update_if_version(
        &self,
        id: StarshipId,
        expected_version: u64,
        record: Starship,
    ) -> Result<u64> {
        let version = self
            .write(|table| table.compare_and_swap(id, expected_version, record))
            .await?;
        debug!(id, version, "updated starship");
        Ok(version)
    }

    async fn delete(&self, id: StarshipId) -> Result<bool> {
        {
            // Skip the snapshot rewrite when there is nothing to remove.
            if self.table.read().await.get(id).is_none() {
                return Ok(false);
            }
        }
        let removed = self.write(|table| Ok(table.delete(id))).await?;
        debug!(id, removed, "deleted starship");
        Ok(removed)
    }
}
