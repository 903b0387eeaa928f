use super::table::VersionedRow;
use crate::core::{Result, Starship, StarshipId};
use async_trait::async_trait;

/// Record store trait - the only shared resource between requests.
///
/// Reads return owned copies; nothing a caller does with them reaches the
/// store until it goes back through a write method.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Number of live records
    async fn count(&self) -> Result<usize>;

    /// All records ordered by id
    async fn scan(&self) -> Result<Vec<Starship>>;

    /// One record with its current version
    async fn find(&self, id: StarshipId) -> Result<Option<VersionedRow>>;

    /// Insert a record; the store assigns the id
    async fn insert(&self, record: Starship) -> Result<Starship>;

    /// Insert a batch atomically; either every record is committed or none
    async fn insert_many(&self, records: Vec<Starship>) -> Result<Vec<Starship>>;

    /// Replace a record if its version still matches, returning the new version
    async fn update_if_version(
        &self,
        id: StarshipId,
        expected_version: u64,
        record: Starship,
    ) -> Result<u64>;

    /// Remove a record, reporting whether it existed
    async fn delete(&self, id: StarshipId) -> Result<bool>;
}
