use crate::core::{Result, Starship, StarshipId, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored record together with its optimistic-concurrency token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedRow {
    pub record: Starship,
    pub version: u64,
}

/// The starship table: id-ordered rows, each carrying a row version.
///
/// Ids come from a monotonic counter and are never reused, even after a
/// delete. Every successful write to a row bumps its version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedTable {
    rows: BTreeMap<StarshipId, VersionedRow>,
    next_id: StarshipId,
}

impl Default for VersionedTable {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionedTable {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Inserts a record, ignoring whatever id it carries.
    pub fn insert(&mut self, mut record: Starship) -> Starship {
        let id = self.next_id;
        self.next_id += 1;

        record.id = id;
        self.rows.insert(
            id,
            VersionedRow {
                record: record.clone(),
                version: 1,
            },
        );
        record
    }

    pub fn insert_many(&mut self, records: Vec<Starship>) -> Vec<Starship> {
        records.into_iter().map(|r| self.insert(r)).collect()
    }

    pub fn get(&self, id: StarshipId) -> Option<&VersionedRow> {
        self.rows.get(&id)
    }

    pub fn scan(&self) -> Vec<Starship> {
        self.rows.values().map(|row| row.record.clone()).collect()
    }

    /// Replaces the row only if it still exists at `expected_version`.
    ///
    /// Returns the new version on success.
    pub fn compare_and_swap(
        &mut self,
        id: StarshipId,
        expected_version: u64,
        mut record: Starship,
    ) -> Result<u64> {
        let Some(row) = self.rows.get_mut(&id) else {
            return Err(StoreError::ConcurrencyConflict {
                id,
                expected: expected_version,
                actual: None,
            });
        };

        if row.version != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                id,
                expected: expected_version,
                actual: Some(row.version),
            });
        }

        record.id = id;
        row.record = record;
        row.version += 1;
        Ok(row.version)
    }

    pub fn delete(&mut self, id: StarshipId) -> bool {
        self.rows.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn next_id(&self) -> StarshipId {
        self.next_id
    }

    /// Checks the invariants a recovered snapshot must satisfy.
    pub fn verify(&self) -> Result<()> {
        for (id, row) in &self.rows {
            if row.record.id != *id {
                return Err(StoreError::Corrupted(format!(
                    "row keyed {} carries id {}",
                    id, row.record.id
                )));
            }
            if *id >= self.next_id {
                return Err(StoreError::Corrupted(format!(
                    "row id {} is not below next id {}",
                    id, self.next_id
                )));
            }
        }
        Ok(())
    }
}
