//! Snapshot persistence for the starship table

use crate::core::{Result, StoreError};
use crate::storage::table::VersionedTable;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const SNAPSHOT_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Table Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub version: u32,
    pub table: VersionedTable,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: u64,
    pub row_count: usize,
}

impl TableSnapshot {
    pub fn new(table: VersionedTable) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let row_count = table.len();

        Self {
            version: SNAPSHOT_FORMAT_VERSION,
            table,
            metadata: SnapshotMetadata {
                created_at,
                row_count,
            },
        }
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

#[derive(Debug, Clone)]
pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Writes the table to a temp file and atomically renames it into place.
    pub fn save(&self, table: &VersionedTable) -> Result<()> {
        if let Some(parent) = self.snapshot_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Io(format!("Failed to create snapshot directory: {}", e))
                })?;
            }
        }

        let snapshot = TableSnapshot::new(table.clone());
        let serialized = rmp_serde::to_vec(&snapshot)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize snapshot: {}", e)))?;

        let temp_path = self.snapshot_path.with_extension("tmp");
        let temp_file = File::create(&temp_path)
            .map_err(|e| StoreError::Io(format!("Failed to create temp file: {}", e)))?;
        let mut writer = BufWriter::new(temp_file);
        writer
            .write_all(&serialized)
            .map_err(|e| StoreError::Io(format!("Failed to write snapshot: {}", e)))?;
        writer
            .flush()
            .map_err(|e| StoreError::Io(format!("Failed to flush snapshot: {}", e)))?;
        writer
            .get_mut()
            .sync_all()
            .map_err(|e| StoreError::Io(format!("Failed to sync snapshot: {}", e)))?;
        fs::rename(&temp_path, &self.snapshot_path)
            .map_err(|e| StoreError::Io(format!("Failed to rename snapshot: {}", e)))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<VersionedTable>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let mut file = File::open(&self.snapshot_path)
            .map_err(|e| StoreError::Io(format!("Failed to open snapshot: {}", e)))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| StoreError::Io(format!("Failed to read snapshot: {}", e)))?;

        let snapshot: TableSnapshot = rmp_serde::from_slice(&data).map_err(|e| {
            StoreError::Corrupted(format!("Failed to deserialize snapshot: {}", e))
        })?;
        if snapshot.version != SNAPSHOT_FORMAT_VERSION {
            return Err(StoreError::Corrupted(format!(
                "Unsupported snapshot version {}",
                snapshot.version
            )));
        }
        snapshot.table.verify()?;
        Ok(Some(snapshot.table))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }
}

/// Makes sure `dir` exists and accepts new files.
///
/// Hosted environments often mount the application directory read-only, so
/// this runs before the store is first touched.
pub fn ensure_writable_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        StoreError::Io(format!(
            "Failed to create data directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        StoreError::Io(format!(
            "Data directory '{}' is not writable: {}",
            dir.display(),
            e
        ))
    })?;
    Ok(())
}
