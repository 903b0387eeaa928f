pub mod engine;
pub mod memory;
pub mod persistence;
pub mod table;

pub use engine::RecordStore;
pub use memory::StarshipStore;
pub use persistence::{SnapshotManager, ensure_writable_dir};
pub use table::{VersionedRow, VersionedTable};
