// ============================================================================
// Starship Inventory Library
// ============================================================================

pub mod config;
pub mod core;
pub mod gateway;
pub mod seed;
pub mod storage;
pub mod web;

// Re-export main types for convenience
pub use core::{Starship, StarshipDraft, StarshipId, StoreError, ValidationErrors};
pub use gateway::{GatewayError, StarshipGateway};
pub use seed::{SeedLoader, SeedOutcome};
pub use storage::{RecordStore, StarshipStore};
pub use web::{AppState, build_router};
