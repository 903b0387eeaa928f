use crate::core::StarshipId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(
        "Concurrency conflict on starship {id}: expected version {expected}, found {}",
        .actual.map_or_else(|| "no row".to_string(), |v| v.to_string())
    )]
    ConcurrencyConflict {
        id: StarshipId,
        expected: u64,
        actual: Option<u64>,
    },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupted store: {0}")]
    Corrupted(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
