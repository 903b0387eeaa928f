use crate::core::{StarshipDraft, StarshipId, StoreError, ValidationErrors};
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Carries the rejected payload back so it can be redisplayed.
    #[error("validation failed: {errors}")]
    ValidationFailed {
        draft: StarshipDraft,
        errors: ValidationErrors,
    },

    #[error("starship not found{}", .0.map(|id| format!(": {id}")).unwrap_or_default())]
    NotFound(Option<StarshipId>),

    #[error("route id {route_id} does not match payload id {payload_id:?}")]
    BadRequest {
        route_id: StarshipId,
        payload_id: Option<StarshipId>,
    },

    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(#[source] StoreError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
