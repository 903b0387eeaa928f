//! Record store gateway
//!
//! Mediates every create/read/update/delete against the starship store and
//! owns the identity rules: routed id must match the payload id, missing
//! records surface as `NotFound`, and commit-time version conflicts are
//! reconciled here.

mod error;

pub use error::{GatewayError, GatewayResult};

use crate::core::{Starship, StarshipDraft, StarshipId, StoreError};
use crate::storage::RecordStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct StarshipGateway {
    store: Arc<dyn RecordStore>,
}

impl StarshipGateway {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> GatewayResult<Vec<Starship>> {
        Ok(self.store.scan().await?)
    }

    pub async fn get(&self, id: Option<StarshipId>) -> GatewayResult<Starship> {
        let Some(id) = id else {
            return Err(GatewayError::NotFound(None));
        };

        self.store
            .find(id)
            .await?
            .map(|row| row.record)
            .ok_or(GatewayError::NotFound(Some(id)))
    }

    /// Validates and inserts; the store always assigns the id.
    pub async fn create(&self, draft: StarshipDraft) -> GatewayResult<Starship> {
        if let Err(errors) = draft.validate() {
            debug!(%errors, "rejected starship create");
            return Err(GatewayError::ValidationFailed { draft, errors });
        }

        if let Some(ignored) = draft.id {
            debug!(ignored, "dropping client-supplied id on create");
        }

        let created = self.store.insert(draft.into_new_record()).await?;
        info!(id = created.id, name = %created.name, "created starship");
        Ok(created)
    }

    pub async fn update(
        &self,
        route_id: StarshipId,
        draft: StarshipDraft,
    ) -> GatewayResult<Starship> {
        if draft.id != Some(route_id) {
            return Err(GatewayError::BadRequest {
                route_id,
                payload_id: draft.id,
            });
        }

        if let Err(errors) = draft.validate() {
            debug!(id = route_id, %errors, "rejected starship update");
            return Err(GatewayError::ValidationFailed { draft, errors });
        }

        let Some(existing) = self.store.find(route_id).await? else {
            return Err(GatewayError::NotFound(Some(route_id)));
        };

        let mut record = existing.record;
        draft.apply_to(&mut record);

        match self
            .store
            .update_if_version(route_id, existing.version, record.clone())
            .await
        {
            Ok(version) => {
                info!(id = route_id, version, "updated starship");
                Ok(record)
            }
            Err(err @ StoreError::ConcurrencyConflict { .. }) => {
                self.reconcile_conflict(route_id, err).await
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Deleting an id that does not exist is a successful no-op.
    pub async fn delete(&self, id: StarshipId) -> GatewayResult<bool> {
        let removed = self.store.delete(id).await?;
        if removed {
            info!(id, "deleted starship");
        } else {
            debug!(id, "delete of absent starship ignored");
        }
        Ok(removed)
    }

    /// A conflict caused by a concurrent delete is reported as `NotFound`;
    /// one caused by a concurrent modification is not recoverable here.
    async fn reconcile_conflict(
        &self,
        id: StarshipId,
        conflict: StoreError,
    ) -> GatewayResult<Starship> {
        if self.store.find(id).await?.is_none() {
            info!(id, "update lost to a concurrent delete");
            return Err(GatewayError::NotFound(Some(id)));
        }

        warn!(id, error = %conflict, "unresolved concurrency conflict on update");
        Err(GatewayError::ConcurrencyConflict(conflict))
    }
}
