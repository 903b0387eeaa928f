//! Server-rendered HTML surface
//!
//! A thin layer over [`StarshipGateway`]: every route decodes its input,
//! makes one gateway call, and renders a page or redirects back to the list.

pub mod error;
pub mod handlers;
pub mod views;

pub use error::{ErrorPage, WebError};
pub use views::{FormMode, Views};

use crate::gateway::StarshipGateway;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub gateway: StarshipGateway,
    pub views: Arc<Views>,
}

impl AppState {
    pub fn new(gateway: StarshipGateway, views: Views) -> Self {
        Self {
            gateway,
            views: Arc::new(views),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::healthcheck))
        .route("/records", get(handlers::list))
        .route(
            "/records/create",
            get(handlers::create_form).post(handlers::create),
        )
        .route("/records/:id", get(handlers::details))
        .route(
            "/records/:id/edit",
            get(handlers::edit_form).post(handlers::edit),
        )
        .route(
            "/records/:id/delete",
            get(handlers::delete_confirm).post(handlers::delete),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
