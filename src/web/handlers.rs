use super::AppState;
use super::error::{ErrorPage, WebError};
use super::views::FormMode;
use crate::core::{StarshipDraft, StarshipId, ValidationErrors};
use crate::gateway::GatewayError;
use axum::Form;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};
use http::{StatusCode, header};
use serde::Deserialize;

pub type PageResult = Result<Response, ErrorPage>;

/// Starship form as posted by the browser. Absent inputs bind as empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StarshipForm {
    pub id: Option<String>,
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    pub starship_class: String,
    pub crew: String,
    pub passengers: String,
}

impl From<StarshipForm> for StarshipDraft {
    fn from(form: StarshipForm) -> Self {
        Self {
            id: form.id.as_deref().and_then(parse_id),
            name: form.name,
            model: form.model,
            manufacturer: form.manufacturer,
            starship_class: form.starship_class,
            crew: form.crew,
            passengers: form.passengers,
        }
    }
}

fn parse_id(raw: &str) -> Option<StarshipId> {
    raw.trim().parse().ok()
}

fn redirect_to_list() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/records")]).into_response()
}

pub async fn index() -> Response {
    redirect_to_list()
}

pub async fn healthcheck() -> &'static str {
    "ok"
}

pub async fn list(State(state): State<AppState>) -> PageResult {
    let starships = state.gateway.list().await.map_err(|e| state.fail(e))?;
    let html = state.views.list(&starships).map_err(|e| state.fail(e))?;
    Ok(Html(html).into_response())
}

pub async fn details(State(state): State<AppState>, Path(id): Path<String>) -> PageResult {
    let ship = state
        .gateway
        .get(parse_id(&id))
        .await
        .map_err(|e| state.fail(e))?;
    let html = state.views.details(&ship).map_err(|e| state.fail(e))?;
    Ok(Html(html).into_response())
}

pub async fn create_form(State(state): State<AppState>) -> PageResult {
    state.form_page(FormMode::Create, &StarshipDraft::default(), &ValidationErrors::default())
}

pub async fn create(State(state): State<AppState>, Form(form): Form<StarshipForm>) -> PageResult {
    match state.gateway.create(form.into()).await {
        Ok(_) => Ok(redirect_to_list()),
        Err(GatewayError::ValidationFailed { draft, errors }) => {
            state.form_page(FormMode::Create, &draft, &errors)
        }
        Err(err) => Err(state.fail(err)),
    }
}

pub async fn edit_form(State(state): State<AppState>, Path(id): Path<String>) -> PageResult {
    let ship = state
        .gateway
        .get(parse_id(&id))
        .await
        .map_err(|e| state.fail(e))?;
    state.form_page(
        FormMode::Edit(ship.id),
        &StarshipDraft::from(&ship),
        &ValidationErrors::default(),
    )
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<StarshipForm>,
) -> PageResult {
    let Some(route_id) = parse_id(&id) else {
        return Err(state.fail(GatewayError::NotFound(None)));
    };

    match state.gateway.update(route_id, form.into()).await {
        Ok(_) => Ok(redirect_to_list()),
        Err(GatewayError::ValidationFailed { draft, errors }) => {
            state.form_page(FormMode::Edit(route_id), &draft, &errors)
        }
        Err(err) => Err(state.fail(err)),
    }
}

pub async fn delete_confirm(State(state): State<AppState>, Path(id): Path<String>) -> PageResult {
    let ship = state
        .gateway
        .get(parse_id(&id))
        .await
        .map_err(|e| state.fail(e))?;
    let html = state.views.confirm_delete(&ship).map_err(|e| state.fail(e))?;
    Ok(Html(html).into_response())
}

/// Redirects to the list whether or not the id existed.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> PageResult {
    if let Some(id) = parse_id(&id) {
        state.gateway.delete(id).await.map_err(|e| state.fail(e))?;
    }
    Ok(redirect_to_list())
}

impl AppState {
    fn fail(&self, err: impl Into<WebError>) -> ErrorPage {
        err.into().render(&self.views)
    }

    fn form_page(
        &self,
        mode: FormMode,
        draft: &StarshipDraft,
        errors: &ValidationErrors,
    ) -> PageResult {
        let html = self
            .views
            .form(mode, draft, errors)
            .map_err(|e| self.fail(e))?;
        Ok(Html(html).into_response())
    }
}
