use super::views::Views;
use crate::gateway::GatewayError;
use axum::response::{Html, IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;
use tracing::error;

/// Failure classes the HTML surface distinguishes.
#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Gateway(GatewayError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Gateway(GatewayError::BadRequest { .. }) => StatusCode::BAD_REQUEST,
            // Forms redisplay validation failures before this point.
            Self::Gateway(_) | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error page. Internal details are logged, not shown.
    pub fn render(self, views: &Views) -> ErrorPage {
        let status = self.status();
        let (title, message) = match status {
            StatusCode::NOT_FOUND => ("Not Found", "The requested starship does not exist."),
            StatusCode::BAD_REQUEST => ("Bad Request", "The submitted starship does not match the address it was sent to."),
            _ => {
                error!(error = %self, "request failed");
                ("Server Error", "Something went wrong while processing your request.")
            }
        };

        let body = views.error(title, message).unwrap_or_else(|err| {
            error!(error = %err, "could not render error page");
            format!("<h1>{title}</h1><p>{message}</p>")
        });
        ErrorPage { status, body }
    }
}

/// A rendered error response.
#[derive(Debug)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub body: String,
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        (self.status, Html(self.body)).into_response()
    }
}
