use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::render;

/// Handler error: logged and rendered as an error page.
pub struct AppError {
    status: StatusCode,
    source: anyhow::Error,
}

impl AppError {
    /// Unknown dataset or class in a query string.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            source: anyhow::anyhow!(msg.into()),
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            source: err.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(status = %self.status, error = %self.source, "request failed");
        (
            self.status,
            Html(render::error_page(&self.source.to_string())),
        )
            .into_response()
    }
}
