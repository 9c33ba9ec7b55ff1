use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use refnet_shared::ValidationError;
use refnet_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    /// The message is what the client sees; the cause has already been
    /// logged.
    #[error("{0}")]
    Internal(&'static str),
}

impl ServerError {
    /// Adapter for `map_err` on store calls: request-caused failures keep
    /// their message, everything else is logged and replaced by `context`.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> ServerError {
        move |e| match e {
            StoreError::Invalid(v) => ServerError::BadRequest(v.to_string()),
            e if e.is_conflict() => ServerError::Conflict(e.to_string()),
            e => {
                tracing::error!(error = %e, "{context}");
                ServerError::Internal(context)
            }
        }
    }
}

impl From<ValidationError> for ServerError {
    fn from(e: ValidationError) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "message": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
