use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub(crate) enum ServerError {
    /// No `kind` (ledger, month) is known by `id`.
    NotFound { kind: &'static str, id: String },
    InternalError(anyhow::Error),
}

impl ServerError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> ServerError {
        ServerError::NotFound { kind, id: id.into() }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound { kind, id } => {
                log::debug!("{} {} not found", kind, id);
                let body = json!({"error": format!("{} not found", kind), "kind": kind, "id": id});
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            },
            Self::InternalError(err) => {
                log::error!("request failed: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {}", err)).into_response()
            }
        }
    }
}

impl<E> From<E> for ServerError
where
    E: Into<anyhow::Error>
{
    fn from(err: E) -> Self {
        Self::InternalError(err.into())
    }
}
