use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use medreg_registry::{AdmissionError, InvitationError, RegistryError};
use medreg_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// Error returned from a request handler, rendered as `{ "error", "message" }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Invitation(#[from] InvitationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("record not found: {0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Admission(e) => match e {
                AdmissionError::InvalidRecordShape { .. } => StatusCode::BAD_REQUEST,
                AdmissionError::CapacityExceeded { .. } => StatusCode::CONFLICT,
                AdmissionError::StoreWriteFailed { .. }
                | AdmissionError::ExistenceCheckFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
                AdmissionError::Gate(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Invitation(_) => StatusCode::FORBIDDEN,
            Self::Registry(RegistryError::Store(StoreError::InvalidKey { .. })) => {
                StatusCode::BAD_REQUEST
            }
            Self::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Admission(e) => e.kind(),
            Self::Invitation(InvitationError::Unknown(_)) => "UnknownInvitation",
            Self::Invitation(InvitationError::AlreadyRedeemed(_)) => "InvitationAlreadyRedeemed",
            Self::Registry(RegistryError::Store(StoreError::InvalidKey { .. })) => "InvalidRecordId",
            Self::Registry(_) => "RegistryError",
            Self::NotFound(_) => "NotFound",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
