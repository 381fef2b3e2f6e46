//! Error types for the Campaign Dialer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Campaign Dialer error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Vapi API error: {status} - {body}")]
    Gateway { status: u16, body: String },

    #[error("Vapi transport error: {0}")]
    GatewayTransport(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<outdial_db::DbError> for Error {
    fn from(err: outdial_db::DbError) -> Self {
        match err {
            outdial_db::DbError::Connection(e) => Error::Database(e),
            other => Error::Pool(other.to_string()),
        }
    }
}

impl From<outdial_core::OutdialError> for Error {
    fn from(err: outdial_core::OutdialError) -> Self {
        match err {
            outdial_core::OutdialError::Validation(msg) => Error::InvalidPhone(msg),
            other => Error::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::InvalidRequest(_) | Error::InvalidPhone(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Error::ContactNotFound(_) | Error::CampaignNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            Error::Gateway { .. } | Error::GatewayTransport(_) => {
                tracing::error!("Gateway error: {:?}", self);
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            Error::Database(_) | Error::Pool(_) | Error::Internal(_) => {
                tracing::error!("Internal error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}
