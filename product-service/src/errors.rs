use crate::db::errors::DbError;
use crate::odata::ReferenceError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Request body failed to deserialize or broke a field rule
    #[error("{message}")]
    Validation { message: String },

    /// Malformed request that is not a body validation failure
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// `@odata.id` could not be resolved to a key
    #[error(transparent)]
    InvalidReference(#[from] ReferenceError),

    /// The navigation property exists but does not support the operation, or does not exist
    #[error("{relation} on {resource} does not support this operation")]
    NotImplemented { resource: String, relation: String },

    /// A conditional write failed and the row still exists
    #[error("{resource} with ID {id} was modified concurrently")]
    ConcurrencyConflict { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Wire shape of every error response: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    /// One of NotFound, BadRequest, ValidationError, InvalidReference, NotImplemented,
    /// ConcurrencyConflict, InternalError
    pub code: String,
    pub message: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } | Error::BadRequest { .. } | Error::InvalidReference(_) => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            Error::ConcurrencyConflict { .. } | Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::ConcurrencyConflict { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Machine-readable error code carried in the response body
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "ValidationError",
            Error::BadRequest { .. } => "BadRequest",
            Error::NotFound { .. } => "NotFound",
            Error::InvalidReference(_) => "InvalidReference",
            Error::NotImplemented { .. } => "NotImplemented",
            Error::ConcurrencyConflict { .. } => "ConcurrencyConflict",
            Error::Internal { .. } | Error::Other(_) => "InternalError",
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "NotFound",
                DbError::ConcurrencyConflict { .. } => "ConcurrencyConflict",
                DbError::ForeignKeyViolation { .. } => "BadRequest",
                DbError::Other(_) => "InternalError",
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { message } | Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::InvalidReference(err) => err.to_string(),
            Error::NotImplemented { .. } | Error::ConcurrencyConflict { .. } => self.to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::ConcurrencyConflict { entity, id } => format!("{entity} with ID {id} was modified concurrently"),
                DbError::ForeignKeyViolation { constraint, .. } => match constraint.as_deref() {
                    Some("products_supplier_id_fkey") => "supplierId does not refer to an existing Supplier".to_string(),
                    _ => "Invalid reference to related resource".to_string(),
                },
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::ConcurrencyConflict { .. } | Error::Database(DbError::ConcurrencyConflict { .. }) => {
                tracing::error!("Unresolved concurrency conflict: {}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::NotImplemented { .. } => {
                tracing::info!("Unsupported operation: {}", self);
            }
            Error::Validation { .. } | Error::BadRequest { .. } | Error::NotFound { .. } | Error::InvalidReference(_) => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
