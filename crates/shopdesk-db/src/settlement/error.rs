//! # Settlement Error
//!
//! The structured error a settlement caller receives.
//!
//! ## Error Response Format
//! ```json
//! {
//!   "kind": "NOT_FOUND",
//!   "message": "Product not found: 3f2a..."
//! }
//! ```
//!
//! Internal failures never leak their cause: the message is generic and the
//! underlying error is logged with `tracing::error!`.

use serde::Serialize;
use shopdesk_core::{CoreError, ErrorKind, ValidationError};

use crate::error::DbError;

/// Result alias for settlement operations.
pub type SettlementResult<T> = Result<T, SettlementError>;

/// A failed settlement, classified for the route layer.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementError {
    /// Machine-readable classification.
    pub kind: ErrorKind,

    /// Human-readable message, safe to show.
    pub message: String,
}

impl SettlementError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        SettlementError {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        SettlementError::new(ErrorKind::InvalidArgument, message)
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        SettlementError::new(ErrorKind::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        SettlementError::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        SettlementError::new(ErrorKind::InternalFailure, message)
    }

    /// HTTP status the route layer should answer with.
    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}

impl From<CoreError> for SettlementError {
    fn from(err: CoreError) -> Self {
        SettlementError::new(err.kind(), err.to_string())
    }
}

impl From<ValidationError> for SettlementError {
    fn from(err: ValidationError) -> Self {
        SettlementError::invalid(err.to_string())
    }
}

impl From<DbError> for SettlementError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => e.into(),
            DbError::NotFound { entity, id } => SettlementError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                SettlementError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                SettlementError::invalid("Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Constraint violation: {}", message);
                SettlementError::invalid("Invalid amounts")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                SettlementError::internal("Settlement failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                SettlementError::internal("Settlement failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                SettlementError::internal("Settlement failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                SettlementError::internal("Settlement failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                SettlementError::internal("Settlement failed")
            }
        }
    }
}

impl std::fmt::Display for SettlementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for SettlementError {}
