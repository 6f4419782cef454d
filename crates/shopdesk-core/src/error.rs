//! # Error Types
//!
//! Domain-specific error types for shopdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopdesk-core errors (this file)                                      │
//! │  ├── ErrorKind        - Caller-facing classification (400/404/409/500) │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopdesk-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── SettlementError  - What the route handler sees (kind + message)   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                          DbError ───┴─► SettlementError → HTTP layer   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, account id, etc.)
//! 3. Errors are enum variants, never String
//! 4. Every variant maps to exactly one [`ErrorKind`]

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Classification of a failure as seen by callers of the settlement core.
///
/// The surrounding HTTP layer maps each kind to a status code via
/// [`ErrorKind::http_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing or malformed field, non-positive quantity/amount, empty item
    /// list, discount exceeding the total.
    InvalidArgument,
    /// A product, account, party or staff reference does not resolve.
    NotFound,
    /// The request collides with stored state (duplicate invoice number,
    /// insufficient balance, inactive account).
    Conflict,
    /// Store unavailable, timeout, or any unexpected failure.
    InternalFailure,
}

impl ErrorKind {
    /// HTTP status code the route layer should answer with.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorKind::InvalidArgument => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InternalFailure => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidArgument => write!(f, "invalid argument"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::InternalFailure => write!(f, "internal failure"),
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or lookups that failed
/// while settling an invoice.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist in the catalog
    /// - Product was deactivated (soft lifecycle)
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Ledger account cannot be found.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Customer or supplier cannot be found.
    #[error("Party not found: {0}")]
    PartyNotFound(String),

    /// Issuing staff user cannot be found.
    #[error("Staff user not found: {0}")]
    StaffNotFound(String),

    /// Insufficient stock to complete a sale.
    ///
    /// Only raised when strict stock enforcement is switched on; the default
    /// policy lets stock go negative and reports it as low stock instead.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A debit would drive an account balance negative.
    #[error("Insufficient balance in account {account}: balance {balance_cents}, requested {requested_cents}")]
    InsufficientBalance {
        account: String,
        balance_cents: i64,
        requested_cents: i64,
    },

    /// Payment routed to an account that is not active.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    /// Invoice-level discount larger than the invoice total.
    #[error("Discount {discount_cents} exceeds invoice total {total_cents}")]
    DiscountExceedsTotal {
        discount_cents: i64,
        total_cents: i64,
    },

    /// Party exists but has the wrong designation for this invoice.
    ///
    /// ## When This Occurs
    /// - Purchase invoice billed from a party that is not a supplier
    #[error("Party {party_id} is not a {expected}")]
    DesignationMismatch { party_id: String, expected: String },

    /// An amount or running total left the representable range.
    ///
    /// ## When This Occurs
    /// - Line, invoice or payment sums that would overflow `i64`
    /// - A credit that would push an account balance past `i64::MAX`
    #[error("{0} exceeds the supported range")]
    AmountOutOfRange(String),

    /// Invoice number already used by another invoice.
    #[error("Invoice number '{0}' already exists")]
    DuplicateInvoiceNumber(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the caller-facing classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::AccountNotFound(_)
            | CoreError::PartyNotFound(_)
            | CoreError::StaffNotFound(_) => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. }
            | CoreError::InsufficientBalance { .. }
            | CoreError::AccountInactive(_)
            | CoreError::DuplicateInvoiceNumber(_) => ErrorKind::Conflict,
            CoreError::DiscountExceedsTotal { .. }
            | CoreError::DesignationMismatch { .. }
            | CoreError::AmountOutOfRange(_)
            | CoreError::Validation(_) => ErrorKind::InvalidArgument,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Used for early validation before any store is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid mobile number or email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate product name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientBalance {
            account: "bank".to_string(),
            balance_cents: 300,
            requested_cents: 500,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance in account bank: balance 300, requested 500"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "staff_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            CoreError::ProductNotFound("p1".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::DuplicateInvoiceNumber("INV-0001".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            CoreError::DiscountExceedsTotal {
                discount_cents: 10,
                total_cents: 5
            }
            .kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorKind::InvalidArgument.http_status(), 400);
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::Conflict.http_status(), 409);
        assert_eq!(ErrorKind::InternalFailure.http_status(), 500);
    }
}
