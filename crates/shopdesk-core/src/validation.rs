//! # Validation Module
//!
//! Input validation utilities for Shopdesk.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request deserialization (serde)                              │
//! │  ├── Shape and type checks                                             │
//! │  └── Unknown enum values rejected                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: field rules                                     │
//! │  ├── Positive quantities and amounts                                   │
//! │  └── Lengths, formats, basis-point ranges                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE constraints (names, invoice numbers)                       │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopdesk_core::validation::{validate_quantity, validate_discount_bps};
//!
//! validate_quantity(5).unwrap();
//! validate_discount_bps(1250).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::BPS_SCALE;
use crate::{MAX_INVOICE_ITEMS, MAX_ITEM_QUANTITY, MAX_PAYMENT_CENTS, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (product, account, party, staff).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most `max` characters
///
/// ## Example
/// ```rust
/// use shopdesk_core::validation::validate_name;
///
/// assert!(validate_name("name", "USB Cable", 200).is_ok());
/// assert!(validate_name("name", "   ", 200).is_err());
/// ```
pub fn validate_name(field: &str, name: &str, max: usize) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Canonical form of a unique name: trimmed and lower-cased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Validates an optional free-text note.
pub fn validate_note(field: &str, note: Option<&str>) -> ValidationResult<()> {
    match note {
        Some(text) if text.chars().count() > crate::MAX_NOTE_LENGTH => {
            Err(ValidationError::TooLong {
                field: field.to_string(),
                max: crate::MAX_NOTE_LENGTH,
            })
        }
        _ => Ok(()),
    }
}

/// Validates an Indian mobile number.
///
/// ## Rules
/// - Exactly 10 ASCII digits
/// - First digit 6-9
///
/// ## Example
/// ```rust
/// use shopdesk_core::validation::validate_mobile_number;
///
/// assert!(validate_mobile_number("9876543210").is_ok());
/// assert!(validate_mobile_number("1234567890").is_err());
/// ```
pub fn validate_mobile_number(mobile: &str) -> ValidationResult<()> {
    let mobile = mobile.trim();

    if mobile.is_empty() {
        return Err(ValidationError::Required {
            field: "mobile number".to_string(),
        });
    }

    let valid = mobile.len() == 10
        && mobile.chars().all(|c| c.is_ascii_digit())
        && matches!(mobile.as_bytes()[0], b'6'..=b'9');

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "mobile number".to_string(),
            reason: "must be 10 digits starting with 6-9".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Only a structural check: one `@`, non-empty local part, and a dot in the
/// domain that is neither first nor last.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@domain.tld".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a caller-supplied invoice number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens, slashes and underscores only
pub fn validate_invoice_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "invoice number".to_string(),
        });
    }

    if number.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "invoice number".to_string(),
            max: 50,
        });
    }

    if !number
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '/' | '_'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "invoice number".to_string(),
            reason: "must contain only letters, numbers, '-', '/' and '_'".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in paise.
///
/// Zero is allowed (free items). Capped at [`MAX_PRICE_CENTS`].
///
/// ## Example
/// ```rust
/// use shopdesk_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("sale price", 1099).is_ok());
/// assert!(validate_price_cents("sale price", 0).is_ok());
/// assert!(validate_price_cents("sale price", -100).is_err());
/// assert!(validate_price_cents("sale price", i64::MAX).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a payment amount in paise. Must be positive and at most
/// [`MAX_PAYMENT_CENTS`].
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    if cents > MAX_PAYMENT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "payment amount".to_string(),
            min: 1,
            max: MAX_PAYMENT_CENTS,
        });
    }

    Ok(())
}

/// Validates a discount percentage in basis points (0% to 100%).
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > BPS_SCALE {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: BPS_SCALE as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of line items on an invoice.
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_INVOICE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_INVOICE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Reference Validators
// =============================================================================

/// Validates that a required reference id is present.
///
/// Any non-empty id is accepted; the store decides whether it resolves.
pub fn validate_reference(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "USB Cable", 200).is_ok());
        assert!(validate_name("name", "", 200).is_err());
        assert!(validate_name("name", &"A".repeat(300), 200).is_err());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Cash Drawer "), "cash drawer");
    }

    #[test]
    fn test_validate_mobile_number() {
        assert!(validate_mobile_number("9876543210").is_ok());
        assert!(validate_mobile_number("6000000000").is_ok());

        assert!(validate_mobile_number("").is_err());
        assert!(validate_mobile_number("5876543210").is_err());
        assert!(validate_mobile_number("987654321").is_err());
        assert!(validate_mobile_number("98765432a0").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("owner@shop.in").is_ok());
        assert!(validate_email("owner.shop.in").is_err());
        assert!(validate_email("@shop.in").is_err());
        assert!(validate_email("owner@shop").is_err());
        assert!(validate_email("owner@@shop.in").is_err());
    }

    #[test]
    fn test_validate_invoice_number() {
        assert!(validate_invoice_number("INV-0001").is_ok());
        assert!(validate_invoice_number("2024/INV/7").is_ok());
        assert!(validate_invoice_number("").is_err());
        assert!(validate_invoice_number("INV 1").is_err());
        assert!(validate_invoice_number(&"1".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(1).is_ok());
        assert!(validate_payment_amount(0).is_err());
        assert!(validate_payment_amount(-50).is_err());
        assert!(validate_payment_amount(MAX_PAYMENT_CENTS).is_ok());
        assert!(validate_payment_amount(MAX_PAYMENT_CENTS + 1).is_err());
    }

    #[test]
    fn test_validate_discount_bps() {
        assert!(validate_discount_bps(0).is_ok());
        assert!(validate_discount_bps(1250).is_ok());
        assert!(validate_discount_bps(10_000).is_ok());
        assert!(validate_discount_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_item_count() {
        assert!(validate_item_count(1).is_ok());
        assert!(validate_item_count(0).is_err());
        assert!(validate_item_count(MAX_INVOICE_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_note() {
        assert!(validate_note("private note", None).is_ok());
        assert!(validate_note("private note", Some("fragile")).is_ok());
        assert!(validate_note("private note", Some(&"x".repeat(501))).is_err());
    }
}
