//! # Invoice Numbering
//!
//! Gapless `{prefix}-{n:04}` numbers from a counter row per prefix.
//!
//! ## Reservation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. INSERT counter row if missing                                      │
//! │     seeded from MAX(numeric suffix) of existing invoices               │
//! │     (first statement of the settlement: takes the write lock)          │
//! │                                                                         │
//! │  2. UPDATE invoice_counters SET last_value = last_value + 1            │
//! │     RETURNING last_value                                               │
//! │                                                                         │
//! │  Both run inside the settlement transaction. Rollback returns the      │
//! │  number, so a failed settlement never leaves a gap.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shopdesk_core::invoice::{claimed_sequence, format_invoice_number, is_in_sequence};
use shopdesk_core::{CoreError, ValidationError};

/// Creates the counter row for `prefix` unless it exists.
///
/// Invoices numbered before the counter existed are honored by seeding
/// `last_value` with their highest numeric suffix.
pub(crate) async fn ensure_counter(conn: &mut SqliteConnection, prefix: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_counters (prefix, last_value)
        SELECT ?1, COALESCE(MAX(CAST(substr(invoice_number, length(?1) + 2) AS INTEGER)), 0)
        FROM invoices
        WHERE substr(invoice_number, 1, length(?1) + 1) = ?1 || '-'
          AND length(invoice_number) > length(?1) + 1
          AND substr(invoice_number, length(?1) + 2) NOT GLOB '*[^0-9]*'
        ON CONFLICT(prefix) DO NOTHING
        "#,
    )
    .bind(prefix)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Reserves the next number for `prefix`.
pub(crate) async fn next_number(conn: &mut SqliteConnection, prefix: &str) -> DbResult<String> {
    ensure_counter(conn, prefix).await?;

    let value: i64 = sqlx::query_scalar(
        r#"
        UPDATE invoice_counters
        SET last_value = last_value + 1
        WHERE prefix = ?1
        RETURNING last_value
        "#,
    )
    .bind(prefix)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::Internal(format!("invoice counter missing for {}", prefix)))?;

    let number = format_invoice_number(prefix, value);
    debug!(invoice_number = %number, "Reserved invoice number");

    Ok(number)
}

/// Claims a caller-supplied number.
///
/// A number in `{prefix}-{n}` form moves the counter to at least `n`, so
/// later automatic numbers skip past it. Numbers in the other kind's
/// `{foreign_prefix}-{n}` form are refused; that sequence is not ours to
/// advance.
///
/// ## Errors
/// - `Validation(InvalidFormat)` for a number in the foreign sequence
/// - `Validation(OutOfRange)` for `n` above `MAX_INVOICE_SEQUENCE`
/// - `DuplicateInvoiceNumber` if an invoice already carries the number
pub(crate) async fn claim_number(
    conn: &mut SqliteConnection,
    prefix: &str,
    foreign_prefix: &str,
    number: &str,
) -> DbResult<()> {
    if foreign_prefix != prefix && is_in_sequence(foreign_prefix, number) {
        return Err(CoreError::from(ValidationError::InvalidFormat {
            field: "invoice number".to_string(),
            reason: format!("prefix '{}' belongs to the other invoice kind", foreign_prefix),
        })
        .into());
    }
    let claimed = claimed_sequence(prefix, number)?;

    ensure_counter(conn, prefix).await?;

    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM invoices WHERE invoice_number = ?1)")
            .bind(number)
            .fetch_one(&mut *conn)
            .await?;
    if taken {
        return Err(CoreError::DuplicateInvoiceNumber(number.to_string()).into());
    }

    if let Some(value) = claimed {
        sqlx::query(
            "UPDATE invoice_counters SET last_value = MAX(last_value, ?2) WHERE prefix = ?1",
        )
        .bind(prefix)
        .bind(value)
        .execute(&mut *conn)
        .await?;
        debug!(invoice_number = %number, "Advanced invoice counter");
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
