//! # Payment Allocator
//!
//! Routes payment instructions to ledger accounts.
//!
//! Sales credit the receiving account. Purchases debit the paying account,
//! which must cover the amount. `received` is the plain sum of the
//! instructions and is never clamped to the invoice total; the due amount
//! absorbs any over- or under-payment.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::account::{self, Movement};
use shopdesk_core::{CoreError, InvoiceKind, InvoicePayment, Money, PaymentInstruction};

/// Output of [`allocate_payments`].
#[derive(Debug, Clone)]
pub struct AllocatedPayments {
    pub received: Money,

    /// Payment snapshots in instruction order.
    pub payments: Vec<InvoicePayment>,
}

/// Applies every payment instruction to its account.
///
/// ## Errors
/// - `AccountNotFound` for an unknown account
/// - `AccountInactive` for a deactivated account
/// - `InsufficientBalance` when a purchase payment exceeds the balance
/// - `AmountOutOfRange` if the payments or a credited balance overflow
pub(crate) async fn allocate_payments(
    conn: &mut SqliteConnection,
    kind: InvoiceKind,
    instructions: &[PaymentInstruction],
    invoice_id: &str,
    invoice_number: &str,
    now: DateTime<Utc>,
) -> DbResult<AllocatedPayments> {
    let description = format!("{} {}", kind, invoice_number);
    let mut received = Money::zero();
    let mut payments = Vec::with_capacity(instructions.len());

    for instruction in instructions {
        let account = account::fetch(conn, &instruction.account_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(instruction.account_id.clone()))?;

        if !account.is_active() {
            return Err(CoreError::AccountInactive(account.name).into());
        }

        let movement = Movement {
            amount_cents: instruction.amount_cents,
            description: Some(description.as_str()),
            reference: instruction.reference.as_deref(),
            invoice_id: Some(invoice_id),
        };

        let balance = match kind {
            InvoiceKind::Sale => account::credit(conn, &account.id, movement, now).await?,
            InvoiceKind::Purchase => account::debit(conn, &account.id, movement, now).await?,
        };

        debug!(
            account_id = %account.id,
            amount = instruction.amount_cents,
            balance = balance,
            "Allocated payment"
        );

        received = received
            .checked_add(Money::from_paise(instruction.amount_cents))
            .ok_or_else(|| CoreError::AmountOutOfRange("received amount".to_string()))?;
        payments.push(InvoicePayment {
            id: Uuid::new_v4().to_string(),
            invoice_id: invoice_id.to_string(),
            account_id: account.id,
            method: account.name,
            amount_cents: instruction.amount_cents,
            reference: instruction.reference.clone(),
        });
    }

    Ok(AllocatedPayments { received, payments })
}
