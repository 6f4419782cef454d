//! # Invoice Repository
//!
//! Reads settled invoices and writes them from inside the settlement
//! transaction.
//!
//! ## Invoice Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoices          header + totals (status column written from         │
//! │     │              InvoiceTotals::status(), never from input)          │
//! │     ├── invoice_items     ordered line snapshots                       │
//! │     └── invoice_payments  ordered payment snapshots                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invoices are only created by the settlement engine; there is no public
//! insert on the pool.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use shopdesk_core::{Invoice, InvoiceItem, InvoiceKind, InvoicePayment, InvoiceStatus};

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, kind, invoice_type, date, due_date, place_of_supply,
    bill_to, party_id, staff_id,
    total_amount_cents, discount_amount_cents, received_amount_cents,
    private_note, party_note, delivery_term, created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice with its items and payments.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1");
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        load_lines(&mut conn, invoice).await
    }

    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_number = ?1");
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_number.trim())
            .fetch_optional(&mut *conn)
            .await?;

        load_lines(&mut conn, invoice).await
    }

    /// The most recently created invoice of the given kind.
    pub async fn latest(&self, kind: InvoiceKind) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE kind = ?1 ORDER BY created_at DESC, rowid DESC LIMIT 1"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(kind)
            .fetch_optional(&mut *conn)
            .await?;

        load_lines(&mut conn, invoice).await
    }

    /// Invoice headers for a party, newest first. Items and payments are
    /// not loaded.
    pub async fn list_by_party(&self, party_id: &str) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE party_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(party_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Invoice headers of one kind in a given payment status, newest first.
    pub async fn list_by_status(
        &self,
        kind: InvoiceKind,
        status: InvoiceStatus,
    ) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE kind = ?1 AND status = ?2 ORDER BY created_at DESC, rowid DESC"
        );
        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(kind)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    pub async fn count(&self, kind: InvoiceKind) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE kind = ?1")
            .bind(kind)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

async fn load_lines(
    conn: &mut SqliteConnection,
    invoice: Option<Invoice>,
) -> DbResult<Option<Invoice>> {
    let Some(mut invoice) = invoice else {
        return Ok(None);
    };

    invoice.items = sqlx::query_as::<_, InvoiceItem>(
        r#"
        SELECT id, invoice_id, position, product_id, product_name, unit,
               quantity, unit_price_cents, discount_bps, line_total_cents
        FROM invoice_items
        WHERE invoice_id = ?1
        ORDER BY position
        "#,
    )
    .bind(&invoice.id)
    .fetch_all(&mut *conn)
    .await?;

    invoice.payments = sqlx::query_as::<_, InvoicePayment>(
        r#"
        SELECT id, invoice_id, account_id, method, amount_cents, reference
        FROM invoice_payments
        WHERE invoice_id = ?1
        ORDER BY position
        "#,
    )
    .bind(&invoice.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(invoice))
}

/// Persists an invoice header with its items and payments.
///
/// A duplicate `invoice_number` surfaces as `DbError::UniqueViolation`.
pub(crate) async fn insert(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    debug!(
        id = %invoice.id,
        invoice_number = %invoice.invoice_number,
        "Inserting invoice"
    );

    let totals = &invoice.totals;

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, kind, invoice_type, date, due_date, place_of_supply,
            bill_to, party_id, staff_id,
            total_amount_cents, discount_amount_cents, total_payable_amount_cents,
            received_amount_cents, due_amount_cents, status,
            private_note, party_note, delivery_term, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10,
            ?11, ?12, ?13,
            ?14, ?15, ?16,
            ?17, ?18, ?19, ?20, ?21
        )
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.invoice_number)
    .bind(invoice.kind)
    .bind(invoice.invoice_type)
    .bind(invoice.date)
    .bind(invoice.due_date)
    .bind(&invoice.place_of_supply)
    .bind(invoice.bill_to)
    .bind(&invoice.party_id)
    .bind(&invoice.staff_id)
    .bind(totals.total().paise())
    .bind(totals.discount().paise())
    .bind(totals.total_payable().paise())
    .bind(totals.received().paise())
    .bind(totals.due().paise())
    .bind(totals.status())
    .bind(&invoice.private_note)
    .bind(&invoice.party_note)
    .bind(&invoice.delivery_term)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await?;

    for item in &invoice.items {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                id, invoice_id, position, product_id, product_name, unit,
                quantity, unit_price_cents, discount_bps, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.invoice_id)
        .bind(item.position)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.unit)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.discount_bps)
        .bind(item.line_total_cents)
        .execute(&mut *conn)
        .await?;
    }

    for (position, payment) in invoice.payments.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO invoice_payments (
                id, invoice_id, position, account_id, method, amount_cents, reference
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.invoice_id)
        .bind(position as i64)
        .bind(&payment.account_id)
        .bind(&payment.method)
        .bind(payment.amount_cents)
        .bind(&payment.reference)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
