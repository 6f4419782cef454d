//! # Settlement Engine
//!
//! One request in, one committed invoice out, or nothing at all.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request.validate()                       pure, before any I/O         │
//! │       │                                                                 │
//! │  BEGIN ─────────────────────────────────────────────────────────────┐  │
//! │  │  numbering (counter insert is the first write → write lock)      │  │
//! │  │  party + staff lookup                                            │  │
//! │  │  resolve_items      → frozen lines, total, stock deltas          │  │
//! │  │  discount check                                                  │  │
//! │  │  allocate_payments  → received, account credits/debits           │  │
//! │  │  InvoiceTotals::compute → payable, due, status                   │  │
//! │  │  insert invoice + items + payments                               │  │
//! │  │  party/staff history, party balance ± due                        │  │
//! │  COMMIT ────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Any `?` before COMMIT drops the transaction: every stock, account,    │
//! │  counter and ledger write is rolled back together.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::allocator::allocate_payments;
use super::error::{SettlementError, SettlementResult};
use super::numbering;
use super::resolver::resolve_items;
use crate::config::SettlementSettings;
use crate::error::{DbError, DbResult};
use crate::repository::{invoice, party, staff};
use shopdesk_core::{
    BillTo, CoreError, Designation, Invoice, InvoiceKind, InvoiceTotals, Money, Party,
    SettlementRequest, ValidationError,
};

/// A committed invoice plus the advisory low-stock signal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledInvoice {
    pub invoice: Invoice,

    /// Products at or below their low-stock threshold after this invoice.
    pub low_stock_product_ids: Vec<String>,
}

/// Settles sale and purchase invoices against one pool.
///
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    pool: SqlitePool,
    settings: SettlementSettings,
}

impl SettlementEngine {
    pub fn new(pool: SqlitePool, settings: SettlementSettings) -> Self {
        SettlementEngine { pool, settings }
    }

    pub fn settings(&self) -> &SettlementSettings {
        &self.settings
    }

    /// Settles one invoice.
    ///
    /// ## Errors
    /// - `InvalidArgument`: malformed request, discount above total,
    ///   purchase from a non-supplier
    /// - `NotFound`: product, account, party or staff user missing
    /// - `Conflict`: duplicate invoice number, inactive account,
    ///   insufficient balance (purchases), insufficient stock (strict mode)
    /// - `InternalFailure`: store failure or timeout; nothing is persisted
    pub async fn settle(&self, request: SettlementRequest) -> SettlementResult<SettledInvoice> {
        request.validate()?;

        let limit = self.settings.timeout();
        match tokio::time::timeout(limit, self.settle_in_transaction(&request)).await {
            Ok(result) => result.map_err(SettlementError::from),
            Err(_) => {
                error!(
                    kind = %request.kind,
                    timeout_ms = self.settings.timeout_ms,
                    "Settlement timed out, rolled back"
                );
                Err(SettlementError::internal("Settlement timed out"))
            }
        }
    }

    async fn settle_in_transaction(&self, request: &SettlementRequest) -> DbResult<SettledInvoice> {
        let now = Utc::now();
        let kind = request.kind;
        let prefix = self.settings.prefix_for(kind);

        let mut tx = self.pool.begin().await?;

        // Numbering goes first so the transaction starts with a write.
        let invoice_number = match request.invoice_number.as_deref().map(str::trim) {
            Some(number) => {
                let foreign_prefix = self.settings.prefix_for(kind.counterpart());
                numbering::claim_number(&mut tx, prefix, foreign_prefix, number).await?;
                number.to_string()
            }
            None => numbering::next_number(&mut tx, prefix).await?,
        };
        debug!(invoice_number = %invoice_number, kind = %kind, "Settling invoice");

        let party = self.resolve_party(&mut tx, request).await?;
        let staff_user = staff::fetch(&mut tx, &request.staff_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| CoreError::StaffNotFound(request.staff_id.clone()))?;

        let invoice_id = Uuid::new_v4().to_string();
        let resolved = resolve_items(
            &mut tx,
            kind,
            &request.items,
            &invoice_id,
            self.settings.strict_stock,
            now,
        )
        .await?;

        // Reject an oversized discount before any account moves.
        let discount = Money::from_paise(request.discount_amount_cents);
        InvoiceTotals::compute(resolved.total, discount, Money::zero())?;

        let allocated = allocate_payments(
            &mut tx,
            kind,
            &request.payments,
            &invoice_id,
            &invoice_number,
            now,
        )
        .await?;

        let totals = InvoiceTotals::compute(resolved.total, discount, allocated.received)?;
        let date = request.date.unwrap_or(now);

        let invoice = Invoice {
            id: invoice_id,
            invoice_number,
            kind,
            invoice_type: request.invoice_type,
            date,
            due_date: request.due_date,
            place_of_supply: trimmed(request.place_of_supply.as_deref()),
            bill_to: request.bill_to,
            party_id: party.id,
            staff_id: staff_user.id,
            totals,
            private_note: trimmed(request.private_note.as_deref()),
            party_note: trimmed(request.party_note.as_deref()),
            delivery_term: trimmed(request.delivery_term.as_deref()),
            created_at: now,
            updated_at: now,
            items: resolved.items,
            payments: allocated.payments,
        };

        invoice::insert(&mut tx, &invoice)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => {
                    CoreError::DuplicateInvoiceNumber(invoice.invoice_number.clone()).into()
                }
                other => other,
            })?;

        let payable = totals.total_payable().paise();
        party::append_history(&mut tx, &invoice.party_id, &invoice.id, kind, date, payable).await?;
        staff::append_history(&mut tx, &invoice.staff_id, &invoice.id, kind, date, payable).await?;

        // Positive party balance means the party owes the shop.
        let balance_delta = match kind {
            InvoiceKind::Sale => totals.due().paise(),
            InvoiceKind::Purchase => -totals.due().paise(),
        };
        let party_balance =
            party::adjust_balance(&mut tx, &invoice.party_id, balance_delta, now).await?;

        tx.commit().await?;

        info!(
            invoice_number = %invoice.invoice_number,
            kind = %kind,
            total_payable = payable,
            received = totals.received().paise(),
            status = %totals.status(),
            party_balance = party_balance,
            "Invoice settled"
        );

        for product_id in &resolved.low_stock_product_ids {
            warn!(product_id = %product_id, "Product at or below low-stock threshold");
        }

        Ok(SettledInvoice {
            invoice,
            low_stock_product_ids: resolved.low_stock_product_ids,
        })
    }

    /// Cash invoices book against the configured walk-in party. A purchase
    /// from a named party needs a supplier.
    async fn resolve_party(
        &self,
        conn: &mut SqliteConnection,
        request: &SettlementRequest,
    ) -> DbResult<Party> {
        match request.bill_to {
            BillTo::Cash => {
                let id = &self.settings.walk_in_party_id;
                let party = party::fetch(conn, id)
                    .await?
                    .ok_or_else(|| CoreError::PartyNotFound(id.clone()))?;
                Ok(party)
            }
            BillTo::Party => {
                let id = request
                    .party_id
                    .as_deref()
                    .ok_or_else(|| ValidationError::Required {
                        field: "party id".to_string(),
                    })?;
                let party = party::fetch(conn, id)
                    .await?
                    .ok_or_else(|| CoreError::PartyNotFound(id.to_string()))?;

                if request.kind == InvoiceKind::Purchase && party.designation != Designation::Supplier
                {
                    return Err(CoreError::DesignationMismatch {
                        party_id: party.id,
                        expected: Designation::Supplier.to_string(),
                    }
                    .into());
                }

                Ok(party)
            }
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use shopdesk_core::{
        ErrorKind, InvoiceStatus, ItemRequest, NewProduct, NewStaffUser, PaymentInstruction,
        ProductUnit,
    };

    struct Fixture {
        db: Database,
        engine: SettlementEngine,
        product_id: String,
        staff_id: String,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = SettlementSettings::default();
        db.parties()
            .ensure_walk_in(&settings.walk_in_party_id)
            .await
            .unwrap();

        let product = db
            .products()
            .create(&NewProduct {
                name: "Notebook".to_string(),
                item_code: None,
                unit: ProductUnit::Pcs,
                purchase_price_cents: 6_000,
                sale_price_cents: 10_000,
                min_sale_price_cents: None,
                mrp_cents: None,
                sale_discount_bps: None,
                low_stock_threshold: Some(2),
                opening_stock: 10,
                track_inventory: true,
            })
            .await
            .unwrap();

        let staff = db
            .staff()
            .create(&NewStaffUser {
                name: "Ravi".to_string(),
                email: "ravi@shop.in".to_string(),
            })
            .await
            .unwrap();

        Fixture {
            engine: db.settlement(settings),
            db,
            product_id: product.id,
            staff_id: staff.id,
        }
    }

    fn sale(f: &Fixture, quantity: i64) -> SettlementRequest {
        SettlementRequest {
            kind: InvoiceKind::Sale,
            invoice_type: Default::default(),
            invoice_number: None,
            date: None,
            due_date: None,
            place_of_supply: None,
            bill_to: BillTo::Cash,
            party_id: None,
            items: vec![ItemRequest {
                product_id: f.product_id.clone(),
                quantity,
                unit_price_cents: None,
                discount_bps: None,
            }],
            discount_amount_cents: 0,
            payments: vec![],
            private_note: Some("  ".to_string()),
            party_note: None,
            delivery_term: None,
            staff_id: f.staff_id.clone(),
        }
    }

    #[tokio::test]
    async fn test_unpaid_cash_sale() {
        let f = fixture().await;
        let settled = f.engine.settle(sale(&f, 2)).await.unwrap();

        let invoice = &settled.invoice;
        assert_eq!(invoice.invoice_number, "INV-0001");
        assert_eq!(invoice.party_id, f.engine.settings().walk_in_party_id);
        assert_eq!(invoice.totals.total().paise(), 20_000);
        assert_eq!(invoice.totals.due().paise(), 20_000);
        assert_eq!(invoice.status(), InvoiceStatus::Unpaid);
        assert_eq!(invoice.private_note, None);
        assert!(settled.low_stock_product_ids.is_empty());

        let product = f.db.products().get_by_id(&f.product_id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 8);
    }

    #[tokio::test]
    async fn test_low_stock_is_reported() {
        let f = fixture().await;
        let settled = f.engine.settle(sale(&f, 8)).await.unwrap();
        assert_eq!(settled.low_stock_product_ids, vec![f.product_id.clone()]);
    }

    #[tokio::test]
    async fn test_missing_staff_is_not_found() {
        let f = fixture().await;
        let mut req = sale(&f, 1);
        req.staff_id = "nobody".to_string();

        let err = f.engine.settle(req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        // The reserved number went back with the rollback
        let settled = f.engine.settle(sale(&f, 1)).await.unwrap();
        assert_eq!(settled.invoice.invoice_number, "INV-0001");
    }

    #[tokio::test]
    async fn test_missing_account_rolls_back_stock() {
        let f = fixture().await;
        let mut req = sale(&f, 3);
        req.payments.push(PaymentInstruction {
            account_id: "no-such-account".to_string(),
            amount_cents: 100,
            reference: None,
        });

        let err = f.engine.settle(req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let product = f.db.products().get_by_id(&f.product_id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 10);
        assert!(f.db.products().invoice_refs(&f.product_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_io() {
        let f = fixture().await;
        let mut req = sale(&f, 1);
        req.items.clear();

        let err = f.engine.settle(req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert_eq!(f.db.invoices().count(InvoiceKind::Sale).await.unwrap(), 0);
    }
}
