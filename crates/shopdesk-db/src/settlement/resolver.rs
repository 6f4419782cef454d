//! # Pricing & Stock Resolver
//!
//! Turns requested lines into frozen invoice items and moves stock.
//!
//! ```text
//! ItemRequest ──► product::fetch ──► price (override | catalog price)
//!                     │                   │
//!                     │                   ▼
//!                     │             line_total (bps, half-up)
//!                     ▼
//!       apply_stock_delta(∓qty) ──► record_invoice_ref
//! ```
//!
//! Stock is advisory unless `strict_stock` is on: a sale may drive a
//! tracked product negative, and the product is reported as low stock.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::product;
use shopdesk_core::invoice::line_total;
use shopdesk_core::{CoreError, InvoiceItem, InvoiceKind, ItemRequest, Money};

/// Output of [`resolve_items`].
#[derive(Debug, Clone)]
pub struct ResolvedItems {
    /// Frozen lines in request order.
    pub items: Vec<InvoiceItem>,

    /// Σ line totals, before the invoice-level discount.
    pub total: Money,

    /// Products at or below their low-stock threshold afterwards.
    pub low_stock_product_ids: Vec<String>,
}

/// Prices every line against the live catalog and applies stock deltas.
///
/// ## Errors
/// - `ProductNotFound` for a missing or deactivated product
/// - `InsufficientStock` for a sale beyond tracked stock when `strict_stock`
/// - `AmountOutOfRange` if a line or the running total overflows
pub(crate) async fn resolve_items(
    conn: &mut SqliteConnection,
    kind: InvoiceKind,
    requests: &[ItemRequest],
    invoice_id: &str,
    strict_stock: bool,
    now: DateTime<Utc>,
) -> DbResult<ResolvedItems> {
    let mut items = Vec::with_capacity(requests.len());
    let mut total = Money::zero();
    let mut low_stock_product_ids: Vec<String> = Vec::new();

    for (position, request) in requests.iter().enumerate() {
        let product = product::fetch(conn, &request.product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

        if kind == InvoiceKind::Sale && strict_stock && !product.can_fulfil(request.quantity) {
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock_quantity,
                requested: request.quantity,
            }
            .into());
        }

        let unit_price = request
            .unit_price_cents
            .map(Money::from_paise)
            .unwrap_or_else(|| product.price_for(kind));
        let discount_bps = request.discount_bps.unwrap_or(0);
        let line = line_total(request.quantity, unit_price, discount_bps)?;
        total = total
            .checked_add(line)
            .ok_or_else(|| CoreError::AmountOutOfRange("invoice total".to_string()))?;

        let delta = kind.stock_sign() * request.quantity;
        let level = product::apply_stock_delta(conn, &product.id, delta, now).await?;
        product::record_invoice_ref(conn, &product.id, invoice_id, kind, delta, now).await?;

        debug!(
            product_id = %product.id,
            quantity = request.quantity,
            line_total = line.paise(),
            stock = level,
            "Resolved line"
        );

        let threshold = product.low_stock_threshold.unwrap_or(0);
        let is_low = product.track_inventory && level <= threshold;
        if is_low && !low_stock_product_ids.contains(&product.id) {
            low_stock_product_ids.push(product.id.clone());
        } else if !is_low {
            low_stock_product_ids.retain(|id| id != &product.id);
        }

        items.push(InvoiceItem {
            id: Uuid::new_v4().to_string(),
            invoice_id: invoice_id.to_string(),
            position: position as i64,
            product_id: product.id,
            product_name: product.name,
            unit: product.unit,
            quantity: request.quantity,
            unit_price_cents: unit_price.paise(),
            discount_bps,
            line_total_cents: line.paise(),
        });
    }

    Ok(ResolvedItems {
        items,
        total,
        low_stock_product_ids,
    })
}
