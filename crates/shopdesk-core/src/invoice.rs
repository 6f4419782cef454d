//! # Invoice Module
//!
//! Invoice records, derived monetary fields and number formatting.
//!
//! ## Derived Fields
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Invoice Totals                                      │
//! │                                                                         │
//! │  line_total     = qty × unit_price − round_half_up(qty × unit × bps)   │
//! │  total          = Σ line_total                                         │
//! │  total_payable  = total − discount                                     │
//! │  due            = total_payable − received                             │
//! │                                                                         │
//! │  status:  due == 0              → Paid                                 │
//! │           received > 0, due ≠ 0 → Partially Paid                       │
//! │           otherwise             → Unpaid                               │
//! │                                                                         │
//! │  `InvoiceTotals` stores only (total, discount, received). Everything   │
//! │  else, status included, is recomputed on read, so no code path can    │
//! │  persist a status that disagrees with the amounts.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::ProductUnit;
use crate::MAX_INVOICE_SEQUENCE;

// =============================================================================
// Enums
// =============================================================================

/// Direction of an invoice: goods out (sale) or goods in (purchase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InvoiceKind {
    #[default]
    Sale,
    Purchase,
}

impl InvoiceKind {
    /// Prefix used when no prefix is configured.
    pub const fn default_prefix(&self) -> &'static str {
        match self {
            InvoiceKind::Sale => "INV",
            InvoiceKind::Purchase => "PINV",
        }
    }

    /// The other invoice kind, whose number sequence this one must not touch.
    pub const fn counterpart(&self) -> InvoiceKind {
        match self {
            InvoiceKind::Sale => InvoiceKind::Purchase,
            InvoiceKind::Purchase => InvoiceKind::Sale,
        }
    }

    /// Sign applied to line quantities when moving stock.
    pub const fn stock_sign(&self) -> i64 {
        match self {
            InvoiceKind::Sale => -1,
            InvoiceKind::Purchase => 1,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceKind::Sale => "sale",
            InvoiceKind::Purchase => "purchase",
        }
    }
}

impl std::fmt::Display for InvoiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tax treatment of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum InvoiceType {
    #[default]
    NonGst,
    Gst,
    BillOfSupply,
}

/// Who the invoice is billed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum BillTo {
    /// Walk-in counter sale, booked against the configured walk-in party.
    #[default]
    Cash,
    /// A named customer or supplier.
    Party,
}

/// Payment status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
pub enum InvoiceStatus {
    Paid,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    Unpaid,
}

impl InvoiceStatus {
    /// Status as a pure function of the received and due amounts.
    pub fn from_amounts(received: Money, due: Money) -> Self {
        if due.is_zero() {
            InvoiceStatus::Paid
        } else if received.is_positive() {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Unpaid
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Paid => write!(f, "Paid"),
            InvoiceStatus::PartiallyPaid => write!(f, "Partially Paid"),
            InvoiceStatus::Unpaid => write!(f, "Unpaid"),
        }
    }
}

// =============================================================================
// Line Math
// =============================================================================

/// Computes a line total: `quantity × unit_price` less the basis-point
/// discount, rounded half-up to the paisa.
///
/// ## Errors
/// - `AmountOutOfRange` if `quantity × unit_price` overflows
///
/// ## Example
/// ```rust
/// use shopdesk_core::invoice::line_total;
/// use shopdesk_core::money::Money;
///
/// // 3 × ₹33.33 at 10% off = 9999 − 1000 = 8999 paise
/// assert_eq!(line_total(3, Money::from_paise(3333), 1000).unwrap().paise(), 8999);
/// ```
pub fn line_total(quantity: i64, unit_price: Money, discount_bps: u32) -> CoreResult<Money> {
    let gross = unit_price
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| CoreError::AmountOutOfRange("line total".to_string()))?;

    Ok(gross.apply_percentage_discount(discount_bps))
}

// =============================================================================
// Invoice Totals
// =============================================================================

/// The monetary summary of an invoice.
///
/// Fields are private; the only constructor is [`InvoiceTotals::compute`]
/// (plus the database row mapping, which reads the same three inputs back).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceTotals {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_amount_cents"))]
    total: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "discount_amount_cents"))]
    discount: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "received_amount_cents"))]
    received: i64,
}

impl InvoiceTotals {
    /// Builds the totals from the pre-discount total, the invoice-level
    /// discount and the amount received.
    ///
    /// ## Errors
    /// - `DiscountExceedsTotal` if the discount is negative or larger than
    ///   the total
    pub fn compute(total: Money, discount: Money, received: Money) -> CoreResult<Self> {
        if discount.is_negative() || discount > total {
            return Err(CoreError::DiscountExceedsTotal {
                discount_cents: discount.paise(),
                total_cents: total.paise(),
            });
        }

        Ok(InvoiceTotals {
            total: total.paise(),
            discount: discount.paise(),
            received: received.paise(),
        })
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_paise(self.discount)
    }

    /// `total − discount`
    #[inline]
    pub fn total_payable(&self) -> Money {
        Money::from_paise(self.total - self.discount)
    }

    #[inline]
    pub fn received(&self) -> Money {
        Money::from_paise(self.received)
    }

    /// `total_payable − received`. Negative means overpayment.
    #[inline]
    pub fn due(&self) -> Money {
        self.total_payable() - self.received()
    }

    pub fn status(&self) -> InvoiceStatus {
        InvoiceStatus::from_amounts(self.received(), self.due())
    }
}

impl Serialize for InvoiceTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("InvoiceTotals", 6)?;
        state.serialize_field("totalAmount", &self.total())?;
        state.serialize_field("discountAmount", &self.discount())?;
        state.serialize_field("totalPayableAmount", &self.total_payable())?;
        state.serialize_field("receivedAmount", &self.received())?;
        state.serialize_field("dueAmount", &self.due())?;
        state.serialize_field("status", &self.status())?;
        state.end()
    }
}

// =============================================================================
// Invoice Numbering
// =============================================================================

/// Formats a sequence value as `{prefix}-{n:04}`.
///
/// ## Example
/// ```rust
/// use shopdesk_core::invoice::format_invoice_number;
///
/// assert_eq!(format_invoice_number("INV", 1), "INV-0001");
/// assert_eq!(format_invoice_number("PINV", 12345), "PINV-12345");
/// ```
pub fn format_invoice_number(prefix: &str, n: i64) -> String {
    format!("{}-{:04}", prefix, n)
}

fn sequence_digits<'a>(prefix: &str, number: &'a str) -> Option<&'a str> {
    let digits = number.strip_prefix(prefix)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

/// True if `number` has the `{prefix}-{digits}` form, whatever its value.
pub fn is_in_sequence(prefix: &str, number: &str) -> bool {
    sequence_digits(prefix, number).is_some()
}

/// Extracts the sequence value from a number in `{prefix}-{digits}` form.
///
/// Returns `None` for anything else, including numbers with another prefix
/// and values that do not fit in `i64`.
pub fn parse_invoice_number(prefix: &str, number: &str) -> Option<i64> {
    sequence_digits(prefix, number)?.parse().ok()
}

/// The sequence value a caller-supplied number claims under `prefix`.
///
/// `Ok(None)` for numbers outside the `{prefix}-{digits}` form.
///
/// ## Errors
/// - `Validation(OutOfRange)` above [`MAX_INVOICE_SEQUENCE`]
///
/// ## Example
/// ```rust
/// use shopdesk_core::invoice::claimed_sequence;
///
/// assert_eq!(claimed_sequence("INV", "INV-0041").unwrap(), Some(41));
/// assert_eq!(claimed_sequence("INV", "2024/INV/7").unwrap(), None);
/// assert!(claimed_sequence("INV", "INV-9223372036854775807").is_err());
/// ```
pub fn claimed_sequence(prefix: &str, number: &str) -> CoreResult<Option<i64>> {
    let digits = match sequence_digits(prefix, number) {
        Some(digits) => digits,
        None => return Ok(None),
    };

    match digits.parse::<i64>() {
        Ok(value) if value <= MAX_INVOICE_SEQUENCE => Ok(Some(value)),
        _ => Err(ValidationError::OutOfRange {
            field: "invoice number".to_string(),
            min: 0,
            max: MAX_INVOICE_SEQUENCE,
        }
        .into()),
    }
}

// =============================================================================
// Invoice Records
// =============================================================================

/// A frozen line on a settled invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    /// Zero-based position in the request.
    pub position: i64,
    pub product_id: String,
    /// Product name at settlement time.
    pub product_name: String,
    pub unit: ProductUnit,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_bps: u32,
    pub line_total_cents: i64,
}

/// A payment snapshot on a settled invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoicePayment {
    pub id: String,
    pub invoice_id: String,
    pub account_id: String,
    /// Account name at settlement time.
    pub method: String,
    pub amount_cents: i64,
    pub reference: Option<String>,
}

/// A settled sale or purchase invoice.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub kind: InvoiceKind,
    pub invoice_type: InvoiceType,
    pub date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub place_of_supply: Option<String>,
    pub bill_to: BillTo,
    pub party_id: String,
    pub staff_id: String,

    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub totals: InvoiceTotals,

    pub private_note: Option<String>,
    pub party_note: Option<String>,
    pub delivery_term: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<InvoiceItem>,

    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub payments: Vec<InvoicePayment>,
}

impl Invoice {
    #[inline]
    pub fn status(&self) -> InvoiceStatus {
        self.totals.status()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
