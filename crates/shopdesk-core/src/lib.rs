//! # shopdesk-core: Pure Business Logic for Shopdesk
//!
//! Domain types and the arithmetic of invoice settlement, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopdesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Callers (route handlers, import jobs)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ SettlementRequest                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                shopdesk-db (SettlementEngine)                   │   │
//! │  │        one SQLite transaction per settlement, repositories      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopdesk-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  invoice  │  │ settlement│  │   │
//! │  │   │  Product  │  │   Money   │  │  Totals   │  │  Request  │  │   │
//! │  │   │  Account  │  │   bps     │  │  Status   │  │ validate  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Long-lived entities (Product, Account, Party, StaffUser)
//! - [`money`] - Money type with integer arithmetic
//! - [`invoice`] - Invoice records, totals, status, numbering format
//! - [`settlement`] - Settlement request and its validation
//! - [`error`] - Error kinds and domain errors
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use shopdesk_core::invoice::{line_total, InvoiceStatus, InvoiceTotals};
//! use shopdesk_core::money::Money;
//!
//! let total = line_total(2, Money::from_paise(10_000), 0).unwrap();
//! let totals = InvoiceTotals::compute(total, Money::zero(), Money::from_paise(5_000)).unwrap();
//!
//! assert_eq!(totals.due().paise(), 15_000);
//! assert_eq!(totals.status(), InvoiceStatus::PartiallyPaid);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod money;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use invoice::{
    BillTo, Invoice, InvoiceItem, InvoiceKind, InvoicePayment, InvoiceStatus, InvoiceTotals,
    InvoiceType,
};
pub use money::Money;
pub use settlement::{ItemRequest, PaymentInstruction, SettlementRequest};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items on a single invoice.
pub const MAX_INVOICE_ITEMS: usize = 500;

/// Maximum quantity on a single line.
///
/// Catches typos like 10000 for 100 before stock is touched.
pub const MAX_ITEM_QUANTITY: i64 = 100_000;

/// Maximum unit price, catalog or override, in paise (₹1 crore).
///
/// Bounds `quantity × price` across a full invoice well inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Maximum single payment in paise (₹100 crore).
pub const MAX_PAYMENT_CENTS: i64 = 100_000_000_000;

/// Highest sequence value a supplied invoice number may claim.
///
/// Leaves the counter room to keep incrementing.
pub const MAX_INVOICE_SEQUENCE: i64 = 1_000_000_000_000;

/// Maximum length of free-text invoice notes.
pub const MAX_NOTE_LENGTH: usize = 500;
