//! # Settlement Module
//!
//! Atomic settlement of sale and purchase invoices.
//!
//! - [`engine`] - [`SettlementEngine`], the transaction and its ordering
//! - [`resolver`] - pricing and stock movement per line
//! - [`allocator`] - payment routing to ledger accounts
//! - [`numbering`] - gapless invoice numbers
//! - [`error`] - [`SettlementError`], what callers see

pub mod allocator;
pub mod engine;
pub mod error;
pub mod numbering;
pub mod resolver;

pub use allocator::AllocatedPayments;
pub use engine::{SettledInvoice, SettlementEngine};
pub use error::{SettlementError, SettlementResult};
pub use resolver::ResolvedItems;
