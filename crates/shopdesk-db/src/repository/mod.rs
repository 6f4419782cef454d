//! # Repository Module
//!
//! Database repository implementations for Shopdesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways In                                          │
//! │                                                                         │
//! │  Caller                                 SettlementEngine               │
//! │    │ db.products().get_by_id(id)          │ pool.begin()               │
//! │    ▼                                      ▼                            │
//! │  ProductRepository (pool)             product::fetch(&mut tx, id)      │
//! │    │                                  product::apply_stock_delta(..)   │
//! │    │                                      │                            │
//! │    └──────────────┬───────────────────────┘                            │
//! │                   ▼                                                     │
//! │         same SQL, one place per table                                  │
//! │                                                                         │
//! │  Repository methods run on the pool. The crate-private functions       │
//! │  take `&mut SqliteConnection` so the engine can run them all inside    │
//! │  one transaction.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Catalog, pricing patches, stock
//! - [`AccountRepository`] - Ledger accounts and transaction log
//! - [`PartyRepository`] - Customers, suppliers, walk-in party
//! - [`StaffRepository`] - Staff users
//! - [`InvoiceRepository`] - Settled invoices (read side)

pub mod account;
pub mod invoice;
pub mod party;
pub mod product;
pub mod staff;

pub use account::{AccountRepository, Reconciliation};
pub use invoice::InvoiceRepository;
pub use party::PartyRepository;
pub use product::ProductRepository;
pub use staff::StaffRepository;

/// `%query%` for `LIKE ?1 ESCAPE '\'`, lower-cased, with the query's own
/// wildcards escaped.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Tumbler"), "%tumbler%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
