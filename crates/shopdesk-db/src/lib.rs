//! # shopdesk-db: Database Layer and Settlement Engine
//!
//! SQLite persistence for Shopdesk, plus the engine that settles invoices
//! across those stores in one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopdesk Data Flow                               │
//! │                                                                         │
//! │  Route handler (POST /invoices)                                        │
//! │       │ SettlementRequest                                              │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   shopdesk-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  Settlement   │    │  Repositories │    │  Database    │  │   │
//! │  │   │               │    │               │    │  (pool.rs)   │  │   │
//! │  │   │ engine        │───►│ product       │───►│ SqlitePool   │  │   │
//! │  │   │ resolver      │    │ account       │    │ WAL, FKs     │  │   │
//! │  │   │ allocator     │    │ party, staff  │    │ migrations   │  │   │
//! │  │   │ numbering     │    │ invoice       │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/shopdesk/shopdesk.db (configurable)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - TOML + environment configuration
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`settlement`] - The settlement engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopdesk_db::{AppConfig, Database};
//!
//! let config = AppConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//! db.parties().ensure_walk_in(&config.settlement.walk_in_party_id).await?;
//!
//! let engine = db.settlement(config.settlement.clone());
//! let settled = engine.settle(request).await?;
//! println!("{} {}", settled.invoice.invoice_number, settled.invoice.status());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod settlement;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError, SettlementSettings};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    AccountRepository, InvoiceRepository, PartyRepository, ProductRepository, Reconciliation,
    StaffRepository,
};
pub use settlement::{SettledInvoice, SettlementEngine, SettlementError, SettlementResult};
