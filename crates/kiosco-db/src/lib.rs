//! # kiosco-db: Database Layer for Kiosco POS
//!
//! Database access, the stock ledger and the sale transaction protocol.
//! SQLite for storage, sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kiosco POS Data Flow                             │
//! │                                                                         │
//! │  HTTP handler (POST /sales)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    kiosco-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │SaleCoordinator│───►│ ConcurrencyGate│   │  Migrations  │  │   │
//! │  │   │  (sales.rs)   │    │   (gate.rs)    │   │  (embedded)  │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │ same transaction                                   │   │
//! │  │           ▼                                                     │   │
//! │  │   ┌───────────────┐    ┌───────────────┐                       │   │
//! │  │   │  StockLedger  │───►│ Repositories  │                       │   │
//! │  │   │  (ledger.rs)  │    │ product, sale,│                       │   │
//! │  │   └───────────────┘    │ stock         │                       │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`gate`] - Serializing admission for stock/sale writes
//! - [`ledger`] - Stock credits, debits and movement history
//! - [`sales`] - Sale creation, deletion, status and queries
//! - [`repository`] - SQL
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kiosco_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./kiosco.db")).await?;
//!
//! let sale = db.sales().create_sale(request).await?;
//! db.sales().delete_sale(&sale.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod gate;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod sales;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use gate::{ConcurrencyGate, GateGuard};
pub use ledger::{StockChange, StockLedger};
pub use pool::{Database, DbConfig};
pub use sales::SaleCoordinator;

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
