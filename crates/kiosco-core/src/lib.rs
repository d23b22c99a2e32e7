//! # kiosco-core: Pure Business Logic for Kiosco POS
//!
//! Domain types and rules for the sale transaction lifecycle. Nothing in this
//! crate touches the database, the network or the file system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kiosco POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    REST API (apps/api)                          │   │
//! │  │    POST /sales, DELETE /sales/{id}, POST /products/{id}/stock   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 kiosco-db (Database Layer)                      │   │
//! │  │      Gate ──► Sale Coordinator ──► Stock Ledger ──► SQLite      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kiosco-core (THIS CRATE) ★                      │   │
//! │  │   types: Product, Sale, SaleLine, StockMovement, NewSale        │   │
//! │  │   money: Money (integer cents, exact decimal parsing)           │   │
//! │  │   validation: quantities, prices, dates, line sets              │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleLine, StockMovement)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use kiosco_core::money::Money;
//! use kiosco_core::types::{NewSale, NewSaleLine};
//!
//! let sale = NewSale::new("efectivo")
//!     .with_line(NewSaleLine::new("p1", 2, Money::from_cents(1000)))
//!     .with_line(NewSaleLine::new("p2", 1, Money::from_cents(500)));
//!
//! assert_eq!(sale.total(), Some(Money::from_cents(2500)));
//! ```

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum number of lines accepted in a single sale.
pub const MAX_SALE_LINES: usize = 100;

/// Payment method used when the caller does not send one.
pub const DEFAULT_PAYMENT_METHOD: &str = "efectivo";
