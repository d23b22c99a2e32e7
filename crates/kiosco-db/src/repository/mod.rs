//! # Repository Module
//!
//! SQL for Kiosco POS lives here and nowhere else.
//!
//! ## Two Kinds of Access
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Pool-backed repositories (reads, catalog inserts)                      │
//! │  ├── ProductRepository::list / get_by_id / get_by_barcode / insert      │
//! │  └── SaleRepository::get_by_id / list_all / list_by_date / summary      │
//! │                                                                         │
//! │  Executor-generic functions (crate-private)                             │
//! │  ├── fetch_product, add_stock, remove_stock                            │
//! │  ├── insert_sale, insert_line, delete_sale, set_status                 │
//! │  └── insert_movement, list_movements                                   │
//! │       │                                                                 │
//! │       └── called by the ledger and the coordinator with the caller's   │
//! │           transaction, so every write lands in one commit/rollback      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Column Mapping
//! Money columns carry a `_cents` suffix in SQL and are aliased onto the
//! struct field (`price_cents AS price`) so `FromRow` decodes them into
//! [`Money`](kiosco_core::Money).

pub mod product;
pub mod sale;
pub mod stock;
