//! # Domain Types
//!
//! Core domain types used throughout Kiosco POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  barcode        │   │  sale_date      │   │  sale_id (FK)   │       │
//! │  │  price          │   │  total_amount   │   │  product_id     │       │
//! │  │  stock (≥ 0)    │   │  invoice_state  │   │  unit_price     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ StockMovement   │   │  InvoiceState   │   │  MovementType   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  append-only    │   │  Pendiente      │   │  Ingreso (+)    │       │
//! │  │  audit record   │   │  Facturado      │   │  Salida  (-)    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Snapshot
//! A `SaleLine` stores the unit price the caller charged, not a reference to
//! the catalog price. Changing a product's price later never rewrites the
//! totals of past sales.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::DEFAULT_PAYMENT_METHOD;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// `stock` is only ever changed through the stock ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier.
    pub name: String,

    /// Barcode (EAN-13, UPC-A, etc.). Unique when present.
    pub barcode: Option<String>,

    /// Current catalog price.
    #[ts(type = "number")]
    pub price: Money,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub category: Option<String>,

    /// Reference to the product image in object storage.
    pub image_url: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether `quantity` units can be taken from stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }
}

/// Input for adding a product to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub barcode: Option<String>,
    #[ts(type = "number")]
    pub price: Money,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Inbound: restock, sale reversal.
    Ingreso,
    /// Outbound: sale.
    Salida,
}

impl MovementType {
    /// Database / wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Ingreso => "ingreso",
            MovementType::Salida => "salida",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable audit record of a stock change.
///
/// Exactly one movement exists for every stock mutation, written in the same
/// transaction as the mutation itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: MovementType,
    /// Always positive; the direction is given by `movement_type`.
    pub quantity: i64,
    /// Who triggered the change, when known.
    pub user_id: Option<String>,
    /// Supplier reference (inbound only).
    pub provider_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Invoice State
// =============================================================================

/// Whether a sale has been turned into a fiscal invoice.
///
/// ## State Machine
/// ```text
/// ┌───────────┐   invoice issued   ┌───────────┐
/// │ Pendiente │ ─────────────────► │ Facturado │
/// └───────────┘                    └───────────┘
///       (no transition back)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceState {
    /// Initial state of every sale.
    #[default]
    Pendiente,
    /// An invoice was issued for the sale.
    Facturado,
}

impl InvoiceState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceState::Pendiente => "pendiente",
            InvoiceState::Facturado => "facturado",
        }
    }

    /// Checks if moving to `next` is allowed.
    ///
    /// Staying in the same state is allowed (setting a ticket URL on an
    /// already invoiced sale is not a transition).
    pub const fn can_transition_to(&self, next: InvoiceState) -> bool {
        matches!(
            (self, next),
            (InvoiceState::Pendiente, _) | (InvoiceState::Facturado, InvoiceState::Facturado)
        )
    }
}

impl fmt::Display for InvoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale transaction (header).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,

    /// When the sale happened. Defaults to creation time.
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,

    /// Sum of line subtotals, computed by the server.
    #[ts(type = "number")]
    pub total_amount: Money,

    /// Free-form payment method ("efectivo", "tarjeta", ...).
    pub payment_method: String,

    /// Receipt reference in object storage.
    pub ticket_url: Option<String>,

    pub invoice_state: InvoiceState,
}

impl Sale {
    #[inline]
    pub fn is_invoiced(&self) -> bool {
        self.invoice_state == InvoiceState::Facturado
    }
}

/// One product-quantity-price entry of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Price charged per unit at sale time.
    #[ts(type = "number")]
    pub unit_price: Money,
}

impl SaleLine {
    /// `quantity × unit_price`, or `None` on overflow.
    #[inline]
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_price.checked_mul_quantity(self.quantity)
    }
}

/// A sale together with its lines, as returned by `GET /sales/{id}/complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithLines {
    pub sale: Sale,
    pub products: Vec<SaleLine>,
    /// Sum of line quantities.
    pub total_items: i64,
}

impl SaleWithLines {
    pub fn new(sale: Sale, products: Vec<SaleLine>) -> Self {
        let total_items = products.iter().map(|line| line.quantity).sum();
        Self {
            sale,
            products,
            total_items,
        }
    }

    /// Recomputes the total from the lines, or `None` on overflow.
    pub fn lines_total(&self) -> Option<Money> {
        self.products.iter().try_fold(Money::zero(), |acc, line| {
            line.subtotal().and_then(|subtotal| acc.checked_add(subtotal))
        })
    }
}

// =============================================================================
// Sale Input
// =============================================================================

/// A line of a sale request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: i64,
    #[ts(type = "number")]
    pub unit_price: Money,
}

impl NewSaleLine {
    pub fn new(product_id: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }
}

/// A request to create a sale.
///
/// The total is never part of the request; it is computed from the lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub ticket_url: Option<String>,
    /// Actor recorded on the stock movements of this sale.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Lines in the order the cashier entered them.
    #[serde(rename = "products")]
    pub lines: Vec<NewSaleLine>,
}

fn default_payment_method() -> String {
    DEFAULT_PAYMENT_METHOD.to_string()
}

impl NewSale {
    pub fn new(payment_method: impl Into<String>) -> Self {
        Self {
            payment_method: payment_method.into(),
            ticket_url: None,
            user_id: None,
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: NewSaleLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn with_ticket_url(mut self, url: impl Into<String>) -> Self {
        self.ticket_url = Some(url.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Σ quantity × unit_price, or `None` on overflow.
    pub fn total(&self) -> Option<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, line| {
            line.unit_price
                .checked_mul_quantity(line.quantity)
                .and_then(|subtotal| acc.checked_add(subtotal))
        })
    }
}

/// Changes to a sale's receipt / invoice information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleStatusUpdate {
    #[serde(default)]
    pub invoice_state: Option<InvoiceState>,
    #[serde(default)]
    pub ticket_url: Option<String>,
}

impl SaleStatusUpdate {
    pub fn is_empty(&self) -> bool {
        self.invoice_state.is_none() && self.ticket_url.is_none()
    }
}

// =============================================================================
// Daily Summary
// =============================================================================

/// Aggregate of one day's sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_sales: i64,
    #[ts(type = "number")]
    pub total_revenue: Money,
    /// Mean sale amount, rounded to the cent.
    #[ts(type = "number")]
    pub average_sale: Money,
}

impl DailySummary {
    /// A day without sales.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_sales: 0,
            total_revenue: Money::zero(),
            average_sale: Money::zero(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(sale_id: &str, qty: i64, price: i64) -> SaleLine {
        SaleLine {
            id: format!("l-{qty}-{price}"),
            sale_id: sale_id.to_string(),
            product_id: "p".to_string(),
            quantity: qty,
            unit_price: Money::from_cents(price),
        }
    }

    fn sale(total: i64) -> Sale {
        Sale {
            id: "s-1".to_string(),
            sale_date: Utc::now(),
            total_amount: Money::from_cents(total),
            payment_method: "efectivo".to_string(),
            ticket_url: None,
            invoice_state: InvoiceState::Pendiente,
        }
    }

    #[test]
    fn test_invoice_state_transitions() {
        assert!(InvoiceState::Pendiente.can_transition_to(InvoiceState::Facturado));
        assert!(InvoiceState::Pendiente.can_transition_to(InvoiceState::Pendiente));
        assert!(InvoiceState::Facturado.can_transition_to(InvoiceState::Facturado));
        assert!(!InvoiceState::Facturado.can_transition_to(InvoiceState::Pendiente));
    }

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(
            serde_json::to_string(&InvoiceState::Facturado).unwrap(),
            "\"facturado\""
        );
        assert_eq!(
            serde_json::from_str::<MovementType>("\"salida\"").unwrap(),
            MovementType::Salida
        );
        assert_eq!(InvoiceState::default(), InvoiceState::Pendiente);
    }

    #[test]
    fn test_new_sale_total() {
        let sale = NewSale::new("efectivo")
            .with_line(NewSaleLine::new("p1", 2, Money::from_cents(1000)))
            .with_line(NewSaleLine::new("p2", 1, Money::from_cents(500)));
        assert_eq!(sale.total(), Some(Money::from_cents(2500)));

        let overflow =
            NewSale::new("efectivo").with_line(NewSaleLine::new("p1", 2, Money::from_cents(i64::MAX)));
        assert_eq!(overflow.total(), None);
    }

    #[test]
    fn test_new_sale_json_uses_products_key() {
        let json = r#"{
            "payment_method": "tarjeta",
            "products": [{"product_id": "p1", "quantity": 2, "unit_price": 10.0}]
        }"#;
        let sale: NewSale = serde_json::from_str(json).unwrap();
        assert_eq!(sale.lines.len(), 1);
        assert_eq!(sale.lines[0].unit_price.cents(), 1000);
        assert!(sale.ticket_url.is_none());
    }

    #[test]
    fn test_new_sale_payment_method_defaults_to_cash() {
        let json = r#"{"products": [{"product_id": "p1", "quantity": 1, "unit_price": 5}]}"#;
        let sale: NewSale = serde_json::from_str(json).unwrap();
        assert_eq!(sale.payment_method, DEFAULT_PAYMENT_METHOD);
    }

    #[test]
    fn test_sale_with_lines_counts_items() {
        let view = SaleWithLines::new(sale(2500), vec![line("s-1", 2, 1000), line("s-1", 1, 500)]);
        assert_eq!(view.total_items, 3);
        assert_eq!(view.lines_total(), Some(view.sale.total_amount));
    }

    #[test]
    fn test_line_subtotal_overflow() {
        let huge = line("s-1", 3, i64::MAX / 2);
        assert_eq!(huge.subtotal(), None);
        assert_eq!(line("s-1", 3, 250).subtotal(), Some(Money::from_cents(750)));

        let view = SaleWithLines::new(sale(0), vec![line("s-1", 1, i64::MAX), line("s-1", 1, 1)]);
        assert_eq!(view.lines_total(), None);
    }

    #[test]
    fn test_empty_status_update() {
        assert!(SaleStatusUpdate::default().is_empty());
        let update = SaleStatusUpdate {
            invoice_state: Some(InvoiceState::Facturado),
            ticket_url: None,
        };
        assert!(!update.is_empty());
    }

    proptest! {
        #[test]
        fn prop_total_matches_line_subtotals(
            lines in prop::collection::vec((1i64..=999, 0i64..=1_000_000), 1..20)
        ) {
            let request = lines.iter().enumerate().fold(NewSale::new("efectivo"), |sale, (i, (qty, price))| {
                sale.with_line(NewSaleLine::new(format!("p{i}"), *qty, Money::from_cents(*price)))
            });
            let expected: i64 = lines.iter().map(|(qty, price)| qty * price).sum();
            prop_assert_eq!(request.total(), Some(Money::from_cents(expected)));
        }
    }
}
