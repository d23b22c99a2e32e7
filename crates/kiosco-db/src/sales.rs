//! # Sale Transaction Coordinator
//!
//! Creates and deletes sales as atomic, stock-consistent operations, and
//! serves the sale queries.
//!
//! ## Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate request (no I/O)           EmptyLineSet / InvalidQuantity    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  acquire gate ──────────────────────────────────────────────┐          │
//! │       │                                                      │          │
//! │       ▼                                                      │          │
//! │  BEGIN                                                       │          │
//! │  ├── resolve products, stock >= Σ requested per product      │  gate    │
//! │  │                      ProductNotFound / InsufficientStock  │  held    │
//! │  ├── total = Σ quantity × unit_price (caller's prices)       │          │
//! │  ├── INSERT sale (pendiente), INSERT lines                   │          │
//! │  ├── ledger.debit per line ("Venta <id>")                    │          │
//! │  └── re-read sale                                            │          │
//! │  COMMIT  (any error above → ROLLBACK, nothing visible)       │          │
//! │       │                                                      │          │
//! │  release gate ◄──────────────────────────────────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Delete
//! Gate, BEGIN, look up the sale, credit every line back ("Reversión venta
//! <id>"), delete the header (lines cascade), COMMIT. Invoiced sales are not
//! deletable.
//!
//! ## Queries
//! Reads skip the gate and see committed data only.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{DbError, ServiceResult};
use crate::gate::GateGuard;
use crate::ledger::{StockChange, StockLedger};
use crate::pool::begin_immediate;
use crate::repository::product::fetch_product;
use crate::repository::sale::{self as sale_repo, SaleRepository};
use kiosco_core::validation::{requested_quantities, validate_new_sale, validate_ticket_url};
use kiosco_core::{
    CoreError, DailySummary, InvoiceState, NewSale, Sale, SaleLine, SaleStatusUpdate,
    SaleWithLines, ValidationError,
};

/// Note written on the movements of a sale.
fn sale_note(sale_id: &str) -> String {
    format!("Venta {sale_id}")
}

/// Note written on the movements that undo a sale.
fn reversal_note(sale_id: &str) -> String {
    format!("Reversión venta {sale_id}")
}

/// Orchestrates sale creation, deletion and status changes.
///
/// Obtained from [`Database::sales`](crate::Database::sales); shares the
/// database's gate through its ledger.
#[derive(Debug, Clone)]
pub struct SaleCoordinator {
    pool: SqlitePool,
    ledger: StockLedger,
    sales: SaleRepository,
}

impl SaleCoordinator {
    pub fn new(pool: SqlitePool, ledger: StockLedger) -> Self {
        SaleCoordinator {
            sales: SaleRepository::new(pool.clone()),
            pool,
            ledger,
        }
    }

    // =========================================================================
    // Mutations (gated)
    // =========================================================================

    /// Creates a sale with its lines and debits the stock, all or nothing.
    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn create_sale(&self, request: NewSale) -> ServiceResult<Sale> {
        validate_new_sale(&request)?;
        let guard = self.ledger.gate().acquire("create_sale").await;
        self.create_sale_admitted(&guard, &request).await
    }

    /// [`create_sale`](Self::create_sale) for a caller already holding the
    /// gate.
    pub async fn create_sale_admitted(
        &self,
        guard: &GateGuard<'_>,
        request: &NewSale,
    ) -> ServiceResult<Sale> {
        validate_new_sale(request)?;

        let mut tx = begin_immediate(&self.pool).await?;
        match self.write_sale(guard, &mut tx, request).await {
            Ok(sale) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                info!(
                    sale_id = %sale.id,
                    total = %sale.total_amount,
                    lines = request.lines.len(),
                    "Sale created"
                );
                Ok(sale)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed sale also failed");
                }
                warn!(error = %err, "Sale rejected, nothing written");
                Err(err)
            }
        }
    }

    async fn write_sale(
        &self,
        guard: &GateGuard<'_>,
        conn: &mut SqliteConnection,
        request: &NewSale,
    ) -> ServiceResult<Sale> {
        // Every product must exist and cover the sum of its lines before
        // anything is written.
        for (product_id, requested) in requested_quantities(request) {
            let product = fetch_product(&mut *conn, product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
            if product.stock < requested {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id,
                    name: product.name,
                    available: product.stock,
                    requested,
                }
                .into());
            }
        }

        let total_amount = request.total().ok_or_else(|| ValidationError::OutOfRange {
            field: "total_amount".to_string(),
            min: 0,
            max: i64::MAX,
        })?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            sale_date: Utc::now(),
            total_amount,
            payment_method: request.payment_method.trim().to_string(),
            ticket_url: request.ticket_url.clone(),
            invoice_state: InvoiceState::Pendiente,
        };
        sale_repo::insert_sale(&mut *conn, &sale).await?;

        for (position, line) in request.lines.iter().enumerate() {
            let row = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            };
            sale_repo::insert_line(&mut *conn, &row, position as i64).await?;
        }

        let note = sale_note(&sale.id);
        for line in &request.lines {
            let change = StockChange::new(&line.product_id, line.quantity)
                .by_user(request.user_id.clone())
                .with_note(note.as_str());
            self.ledger.debit(guard, &mut *conn, &change).await?;
        }

        let persisted = sale_repo::fetch_sale(&mut *conn, &sale.id)
            .await?
            .ok_or_else(|| DbError::Internal(format!("sale {} vanished before commit", sale.id)))?;
        Ok(persisted)
    }

    /// Deletes a sale and puts its full quantities back in stock.
    ///
    /// Returns the sale as it was before deletion.
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, sale_id: &str) -> ServiceResult<SaleWithLines> {
        let guard = self.ledger.gate().acquire("delete_sale").await;
        self.delete_sale_admitted(&guard, sale_id).await
    }

    /// [`delete_sale`](Self::delete_sale) for a caller already holding the
    /// gate.
    pub async fn delete_sale_admitted(
        &self,
        guard: &GateGuard<'_>,
        sale_id: &str,
    ) -> ServiceResult<SaleWithLines> {
        let mut tx = begin_immediate(&self.pool).await?;
        match self.reverse_sale(guard, &mut tx, sale_id).await {
            Ok(removed) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                info!(
                    sale_id,
                    items = removed.total_items,
                    "Sale deleted, stock restored"
                );
                Ok(removed)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed deletion also failed");
                }
                warn!(sale_id, error = %err, "Sale deletion rejected");
                Err(err)
            }
        }
    }

    async fn reverse_sale(
        &self,
        guard: &GateGuard<'_>,
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> ServiceResult<SaleWithLines> {
        let sale = sale_repo::fetch_sale(&mut *conn, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        if sale.is_invoiced() {
            return Err(CoreError::SaleAlreadyInvoiced(sale.id).into());
        }

        let lines = sale_repo::fetch_lines(&mut *conn, sale_id).await?;
        let note = reversal_note(sale_id);
        for line in &lines {
            let change = StockChange::new(&line.product_id, line.quantity).with_note(note.as_str());
            self.ledger.credit(guard, &mut *conn, &change).await?;
        }

        if sale_repo::delete_sale(&mut *conn, sale_id).await? == 0 {
            return Err(CoreError::SaleNotFound(sale_id.to_string()).into());
        }

        Ok(SaleWithLines::new(sale, lines))
    }

    /// Sets the ticket URL and/or advances the invoice state.
    ///
    /// `facturado → pendiente` is rejected.
    #[instrument(skip(self, update))]
    pub async fn update_status(
        &self,
        sale_id: &str,
        update: SaleStatusUpdate,
    ) -> ServiceResult<Sale> {
        validate_ticket_url(update.ticket_url.as_deref())?;
        let _guard = self.ledger.gate().acquire("update_sale_status").await;

        let mut tx = begin_immediate(&self.pool).await?;
        let sale = sale_repo::fetch_sale(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if let Some(next) = update.invoice_state {
            if !sale.invoice_state.can_transition_to(next) {
                warn!(sale_id, from = %sale.invoice_state, to = %next, "Invoice transition rejected");
                return Err(CoreError::InvalidInvoiceTransition {
                    sale_id: sale.id,
                    from: sale.invoice_state,
                    to: next,
                }
                .into());
            }
        }

        if update.is_empty() {
            return Ok(sale);
        }

        sale_repo::set_status(
            &mut *tx,
            sale_id,
            update.invoice_state,
            update.ticket_url.as_deref(),
        )
        .await?;
        let updated = sale_repo::fetch_sale(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(sale_id, invoice_state = %updated.invoice_state, "Sale status updated");
        Ok(updated)
    }

    /// Marks a sale as invoiced, optionally attaching the receipt.
    pub async fn mark_invoiced(
        &self,
        sale_id: &str,
        ticket_url: Option<String>,
    ) -> ServiceResult<Sale> {
        self.update_status(
            sale_id,
            SaleStatusUpdate {
                invoice_state: Some(InvoiceState::Facturado),
                ticket_url,
            },
        )
        .await
    }

    // =========================================================================
    // Queries (no gate)
    // =========================================================================

    /// Gets a sale header.
    pub async fn get(&self, sale_id: &str) -> ServiceResult<Sale> {
        self.sales
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Gets a sale with its lines and item count.
    pub async fn get_with_lines(&self, sale_id: &str) -> ServiceResult<SaleWithLines> {
        let sale = self.get(sale_id).await?;
        let lines = self.sales.lines(sale_id).await?;
        Ok(SaleWithLines::new(sale, lines))
    }

    /// All sales, newest first.
    pub async fn list(&self) -> ServiceResult<Vec<Sale>> {
        Ok(self.sales.list_all().await?)
    }

    /// Sales of one day, newest first.
    pub async fn list_by_date(&self, date: NaiveDate) -> ServiceResult<Vec<Sale>> {
        Ok(self.sales.list_by_date(date).await?)
    }

    /// Count, revenue and average sale of one day.
    pub async fn daily_summary(&self, date: NaiveDate) -> ServiceResult<DailySummary> {
        Ok(self.sales.daily_summary(date).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::{Database, DbConfig};
    use kiosco_core::{Money, MovementType, NewProduct, NewSaleLine, Product, StockMovement};
    use proptest::prelude::*;

    async fn product_with_stock(db: &Database, name: &str, stock: i64) -> Product {
        let product = db
            .products()
            .insert(&NewProduct {
                name: name.to_string(),
                barcode: None,
                price: Money::from_cents(1000),
                category: None,
                image_url: None,
            })
            .await
            .unwrap();
        if stock > 0 {
            db.stock_ledger()
                .restock(StockChange::new(&product.id, stock))
                .await
                .unwrap();
        }
        product
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    async fn sale_movements(db: &Database, product_id: &str) -> Vec<StockMovement> {
        db.stock_ledger()
            .history(product_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.notes.is_some())
            .collect()
    }

    fn count_rows(table: &'static str) -> String {
        format!("SELECT COUNT(*) FROM {table}")
    }

    async fn rows(db: &Database, table: &'static str) -> i64 {
        sqlx::query_scalar(&count_rows(table))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_sale_conserves_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p1 = product_with_stock(&db, "Alfajor", 5).await;
        let p2 = product_with_stock(&db, "Chicle", 3).await;

        let sale = db
            .sales()
            .create_sale(
                NewSale::new("efectivo")
                    .with_line(NewSaleLine::new(&p1.id, 2, Money::from_cents(1000)))
                    .with_line(NewSaleLine::new(&p2.id, 1, Money::from_cents(500))),
            )
            .await
            .unwrap();

        assert_eq!(sale.total_amount, Money::from_cents(2500));
        assert_eq!(sale.invoice_state, InvoiceState::Pendiente);
        assert_eq!(stock_of(&db, &p1.id).await, 3);
        assert_eq!(stock_of(&db, &p2.id).await, 2);

        let m1 = sale_movements(&db, &p1.id).await;
        let m2 = sale_movements(&db, &p2.id).await;
        assert_eq!(m1.len(), 1);
        assert_eq!(m2.len(), 1);
        assert_eq!((m1[0].movement_type, m1[0].quantity), (MovementType::Salida, 2));
        assert_eq!((m2[0].movement_type, m2[0].quantity), (MovementType::Salida, 1));
        assert_eq!(m1[0].notes.as_deref(), Some(sale_note(&sale.id).as_str()));

        let complete = db.sales().get_with_lines(&sale.id).await.unwrap();
        assert_eq!(complete.total_items, 3);
        assert_eq!(complete.products[0].product_id, p1.id);
        assert_eq!(complete.lines_total(), Some(sale.total_amount));
    }

    #[tokio::test]
    async fn test_unit_price_is_a_snapshot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p1 = product_with_stock(&db, "Alfajor", 5).await;

        let sale = db
            .sales()
            .create_sale(NewSale::new("efectivo").with_line(NewSaleLine::new(
                &p1.id,
                1,
                Money::from_cents(777),
            )))
            .await
            .unwrap();

        assert_eq!(sale.total_amount, Money::from_cents(777));
        let lines = db.sales().get_with_lines(&sale.id).await.unwrap().products;
        assert_eq!(lines[0].unit_price, Money::from_cents(777));
    }

    #[tokio::test]
    async fn test_failure_on_third_line_writes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p1 = product_with_stock(&db, "A", 5).await;
        let p2 = product_with_stock(&db, "B", 5).await;
        let p3 = product_with_stock(&db, "C", 1).await;
        let p4 = product_with_stock(&db, "D", 5).await;

        let err = db
            .sales()
            .create_sale(
                NewSale::new("efectivo")
                    .with_line(NewSaleLine::new(&p1.id, 1, Money::from_cents(100)))
                    .with_line(NewSaleLine::new(&p2.id, 1, Money::from_cents(100)))
                    .with_line(NewSaleLine::new(&p3.id, 2, Money::from_cents(100)))
                    .with_line(NewSaleLine::new(&p4.id, 1, Money::from_cents(100))),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Domain(CoreError::InsufficientStock { ref product_id, available: 1, requested: 2, .. })
                if *product_id == p3.id
        ));
        for (p, expected) in [(&p1, 5), (&p2, 5), (&p3, 1), (&p4, 5)] {
            assert_eq!(stock_of(&db, &p.id).await, expected);
            assert!(sale_movements(&db, &p.id).await.is_empty());
        }
        assert_eq!(rows(&db, "sales").await, 0);
        assert_eq!(rows(&db, "sale_product").await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_lines_checked_against_combined_quantity() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p1 = product_with_stock(&db, "Alfajor", 3).await;

        let err = db
            .sales()
            .create_sale(
                NewSale::new("efectivo")
                    .with_line(NewSaleLine::new(&p1.id, 2, Money::from_cents(100)))
                    .with_line(NewSaleLine::new(&p1.id, 2, Money::from_cents(100))),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Domain(CoreError::InsufficientStock { available: 3, requested: 4, .. })
        ));
        assert_eq!(stock_of(&db, &p1.id).await, 3);
    }

    #[tokio::test]
    async fn test_bulk_line_limited_only_by_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p1 = product_with_stock(&db, "Caramelos Sugus", 5000).await;

        let sale = db
            .sales()
            .create_sale(NewSale::new("efectivo").with_line(NewSaleLine::new(
                &p1.id,
                1000,
                Money::from_cents(10),
            )))
            .await
            .unwrap();

        assert_eq!(sale.total_amount, Money::from_cents(10_000));
        assert_eq!(stock_of(&db, &p1.id).await, 4000);

        let err = db
            .sales()
            .create_sale(NewSale::new("efectivo").with_line(NewSaleLine::new(
                &p1.id,
                4001,
                Money::from_cents(10),
            )))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(CoreError::InsufficientStock { available: 4000, requested: 4001, .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_product_and_empty_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let coordinator = db.sales();

        let err = coordinator
            .create_sale(NewSale::new("efectivo").with_line(NewSaleLine::new(
                "missing",
                1,
                Money::from_cents(100),
            )))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::ProductNotFound(ref id)) if id == "missing"));

        let err = coordinator.create_sale(NewSale::new("efectivo")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::EmptyLineSet)));
        assert_eq!(rows(&db, "sales").await, 0);
    }

    #[tokio::test]
    async fn test_delete_sale_restores_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p1 = product_with_stock(&db, "Alfajor", 5).await;
        let p2 = product_with_stock(&db, "Chicle", 3).await;
        let coordinator = db.sales();

        let sale = coordinator
            .create_sale(
                NewSale::new("efectivo")
                    .with_line(NewSaleLine::new(&p1.id, 2, Money::from_cents(1000)))
                    .with_line(NewSaleLine::new(&p2.id, 1, Money::from_cents(500))),
            )
            .await
            .unwrap();

        let removed = coordinator.delete_sale(&sale.id).await.unwrap();
        assert_eq!(removed.sale.id, sale.id);
        assert_eq!(removed.total_items, 3);

        assert_eq!(stock_of(&db, &p1.id).await, 5);
        assert_eq!(stock_of(&db, &p2.id).await, 3);

        let reversal = reversal_note(&sale.id);
        for (p, qty) in [(&p1, 2), (&p2, 1)] {
            let credits: Vec<_> = sale_movements(&db, &p.id)
                .await
                .into_iter()
                .filter(|m| m.movement_type == MovementType::Ingreso)
                .collect();
            assert_eq!(credits.len(), 1);
            assert_eq!(credits[0].quantity, qty);
            assert_eq!(credits[0].notes.as_deref(), Some(reversal.as_str()));
        }

        assert!(coordinator.list().await.unwrap().is_empty());
        assert_eq!(rows(&db, "sale_product").await, 0);
        assert!(matches!(
            coordinator.get(&sale.id).await.unwrap_err(),
            ServiceError::Domain(CoreError::SaleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.sales().delete_sale("missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_invoiced_sale_cannot_be_deleted_or_reverted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p1 = product_with_stock(&db, "Alfajor", 5).await;
        let coordinator = db.sales();

        let sale = coordinator
            .create_sale(NewSale::new("tarjeta").with_line(NewSaleLine::new(
                &p1.id,
                1,
                Money::from_cents(1000),
            )))
            .await
            .unwrap();

        let invoiced = coordinator
            .mark_invoiced(&sale.id, Some("tickets/abc.pdf".to_string()))
            .await
            .unwrap();
        assert_eq!(invoiced.invoice_state, InvoiceState::Facturado);
        assert_eq!(invoiced.ticket_url.as_deref(), Some("tickets/abc.pdf"));

        let err = coordinator
            .update_status(
                &sale.id,
                SaleStatusUpdate {
                    invoice_state: Some(InvoiceState::Pendiente),
                    ticket_url: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::InvalidInvoiceTransition { .. })));

        let err = coordinator.delete_sale(&sale.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::SaleAlreadyInvoiced(_))));
        assert_eq!(stock_of(&db, &p1.id).await, 4);
    }

    #[tokio::test]
    async fn test_queries_by_date_and_summary() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p1 = product_with_stock(&db, "Alfajor", 10).await;
        let coordinator = db.sales();

        for cents in [1000, 2001] {
            coordinator
                .create_sale(NewSale::new("efectivo").with_line(NewSaleLine::new(
                    &p1.id,
                    1,
                    Money::from_cents(cents),
                )))
                .await
                .unwrap();
        }
        // Zero-total sales are listed but not summarised.
        coordinator
            .create_sale(NewSale::new("efectivo").with_line(NewSaleLine::new(
                &p1.id,
                1,
                Money::zero(),
            )))
            .await
            .unwrap();

        // Pin every sale to one instant so the run cannot straddle midnight.
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let noon = day.and_hms_opt(12, 0, 0).unwrap().and_utc();
        sqlx::query("UPDATE sales SET sale_date = ?1")
            .bind(noon)
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(coordinator.list_by_date(day).await.unwrap().len(), 3);
        assert!(coordinator
            .list_by_date(day.succ_opt().unwrap())
            .await
            .unwrap()
            .is_empty());

        let summary = coordinator.daily_summary(day).await.unwrap();
        assert_eq!(summary.total_sales, 2);
        assert_eq!(summary.total_revenue, Money::from_cents(3001));
        assert_eq!(summary.average_sale, Money::from_cents(1501));

        let listed = coordinator.list().await.unwrap();
        assert_eq!(listed[0].total_amount, Money::zero());
    }

    #[tokio::test]
    async fn test_summary_of_empty_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        let summary = db.sales().daily_summary(date).await.unwrap();
        assert_eq!(summary, DailySummary::empty(date));
        assert!(db.sales().list_by_date(date).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nested_operations_under_one_gate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p1 = product_with_stock(&db, "Alfajor", 0).await;
        let coordinator = db.sales();
        let ledger = db.stock_ledger();

        let guard = db.gate().acquire("close_day").await;
        ledger
            .restock_admitted(&guard, StockChange::new(&p1.id, 2))
            .await
            .unwrap();
        let sale = coordinator
            .create_sale_admitted(
                &guard,
                &NewSale::new("efectivo").with_line(NewSaleLine::new(&p1.id, 2, Money::from_cents(100))),
            )
            .await
            .unwrap();
        coordinator.delete_sale_admitted(&guard, &sale.id).await.unwrap();
        assert!(db.gate().is_held());
        drop(guard);

        assert_eq!(stock_of(&db, &p1.id).await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_of_last_unit() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("kiosco.db")))
            .await
            .unwrap();
        let p1 = product_with_stock(&db, "Último alfajor", 1).await;

        let attempts: Vec<_> = (0..2)
            .map(|_| {
                let coordinator = db.sales();
                let request = NewSale::new("efectivo")
                    .with_line(NewSaleLine::new(&p1.id, 1, Money::from_cents(1000)));
                tokio::spawn(async move { coordinator.create_sale(request).await })
            })
            .collect();

        let mut successes = 0;
        let mut insufficient = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => successes += 1,
                Err(ServiceError::Domain(CoreError::InsufficientStock { available: 0, .. })) => {
                    insufficient += 1
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!((successes, insufficient), (1, 1));
        assert_eq!(stock_of(&db, &p1.id).await, 0);
        assert_eq!(sale_movements(&db, &p1.id).await.len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_persisted_total_matches_lines(
            lines in prop::collection::vec((1i64..=20, 0i64..=500_000), 1..8)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let db = Database::new(DbConfig::in_memory()).await.unwrap();
                let mut request = NewSale::new("efectivo");
                for (i, (qty, cents)) in lines.iter().enumerate() {
                    let product = product_with_stock(&db, &format!("P{i}"), 20).await;
                    request = request.with_line(NewSaleLine::new(&product.id, *qty, Money::from_cents(*cents)));
                }

                let sale = db.sales().create_sale(request).await.unwrap();
                let complete = db.sales().get_with_lines(&sale.id).await.unwrap();

                let expected: i64 = lines.iter().map(|(qty, cents)| qty * cents).sum();
                assert_eq!(sale.total_amount, Money::from_cents(expected));
                assert_eq!(complete.lines_total(), Some(sale.total_amount));
                assert_eq!(complete.products.len(), lines.len());
            });
        }
    }
}
