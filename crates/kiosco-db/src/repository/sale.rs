//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! ## Who Writes What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SaleRepository (pool)          read-only: lookups, listings, summary  │
//! │                                                                         │
//! │  insert_sale / insert_line      ┐                                      │
//! │  delete_sale / set_status       ┘ crate-private, only the sale          │
//! │                                   coordinator calls them, inside its    │
//! │                                   gated transaction                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use kiosco_core::{DailySummary, InvoiceState, Money, Sale, SaleLine};

/// Read-only access to persisted sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        fetch_sale(&self.pool, id).await
    }

    /// Gets the lines of a sale in entry order.
    pub async fn lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        fetch_lines(&self.pool, sale_id).await
    }

    /// Lists every sale, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, sale_date, total_cents AS total_amount,
                   payment_method, ticket_url, invoice_state
            FROM sales
            ORDER BY sale_date DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists the sales of one calendar day (UTC), newest first.
    pub async fn list_by_date(&self, date: NaiveDate) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, sale_date, total_cents AS total_amount,
                   payment_method, ticket_url, invoice_state
            FROM sales
            WHERE DATE(sale_date) = ?1
            ORDER BY sale_date DESC, rowid DESC
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        debug!(%date, count = sales.len(), "Listed sales by date");
        Ok(sales)
    }

    /// Count, revenue and average of one day's sales in a single aggregate.
    ///
    /// Zero-total sales are left out, so they do not drag the average down.
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        let (total_sales, revenue_cents, average_cents): (i64, i64, f64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(total_cents), 0),
                COALESCE(AVG(total_cents), 0.0)
            FROM sales
            WHERE DATE(sale_date) = ?1 AND total_cents > 0
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailySummary {
            date,
            total_sales,
            total_revenue: Money::from_cents(revenue_cents),
            average_sale: Money::from_cents(average_cents.round() as i64),
        })
    }
}

// =============================================================================
// Executor-generic operations
// =============================================================================

pub(crate) async fn fetch_sale<'e, E>(executor: E, id: &str) -> DbResult<Option<Sale>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sale = sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, sale_date, total_cents AS total_amount,
               payment_method, ticket_url, invoice_state
        FROM sales
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(sale)
}

pub(crate) async fn fetch_lines<'e, E>(executor: E, sale_id: &str) -> DbResult<Vec<SaleLine>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let lines = sqlx::query_as::<_, SaleLine>(
        r#"
        SELECT id, sale_id, product_id, quantity, unit_price_cents AS unit_price
        FROM sale_product
        WHERE sale_id = ?1
        ORDER BY position ASC
        "#,
    )
    .bind(sale_id)
    .fetch_all(executor)
    .await?;

    Ok(lines)
}

pub(crate) async fn insert_sale<'e, E>(executor: E, sale: &Sale) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %sale.id, total = %sale.total_amount, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, sale_date, total_cents, payment_method, ticket_url, invoice_state
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&sale.id)
    .bind(sale.sale_date)
    .bind(sale.total_amount)
    .bind(&sale.payment_method)
    .bind(&sale.ticket_url)
    .bind(sale.invoice_state)
    .execute(executor)
    .await?;

    Ok(())
}

/// Inserts one line. `position` keeps the order the cashier entered them.
pub(crate) async fn insert_line<'e, E>(executor: E, line: &SaleLine, position: i64) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO sale_product (
            id, sale_id, product_id, quantity, unit_price_cents, position
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.product_id)
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(position)
    .execute(executor)
    .await?;

    Ok(())
}

/// Deletes a sale; its lines go with it (ON DELETE CASCADE).
pub(crate) async fn delete_sale<'e, E>(executor: E, id: &str) -> DbResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Sets invoice state and/or ticket URL; `None` keeps the current value.
pub(crate) async fn set_status<'e, E>(
    executor: E,
    id: &str,
    invoice_state: Option<InvoiceState>,
    ticket_url: Option<&str>,
) -> DbResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE sales
        SET invoice_state = COALESCE(?1, invoice_state),
            ticket_url = COALESCE(?2, ticket_url)
        WHERE id = ?3
        "#,
    )
    .bind(invoice_state)
    .bind(ticket_url)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
