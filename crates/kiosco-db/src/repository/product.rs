//! # Product Repository
//!
//! Catalog reads and product inserts.
//!
//! The `stock` column is written only by [`add_stock`] / [`remove_stock`],
//! which are crate-private and reached through the stock ledger.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, ServiceResult};
use kiosco_core::validation::{validate_price, validate_product_name};
use kiosco_core::{NewProduct, Product};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get_by_barcode("7790895000997").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        fetch_product(&self.pool, id).await
    }

    /// Gets a product by barcode (scanner lookup).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, barcode, price_cents AS price, stock,
                   category, image_url, created_at, updated_at
            FROM products
            WHERE barcode = ?1
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists the whole catalog, alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, barcode, price_cents AS price, stock,
                   category, image_url, created_at, updated_at
            FROM products
            ORDER BY name ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Adds a product to the catalog with zero stock.
    ///
    /// Initial stock goes in afterwards through the ledger so that it has a
    /// movement like every other stock change.
    pub async fn insert(&self, input: &NewProduct) -> ServiceResult<Product> {
        validate_product_name(&input.name)?;
        validate_price("price", input.price)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            barcode: input
                .barcode
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string),
            price: input.price,
            stock: 0,
            category: input.category.clone(),
            image_url: input.image_url.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, barcode, price_cents, stock,
                category, image_url, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.category)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, product.barcode.clone().unwrap_or_default())
            }
            other => other,
        })?;

        Ok(product)
    }
}

// =============================================================================
// Executor-generic operations
// =============================================================================

/// Reads a product through any executor (pool or open transaction).
pub(crate) async fn fetch_product<'e, E>(executor: E, id: &str) -> DbResult<Option<Product>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, barcode, price_cents AS price, stock,
               category, image_url, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

/// `stock += quantity`. Returns the number of rows touched (0 or 1).
pub(crate) async fn add_stock<'e, E>(
    executor: E,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + ?1, updated_at = ?2
        WHERE id = ?3
        "#,
    )
    .bind(quantity)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// `stock -= quantity`, only if enough stock remains.
///
/// Returns 0 when the product is missing or the stock would go negative.
pub(crate) async fn remove_stock<'e, E>(
    executor: E,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?1, updated_at = ?2
        WHERE id = ?3 AND stock >= ?1
        "#,
    )
    .bind(quantity)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::{Database, DbConfig};
    use kiosco_core::{CoreError, Money};

    fn new_product(name: &str, barcode: Option<&str>) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            barcode: barcode.map(str::to_string),
            price: Money::from_cents(1500),
            category: Some("Golosinas".to_string()),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let inserted = repo
            .insert(&new_product("Alfajor", Some("7790001")))
            .await
            .unwrap();
        assert_eq!(inserted.stock, 0);

        let by_id = repo.get_by_id(&inserted.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Alfajor");
        assert_eq!(by_id.price, Money::from_cents(1500));

        let by_barcode = repo.get_by_barcode("7790001").await.unwrap().unwrap();
        assert_eq!(by_barcode.id, inserted.id);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&new_product("Alfajor", Some("7790001"))).await.unwrap();
        let err = repo
            .insert(&new_product("Alfajor triple", Some("7790001")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Storage(DbError::UniqueViolation { ref value, .. }) if value == "7790001"
        ));
    }

    #[tokio::test]
    async fn test_invalid_product_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.products().insert(&new_product("  ", None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_is_alphabetical() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&new_product("Yerba", None)).await.unwrap();
        repo.insert(&new_product("Agua", None)).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Agua", "Yerba"]);
    }

    #[tokio::test]
    async fn test_remove_stock_never_goes_negative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db.products().insert(&new_product("Chicle", None)).await.unwrap();

        assert_eq!(add_stock(db.pool(), &product.id, 2, Utc::now()).await.unwrap(), 1);
        assert_eq!(remove_stock(db.pool(), &product.id, 3, Utc::now()).await.unwrap(), 0);
        assert_eq!(remove_stock(db.pool(), &product.id, 2, Utc::now()).await.unwrap(), 1);

        let stock = fetch_product(db.pool(), &product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 0);
    }
}
