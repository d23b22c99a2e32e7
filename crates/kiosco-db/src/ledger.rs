//! # Stock Ledger
//!
//! The single choke point for stock changes: every increment or decrement
//! of `products.stock` goes through here, together with its movement record.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  credit(guard, tx, change)   stock += qty   + 'ingreso' movement       │
//! │  debit(guard, tx, change)    stock -= qty   + 'salida' movement        │
//! │       │                                                                 │
//! │       └── run inside the CALLER's transaction while the caller holds   │
//! │           the gate; a rollback upstream erases both the stock change    │
//! │           and the movement                                              │
//! │                                                                         │
//! │  restock(change)             gate + own transaction + credit           │
//! │  history(product_id)         movements, newest first (no gate)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Debit Fails Closed
//! ```text
//! check stock >= qty ──✗──► InsufficientStock (nothing written)
//!        │ ✓
//!        ▼
//! UPDATE … SET stock = stock - qty WHERE id = ? AND stock >= qty
//!        │
//!        ├── 0 rows ──► InsufficientStock (nothing written)
//!        ▼
//! INSERT movement 'salida'
//! ```

use std::sync::Arc;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::gate::{ConcurrencyGate, GateGuard};
use crate::pool::begin_immediate;
use crate::repository::{product, stock};
use kiosco_core::validation::{validate_notes, validate_stock_quantity};
use kiosco_core::{CoreError, MovementType, Product, StockMovement, ValidationError};

// =============================================================================
// Stock Change
// =============================================================================

/// What to move, by how much, and who asked.
///
/// ## Example
/// ```rust
/// use kiosco_db::ledger::StockChange;
///
/// let change = StockChange::new("p-1", 24)
///     .by_user(Some("u-7".to_string()))
///     .from_provider(Some("prov-3".to_string()))
///     .with_note("Entrega semanal");
/// assert_eq!(change.quantity, 24);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: String,
    pub quantity: i64,
    pub user_id: Option<String>,
    /// Supplier reference, recorded on credits only.
    pub provider_id: Option<String>,
    pub notes: Option<String>,
}

impl StockChange {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            user_id: None,
            provider_id: None,
            notes: None,
        }
    }

    pub fn by_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn from_provider(mut self, provider_id: Option<String>) -> Self {
        self.provider_id = provider_id;
        self
    }

    pub fn with_note(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    fn validate(&self) -> ServiceResult<()> {
        if validate_stock_quantity(self.quantity).is_err() {
            return Err(CoreError::InvalidQuantity {
                product_id: self.product_id.clone(),
                quantity: self.quantity,
            }
            .into());
        }
        validate_notes(self.notes.as_deref())?;
        Ok(())
    }

    fn movement(&self, movement_type: MovementType) -> StockMovement {
        StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: self.product_id.clone(),
            movement_type,
            quantity: self.quantity,
            user_id: self.user_id.clone(),
            provider_id: match movement_type {
                MovementType::Ingreso => self.provider_id.clone(),
                MovementType::Salida => None,
            },
            notes: self.notes.clone(),
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Authoritative stock counts and their audit trail.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
    gate: Arc<ConcurrencyGate>,
}

impl StockLedger {
    pub fn new(pool: SqlitePool, gate: Arc<ConcurrencyGate>) -> Self {
        StockLedger { pool, gate }
    }

    /// The gate this ledger checks guards against.
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Manual stock-in (delivery, correction upwards).
    ///
    /// Takes the gate and runs in its own transaction.
    pub async fn restock(&self, change: StockChange) -> ServiceResult<StockMovement> {
        change.validate()?;
        let guard = self.gate.acquire("restock").await;
        self.restock_admitted(&guard, change).await
    }

    /// [`restock`](Self::restock) for a caller already holding the gate.
    pub async fn restock_admitted(
        &self,
        guard: &GateGuard<'_>,
        change: StockChange,
    ) -> ServiceResult<StockMovement> {
        let mut tx = begin_immediate(&self.pool).await?;

        match self.credit(guard, &mut tx, &change).await {
            Ok(movement) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                info!(
                    product_id = %change.product_id,
                    quantity = change.quantity,
                    "Stock added"
                );
                Ok(movement)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed restock also failed");
                }
                warn!(product_id = %change.product_id, error = %err, "Restock rejected");
                Err(err)
            }
        }
    }

    /// `stock += quantity` and an `ingreso` movement, inside `conn`'s
    /// transaction.
    pub async fn credit(
        &self,
        guard: &GateGuard<'_>,
        conn: &mut SqliteConnection,
        change: &StockChange,
    ) -> ServiceResult<StockMovement> {
        self.gate.check(guard)?;
        change.validate()?;

        let current = self.load(&mut *conn, &change.product_id).await?;
        if current.stock.checked_add(change.quantity).is_none() {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: i64::MAX - current.stock,
            }
            .into());
        }

        let movement = change.movement(MovementType::Ingreso);
        product::add_stock(&mut *conn, &change.product_id, change.quantity, movement.created_at)
            .await?;
        stock::insert_movement(&mut *conn, &movement).await?;

        debug!(
            operation = guard.operation(),
            product_id = %change.product_id,
            quantity = change.quantity,
            stock_after = current.stock + change.quantity,
            "Stock credited"
        );
        Ok(movement)
    }

    /// `stock -= quantity` and a `salida` movement, inside `conn`'s
    /// transaction.
    ///
    /// Fails closed: on insufficient stock nothing is written.
    pub async fn debit(
        &self,
        guard: &GateGuard<'_>,
        conn: &mut SqliteConnection,
        change: &StockChange,
    ) -> ServiceResult<StockMovement> {
        self.gate.check(guard)?;
        change.validate()?;

        let current = self.load(&mut *conn, &change.product_id).await?;
        if !current.can_sell(change.quantity) {
            return Err(insufficient(&current, change.quantity));
        }

        let movement = change.movement(MovementType::Salida);
        let updated = product::remove_stock(
            &mut *conn,
            &change.product_id,
            change.quantity,
            movement.created_at,
        )
        .await?;
        if updated == 0 {
            return Err(insufficient(&current, change.quantity));
        }
        stock::insert_movement(&mut *conn, &movement).await?;

        debug!(
            operation = guard.operation(),
            product_id = %change.product_id,
            quantity = change.quantity,
            stock_after = current.stock - change.quantity,
            "Stock debited"
        );
        Ok(movement)
    }

    /// Movements of a product, newest first.
    pub async fn history(&self, product_id: &str) -> ServiceResult<Vec<StockMovement>> {
        self.load(&self.pool, product_id).await?;
        Ok(stock::list_movements(&self.pool, product_id).await?)
    }

    async fn load<'e, E>(&self, executor: E, product_id: &str) -> ServiceResult<Product>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        product::fetch_product(executor, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }
}

fn insufficient(product: &Product, requested: i64) -> ServiceError {
    CoreError::InsufficientStock {
        product_id: product.id.clone(),
        name: product.name.clone(),
        available: product.stock,
        requested,
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
