//! # Stock Movement Repository
//!
//! Append-only log of stock changes. There is no update and no delete.

use sqlx::{Executor, Sqlite};

use crate::error::DbResult;
use kiosco_core::StockMovement;

pub(crate) async fn insert_movement<'e, E>(executor: E, movement: &StockMovement) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, movement_type, quantity,
            user_id, provider_id, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(&movement.user_id)
    .bind(&movement.provider_id)
    .bind(&movement.notes)
    .bind(movement.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Movements of one product, newest first.
///
/// `rowid` breaks ties between movements written in the same instant.
pub(crate) async fn list_movements<'e, E>(executor: E, product_id: &str) -> DbResult<Vec<StockMovement>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let movements = sqlx::query_as::<_, StockMovement>(
        r#"
        SELECT id, product_id, movement_type, quantity,
               user_id, provider_id, notes, created_at
        FROM stock_movements
        WHERE product_id = ?1
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(executor)
    .await?;

    Ok(movements)
}
