//! Catalog lookups and stock-in.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use kiosco_core::{CoreError, Product, StockMovement};
use kiosco_db::StockChange;

use crate::error::ApiResult;
use crate::state::AppState;

/// Body of `POST /products/{id}/stock`.
#[derive(Debug, Deserialize)]
pub struct StockInRequest {
    pub quantity: i64,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list().await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;
    Ok(Json(product))
}

/// Credits stock and returns the recorded `ingreso` movement.
pub async fn stock_in(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StockInRequest>, JsonRejection>,
) -> ApiResult<Json<StockMovement>> {
    let Json(request) = payload?;
    debug!(product_id = %id, quantity = request.quantity, "Stock-in requested");

    let mut change = StockChange::new(id, request.quantity)
        .by_user(request.user_id)
        .from_provider(request.provider_id);
    if let Some(notes) = request.notes {
        change = change.with_note(notes);
    }

    let movement = state.db.stock_ledger().restock(change).await?;
    Ok(Json(movement))
}

pub async fn stock_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<StockMovement>>> {
    Ok(Json(state.db.stock_ledger().history(&id).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{send, stocked_product, test_app};

    #[tokio::test]
    async fn test_get_product_with_stock() {
        let (app, db) = test_app().await;
        let product = stocked_product(&db, "Alfajor", 80_000, 12).await;

        let (status, body) = send(&app, Method::GET, &format!("/products/{}", product.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stock"], 12);
        assert_eq!(body["price"], 800.0);

        let (status, body) = send(&app, Method::GET, "/products/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PRODUCT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_stock_in_records_movement() {
        let (app, db) = test_app().await;
        let product = stocked_product(&db, "Yerba", 320_000, 0).await;
        let uri = format!("/products/{}/stock", product.id);

        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "quantity": 10, "provider_id": "prov-1", "notes": "Pedido semanal" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["movement_type"], "ingreso");
        assert_eq!(body["quantity"], 10);
        assert_eq!(body["provider_id"], "prov-1");

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 10);

        let (status, history) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stock_in_rejects_bad_input() {
        let (app, db) = test_app().await;
        let product = stocked_product(&db, "Yerba", 320_000, 5).await;
        let uri = format!("/products/{}/stock", product.id);

        let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "quantity": 0 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_QUANTITY");

        let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "amount": 3 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_BODY");

        let (status, _) = send(
            &app,
            Method::POST,
            "/products/missing/stock",
            Some(json!({ "quantity": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 5);
    }

    #[tokio::test]
    async fn test_history_of_unknown_product() {
        let (app, _db) = test_app().await;
        let (status, _) = send(&app, Method::GET, "/products/missing/stock", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
