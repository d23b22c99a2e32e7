//! Sale endpoints.
//!
//! Handlers only translate HTTP to [`SaleCoordinator`](kiosco_db::SaleCoordinator)
//! calls; validation, gating and rollback live in kiosco-db.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use kiosco_core::validation::parse_sale_date;
use kiosco_core::{DailySummary, NewSale, Sale, SaleStatusUpdate, SaleWithLines};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub date: Option<String>,
}

pub async fn create_sale(
    State(state): State<AppState>,
    payload: Result<Json<NewSale>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let Json(request) = payload?;
    let sale = state.db.sales().create_sale(request).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn list_sales(State(state): State<AppState>) -> ApiResult<Json<Vec<Sale>>> {
    Ok(Json(state.db.sales().list().await?))
}

pub async fn list_sales_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<Json<Vec<Sale>>> {
    let date = parse_sale_date(&date)?;
    Ok(Json(state.db.sales().list_by_date(date).await?))
}

/// `GET /sales/summary?date=YYYY-MM-DD`, today (UTC) when `date` is absent.
pub async fn daily_summary(
    State(state): State<AppState>,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> ApiResult<Json<DailySummary>> {
    let Query(params) = params?;
    let date = match params.date.as_deref() {
        Some(raw) => parse_sale_date(raw)?,
        None => Utc::now().date_naive(),
    };
    Ok(Json(state.db.sales().daily_summary(date).await?))
}

pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Sale>> {
    Ok(Json(state.db.sales().get(&id).await?))
}

pub async fn get_sale_complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleWithLines>> {
    Ok(Json(state.db.sales().get_with_lines(&id).await?))
}

pub async fn update_sale_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SaleStatusUpdate>, JsonRejection>,
) -> ApiResult<Json<Sale>> {
    let Json(update) = payload?;
    Ok(Json(state.db.sales().update_status(&id, update).await?))
}

/// Reverses the sale's stock and removes it. Responds with the removed sale.
pub async fn delete_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleWithLines>> {
    Ok(Json(state.db.sales().delete_sale(&id).await?))
}
