//! # HTTP Routes
//!
//! ```text
//! GET    /health
//!
//! POST   /sales                   create (201)
//! GET    /sales                   list, newest first
//! GET    /sales/summary?date=     daily totals (default: today, UTC)
//! GET    /sales/by-date/{date}    list for one day
//! GET    /sales/{id}              header
//! GET    /sales/{id}/complete     header + lines + total_items
//! PATCH  /sales/{id}              invoice state / ticket url
//! DELETE /sales/{id}              reverse and remove
//!
//! GET    /products                catalog
//! GET    /products/{id}           one product with current stock
//! POST   /products/{id}/stock     stock-in
//! GET    /products/{id}/stock     movement history
//! ```

pub mod health;
pub mod products;
pub mod sales;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Builds the route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/sales", get(sales::list_sales).post(sales::create_sale))
        .route("/sales/summary", get(sales::daily_summary))
        .route("/sales/by-date/{date}", get(sales::list_sales_by_date))
        .route(
            "/sales/{id}",
            get(sales::get_sale)
                .patch(sales::update_sale_status)
                .delete(sales::delete_sale),
        )
        .route("/sales/{id}/complete", get(sales::get_sale_complete))
        .route("/products", get(products::list_products))
        .route("/products/{id}", get(products::get_product))
        .route(
            "/products/{id}/stock",
            post(products::stock_in).get(products::stock_history),
        )
}
