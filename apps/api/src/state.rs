//! Shared handler state.

use kiosco_db::Database;

/// Shared application state.
///
/// `Database` is a cheap clone (pool handle + `Arc` gate), so every request
/// sees the same pool and the same concurrency gate.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}
