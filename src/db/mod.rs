mod from_row;
pub mod queries;
mod schema;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::payments::BillingProvider;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and the payment provider.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Payment provider client (Stripe in production, a recording mock in tests).
    pub billing: Arc<dyn BillingProvider>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
