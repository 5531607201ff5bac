//! Shared application state.

use rusqlite::Connection;

use super::error::{ApiError, ApiResult};
use crate::store::Database;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Run `f` against the connection on the blocking thread pool.
    pub async fn with_db<F, T>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Connection) -> ApiResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.connection();
            f(&conn)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("database task failed: {}", e)))?
    }
}
