use std::{fmt, sync::Arc, time::Instant};

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::ServerArgs;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<ServerArgs>,
    pub started_at: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(db_pool: SqlitePool, config: ServerArgs) -> Self {
        Self {
            db_pool,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("db_pool", &self.db_pool)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.db_pool.clone()
    }
}
