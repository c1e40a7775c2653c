#![deny(
    clippy::as_conversions,
    clippy::expect_used,
    clippy::future_not_send,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::pedantic,
    clippy::string_slice,
    clippy::todo,
    clippy::unwrap_used,
    unsafe_code
)]
#![allow(
    clippy::manual_non_exhaustive,
    clippy::missing_errors_doc,
    clippy::module_inception,
    clippy::module_name_repetitions,
    clippy::needless_return,
    clippy::single_match_else,
    clippy::multiple_crate_versions
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::indexing_slicing))]

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use tower_sessions::{
    Expiry, SessionManagerLayer,
    cookie::{SameSite, time::Duration},
};
use tower_sessions_sqlx_store::SqliteStore;

pub use args::{Command, CourseManagerArgs, ServerArgs};
pub use error::{AppError, FieldErrors};
pub use grade::Grade;
pub use state::AppState;

mod args;
pub mod auth;
pub mod db;
mod error;
pub mod filters;
pub mod forms;
mod grade;
pub mod logging;
pub mod models;
pub mod password;
pub mod permissions;
mod routes;
pub mod slug;
mod state;
mod templates;

/// Builds the router over an already migrated pool.
pub async fn app(db_pool: SqlitePool, config: ServerArgs) -> Result<Router, AppError> {
    let session_store = SqliteStore::new(db_pool.clone());
    session_store.migrate().await.map_err(AppError::Database)?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(config.session_days)));

    let state = AppState::new(db_pool, config);

    let router = Router::new()
        .merge(routes::health::router())
        .merge(auth::auth_router())
        .merge(routes::accounts::router())
        .merge(routes::courses::router())
        .merge(routes::certificates::router())
        .merge(routes::manage::router())
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

pub async fn server(config: ServerArgs) -> Result<Router, AppError> {
    let db_pool = db::connect(&config.database_url).await?;

    app(db_pool, config).await
}
