pub mod ai;
pub mod auth;
pub mod centers;
pub mod challenges;
pub mod dashboard;
pub mod ideas;
pub mod lectures;
pub mod middleware;
pub mod results;
pub mod routes;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use axum::http::StatusCode;
use tracing::error;

use eduhub_ai::ChatBackend;
use eduhub_db::Database;
use eduhub_gateway::dispatcher::Dispatcher;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub dispatcher: Dispatcher,
    pub ai: Arc<dyn ChatBackend>,
    /// Map embed URL with `{lat}` and `{lng}` placeholders.
    pub map_url_template: String,
}

/// Run a blocking DB closure off the async runtime, logging and mapping any
/// failure to 500.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("DB error: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
