pub mod middleware;
pub mod polls;
pub mod stats;
pub mod votes;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use tracing::error;

use polly_core::PollService;
use polly_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub polls: PollService<Database>,
}

/// Log a store failure and answer 500.
pub(crate) fn internal(e: anyhow::Error) -> StatusCode {
    error!("Store failure: {:#}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/polls", get(polls::list_polls).post(polls::create_poll))
        .route("/polls/{poll_id}", get(polls::get_poll))
        .route("/polls/{poll_id}/results", get(polls::get_results))
        .route("/polls/{poll_id}/votes", post(votes::cast_vote))
        .route("/polls/{poll_id}/deactivate", post(polls::deactivate_poll))
        .route("/users/{user_id}/polls", get(polls::user_polls))
        .route("/stats", get(stats::get_stats))
        .route("/health", get(|| async { "ok" }))
        .layer(from_fn(middleware::identify_user))
        .with_state(state)
}
