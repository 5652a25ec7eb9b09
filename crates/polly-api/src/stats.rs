use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use polly_types::api::{PollStatsResponse, StatsQuery};

use crate::{AppState, internal};

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let stats = state
        .polls
        .get_poll_stats(query.user_id.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(PollStatsResponse { stats }))
}
