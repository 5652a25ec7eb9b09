use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use polly_core::PollError;
use polly_types::api::{CreatePollData, PollFilters, PollListResponse, PollResponse, PollResultResponse};

use crate::middleware::AuthUser;
use crate::{AppState, internal};

pub async fn list_polls(
    State(state): State<AppState>,
    Query(filters): Query<PollFilters>,
) -> Result<impl IntoResponse, StatusCode> {
    let polls = state.polls.get_polls(&filters).await.map_err(internal)?;
    Ok(Json(PollListResponse { polls }))
}

pub async fn create_poll(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreatePollData>,
) -> Result<impl IntoResponse, StatusCode> {
    match state.polls.try_create_poll(&req, &user.id).await {
        Ok(poll) => Ok((StatusCode::CREATED, Json(PollResponse { poll }))),
        Err(PollError::Store(e)) => Err(internal(e)),
        Err(reason) => {
            warn!("Poll submission from {} rejected: {}", user.id, reason);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

pub async fn get_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let poll = state
        .polls
        .get_poll_by_id(&poll_id)
        .await
        .map_err(internal)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(PollResponse { poll }))
}

pub async fn get_results(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let results = state
        .polls
        .get_poll_results(&poll_id)
        .await
        .map_err(internal)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(PollResultResponse { results }))
}

pub async fn user_polls(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let polls = state.polls.get_user_polls(&user_id).await.map_err(internal)?;
    Ok(Json(PollListResponse { polls }))
}

/// Unknown poll and foreign poll look the same to the caller.
pub async fn deactivate_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, StatusCode> {
    if state.polls.deactivate_poll(&poll_id, &user.id).await.map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
