use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use polly_core::PollError;
use polly_types::api::{PollResponse, VoteRequest};

use crate::middleware::AuthUser;
use crate::{AppState, internal};

pub async fn cast_vote(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    AuthUser(user): AuthUser,
    Json(req): Json<VoteRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let poll = state
        .polls
        .try_vote(&poll_id, &req.option_id, &user.id)
        .await
        .map_err(|e| match e {
            PollError::Store(e) => internal(e),
            refusal => {
                debug!("Vote by {} on poll {} refused: {}", user.id, poll_id, refusal);
                refusal_status(&refusal)
            }
        })?;
    Ok(Json(PollResponse { poll }))
}

fn refusal_status(e: &PollError) -> StatusCode {
    match e {
        PollError::PollNotFound | PollError::OptionNotFound => StatusCode::NOT_FOUND,
        PollError::PollClosed => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}
