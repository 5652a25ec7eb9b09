use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Poll, PollResult, PollStats};

// -- Polls --

/// Input for poll creation. Every field is taken as submitted; trimming and
/// validation happen in the lifecycle manager.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePollData {
    #[serde(default)]
    pub question: String,
    pub description: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub category: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Newest,
    Oldest,
    MostVotes,
    LeastVotes,
}

/// Listing filters. Omitted filters impose no constraint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollFilters {
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub active_only: bool,
    pub sort_by: Option<SortBy>,
    /// Zero means no limit.
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub poll: Poll,
}

#[derive(Debug, Serialize)]
pub struct PollListResponse {
    pub polls: Vec<Poll>,
}

// -- Votes --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VoteRequest {
    pub option_id: String,
}

// -- Results & stats --

#[derive(Debug, Serialize)]
pub struct PollResultResponse {
    pub results: PollResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PollStatsResponse {
    pub stats: PollStats,
}
