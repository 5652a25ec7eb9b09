//! Read side: listings, single-poll lookups, results and statistics.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};

use polly_db::PollStore;
use polly_types::api::{PollFilters, SortBy};
use polly_types::models::{Poll, PollOption, PollResult, PollStats, RecentVote};

use crate::PollService;
use crate::aggregate::percentage;

pub const RECENT_VOTES: usize = 5;

/// Apply `filters` to `polls`, which must be in creation order. Filters are
/// ANDed; sorting is stable and happens before `limit`.
pub fn filter_polls(polls: Vec<Poll>, filters: &PollFilters, now: DateTime<Utc>) -> Vec<Poll> {
    // Category is matched exactly, ignoring case only.
    let category = filters.category.as_deref().filter(|c| !c.is_empty()).map(str::to_lowercase);
    let search = non_blank(filters.search.as_deref()).map(str::to_lowercase);

    let mut polls: Vec<Poll> = polls
        .into_iter()
        .filter(|p| !filters.active_only || p.is_votable(now))
        .filter(|p| category.as_ref().is_none_or(|c| p.category.to_lowercase() == *c))
        .filter(|p| search.as_ref().is_none_or(|term| matches_search(p, term)))
        .collect();

    match filters.sort_by {
        Some(SortBy::Newest) => polls.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        Some(SortBy::Oldest) => polls.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        Some(SortBy::MostVotes) => polls.sort_by(|a, b| b.total_votes.cmp(&a.total_votes)),
        Some(SortBy::LeastVotes) => polls.sort_by(|a, b| a.total_votes.cmp(&b.total_votes)),
        None => {}
    }

    if let Some(limit) = filters.limit.filter(|&l| l > 0) {
        polls.truncate(limit);
    }
    polls
}

fn matches_search(poll: &Poll, term: &str) -> bool {
    poll.question.to_lowercase().contains(term)
        || poll.description.as_ref().is_some_and(|d| d.to_lowercase().contains(term))
        || poll.category.to_lowercase().contains(term)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Human-relative label for how long ago `then` was.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - then;
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    fn plural(n: i64, unit: &str) -> String {
        format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
    }

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else {
        plural(days, "day")
    }
}

impl<S: PollStore> PollService<S> {
    pub async fn get_polls(&self, filters: &PollFilters) -> Result<Vec<Poll>> {
        let polls = self.store.list_polls()?;
        Ok(filter_polls(polls, filters, Utc::now()))
    }

    pub async fn get_poll_by_id(&self, id: &str) -> Result<Option<Poll>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        self.store.get_poll(id)
    }

    pub async fn get_user_polls(&self, user_id: &str) -> Result<Vec<Poll>> {
        if user_id.trim().is_empty() {
            return Ok(vec![]);
        }
        self.store.polls_by_author(user_id)
    }

    /// Headline numbers for one poll plus its latest votes, newest first.
    pub async fn get_poll_results(&self, poll_id: &str) -> Result<Option<PollResult>> {
        if poll_id.trim().is_empty() {
            return Ok(None);
        }
        let Some(poll) = self.store.get_poll(poll_id)? else {
            return Ok(None);
        };

        // First option wins ties.
        let top = poll
            .options
            .iter()
            .fold(None, |best: Option<&PollOption>, option| match best {
                Some(b) if b.votes >= option.votes => Some(b),
                _ => Some(option),
            });

        let mut votes = self.store.votes_for_poll(poll_id)?;
        // Reversing first makes later inserts win timestamp ties after the stable sort.
        votes.reverse();
        votes.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let now = Utc::now();
        let mut recent_votes = Vec::with_capacity(RECENT_VOTES);
        for vote in votes.iter().take(RECENT_VOTES) {
            let user = self
                .store
                .get_user(&vote.user_id)?
                .map(|u| u.name)
                .unwrap_or_else(|| "Anonymous".to_string());
            let option = poll
                .option(&vote.option_id)
                .map(|o| o.text.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            recent_votes.push(RecentVote {
                user,
                option,
                time: time_ago(vote.created_at, now),
            });
        }

        let users = u32::try_from(self.store.count_users()?).unwrap_or(u32::MAX);

        Ok(Some(PollResult {
            poll_id: poll.id.clone(),
            total_votes: poll.total_votes,
            participation_rate: percentage(poll.total_votes, users).min(100),
            top_option: top.map(|o| o.text.clone()).unwrap_or_default(),
            top_option_votes: top.map_or(0, |o| o.votes),
            top_option_percentage: top.map_or(0, |o| o.percentage),
            recent_votes,
        }))
    }

    /// Global statistics, or those of the polls authored by `user_id`.
    pub async fn get_poll_stats(&self, user_id: Option<&str>) -> Result<PollStats> {
        let (polls, votes) = match non_blank(user_id) {
            Some(user_id) => {
                let polls = self.store.polls_by_author(user_id)?;
                let ids: HashSet<&str> = polls.iter().map(|p| p.id.as_str()).collect();
                let votes = self
                    .store
                    .list_votes()?
                    .into_iter()
                    .filter(|v| ids.contains(v.poll_id.as_str()))
                    .count();
                (polls, votes)
            }
            None => (self.store.list_polls()?, self.store.list_votes()?.len()),
        };

        let now = Utc::now();
        let total_polls = polls.len();
        let average_engagement = if total_polls > 0 {
            (votes as f64 / total_polls as f64 * 100.0).round() / 100.0
        } else {
            0.0
        };

        Ok(PollStats {
            total_polls,
            active_polls: polls.iter().filter(|p| p.is_votable(now)).count(),
            total_votes: votes,
            average_engagement,
        })
    }
}
