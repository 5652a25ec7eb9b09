//! Vote registration: at most one vote per user per poll, revotes rewrite the
//! existing vote.

use anyhow::Result;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use polly_db::PollStore;
use polly_types::models::{Poll, Vote};

use crate::PollService;
use crate::error::{CoreResult, PollError, recoverable};

impl<S: PollStore> PollService<S> {
    /// Record or change `user_id`'s vote. `false` when any id is blank, the
    /// poll or option is unknown, or the poll is closed.
    pub async fn vote_on_poll(&self, poll_id: &str, option_id: &str, user_id: &str) -> Result<bool> {
        let outcome = self.try_vote(poll_id, option_id, user_id).await;
        Ok(recoverable(outcome, "vote_on_poll")?.is_some())
    }

    /// Like [`vote_on_poll`](Self::vote_on_poll) but keeps the refusal reason
    /// and returns the poll as recounted after the vote.
    pub async fn try_vote(&self, poll_id: &str, option_id: &str, user_id: &str) -> CoreResult<Poll> {
        if [poll_id, option_id, user_id].iter().any(|id| id.trim().is_empty()) {
            return Err(PollError::MissingId);
        }
        if self.store.get_poll(poll_id)?.is_none() {
            return Err(PollError::PollNotFound);
        }

        // Find-or-update and the recount must not interleave with another
        // writer on this poll.
        let _guard = self.locks.acquire(poll_id).await;
        let poll = self.store.get_poll(poll_id)?.ok_or(PollError::PollNotFound)?;

        let now = Utc::now();
        if !poll.is_votable(now) {
            return Err(PollError::PollClosed);
        }
        if poll.option(option_id).is_none() {
            return Err(PollError::OptionNotFound);
        }

        match self.store.find_vote(poll_id, user_id)? {
            Some(mut vote) => {
                debug!("User {} changes vote on poll {}: {} -> {}", user_id, poll_id, vote.option_id, option_id);
                vote.option_id = option_id.to_string();
                vote.created_at = now;
                self.store.update_vote(&vote)?;
            }
            None => {
                let vote = Vote {
                    id: Uuid::new_v4().to_string(),
                    poll_id: poll_id.to_string(),
                    option_id: option_id.to_string(),
                    user_id: user_id.to_string(),
                    created_at: now,
                };
                self.store.insert_vote(&vote)?;
                debug!("User {} voted on poll {}", user_id, poll_id);
            }
        }

        Ok(self.recount(poll, now)?)
    }
}
