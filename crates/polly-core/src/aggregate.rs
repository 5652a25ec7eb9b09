//! Recomputes derived vote counts from the authoritative vote set.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::debug;

use polly_db::PollStore;
use polly_types::models::{Poll, Vote};

use crate::PollService;

/// `round(votes / total * 100)` with halves rounded up, computed exactly.
/// Each option is rounded on its own, so a poll's percentages may not sum to 100.
pub fn percentage(votes: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (votes, total) = (u64::from(votes), u64::from(total));
    ((votes * 200 + total) / (total * 2)) as u32
}

/// Overwrite every derived field of `poll` from `votes`. Votes of other polls
/// are ignored.
pub fn tally(poll: &mut Poll, votes: &[Vote]) {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    let mut total = 0;
    for vote in votes.iter().filter(|v| v.poll_id == poll.id) {
        *counts.entry(vote.option_id.as_str()).or_default() += 1;
        total += 1;
    }

    poll.total_votes = total;
    for option in &mut poll.options {
        option.votes = counts.get(option.id.as_str()).copied().unwrap_or(0);
        option.percentage = percentage(option.votes, total);
    }
}

impl<S: PollStore> PollService<S> {
    /// Recount a poll's votes and persist the result. Returns `None` for an
    /// unknown poll.
    pub async fn refresh(&self, poll_id: &str) -> Result<Option<Poll>> {
        if self.store.get_poll(poll_id)?.is_none() {
            return Ok(None);
        }

        let _guard = self.locks.acquire(poll_id).await;
        match self.store.get_poll(poll_id)? {
            Some(poll) => self.recount(poll, Utc::now()).map(Some),
            None => Ok(None),
        }
    }

    /// Caller must hold the poll's lock.
    pub(crate) fn recount(&self, mut poll: Poll, now: DateTime<Utc>) -> Result<Poll> {
        let votes = self.store.votes_for_poll(&poll.id)?;
        tally(&mut poll, &votes);
        poll.updated_at = now;
        self.store.update_poll(&poll)?;

        debug!("Poll {} recounted: {} votes", poll.id, poll.total_votes);
        Ok(poll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create, service};
    use polly_types::models::PollOption;

    fn options(poll: &Poll) -> Vec<(u32, u32)> {
        poll.options.iter().map(|o| (o.votes, o.percentage)).collect()
    }

    fn vote(poll: &Poll, option: usize, user: &str) -> Vote {
        Vote {
            id: format!("v-{user}"),
            poll_id: poll.id.clone(),
            option_id: poll.options[option].id.clone(),
            user_id: user.to_string(),
            created_at: Utc::now(),
        }
    }

    fn bare_poll(n: usize) -> Poll {
        let now = Utc::now();
        Poll {
            id: "p".into(),
            question: "q".into(),
            description: None,
            options: (0..n)
                .map(|i| PollOption {
                    id: format!("o{i}"),
                    text: format!("Option {i}"),
                    votes: 0,
                    percentage: 0,
                })
                .collect(),
            category: "General".into(),
            author_id: "a".into(),
            is_active: true,
            total_votes: 0,
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 200), 1);
        assert_eq!(percentage(1, 201), 0);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn percentages_are_not_normalised() {
        let mut poll = bare_poll(3);
        let votes = vec![vote(&poll, 0, "a"), vote(&poll, 1, "b"), vote(&poll, 2, "c")];
        tally(&mut poll, &votes);
        assert_eq!(options(&poll), vec![(1, 33), (1, 33), (1, 33)]);

        let mut poll = bare_poll(3);
        let votes: Vec<_> = (0..6).map(|i| vote(&poll, [0, 1, 1, 2, 2, 2][i], &i.to_string())).collect();
        tally(&mut poll, &votes);
        assert_eq!(options(&poll), vec![(1, 17), (2, 33), (3, 50)]);
    }

    #[test]
    fn tally_ignores_other_polls_and_resets_counts() {
        let mut poll = bare_poll(2);
        poll.options[1].votes = 9;
        poll.options[1].percentage = 100;
        poll.total_votes = 9;

        let mut foreign = vote(&poll, 1, "x");
        foreign.poll_id = "other".into();
        let votes = vec![vote(&poll, 0, "a"), foreign];
        tally(&mut poll, &votes);

        assert_eq!(poll.total_votes, 1);
        assert_eq!(options(&poll), vec![(1, 100), (0, 0)]);
    }

    #[test]
    fn zero_votes_gives_zero_percentages() {
        let mut poll = bare_poll(4);
        tally(&mut poll, &[]);
        assert_eq!(poll.total_votes, 0);
        assert!(poll.options.iter().all(|o| o.votes == 0 && o.percentage == 0));
    }

    #[tokio::test]
    async fn refresh_is_idempotent() {
        let service = service();
        let poll = create(&service, &["a", "b", "c"], "user-1").await;
        service.vote_on_poll(&poll.id, &poll.options[0].id, "user-1").await.unwrap();
        service.vote_on_poll(&poll.id, &poll.options[2].id, "user-2").await.unwrap();

        let first = service.refresh(&poll.id).await.unwrap().unwrap();
        let second = service.refresh(&poll.id).await.unwrap().unwrap();
        assert_eq!(first.options, second.options);
        assert_eq!(first.total_votes, second.total_votes);
        assert_eq!(options(&second), vec![(1, 50), (0, 0), (1, 50)]);
    }

    #[tokio::test]
    async fn refresh_unknown_poll_is_none() {
        let service = service();
        assert!(service.refresh("missing").await.unwrap().is_none());
    }
}
