use anyhow::Result;

use polly_types::models::{Poll, User, Vote};

use crate::Database;
use crate::models::{OptionRow, PollRow, UserRow, VoteRow};

/// Persistence contract the poll core is written against.
///
/// Implementations only need keyed create/read/update plus listing by foreign
/// key. They do not have to make multi-call sequences atomic; the core holds a
/// per-poll lock around every read-modify-write.
pub trait PollStore: Send + Sync {
    fn insert_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn count_users(&self) -> Result<u64>;

    /// Persist a new poll together with its options.
    fn insert_poll(&self, poll: &Poll) -> Result<()>;
    fn get_poll(&self, id: &str) -> Result<Option<Poll>>;
    /// All polls in creation order.
    fn list_polls(&self) -> Result<Vec<Poll>>;
    fn polls_by_author(&self, author_id: &str) -> Result<Vec<Poll>>;
    /// Overwrite `is_active`, `updated_at`, `total_votes` and every option's
    /// `votes`/`percentage`.
    fn update_poll(&self, poll: &Poll) -> Result<()>;

    fn find_vote(&self, poll_id: &str, user_id: &str) -> Result<Option<Vote>>;
    fn insert_vote(&self, vote: &Vote) -> Result<()>;
    /// Rewrite the chosen option and timestamp of an existing vote.
    fn update_vote(&self, vote: &Vote) -> Result<()>;
    /// Votes of one poll in insertion order.
    fn votes_for_poll(&self, poll_id: &str) -> Result<Vec<Vote>>;
    fn list_votes(&self) -> Result<Vec<Vote>>;

    /// Remove all polls and votes. Users survive a reset.
    fn reset(&self) -> Result<()>;
}

impl PollStore for Database {
    fn insert_user(&self, user: &User) -> Result<()> {
        self.insert_user_row(&UserRow::from(user))
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.get_user_row(id)?.map(UserRow::into_user).transpose()
    }

    fn count_users(&self) -> Result<u64> {
        self.count_user_rows()
    }

    fn insert_poll(&self, poll: &Poll) -> Result<()> {
        self.insert_poll_rows(&PollRow::from(poll), &OptionRow::for_poll(poll))
    }

    fn get_poll(&self, id: &str) -> Result<Option<Poll>> {
        self.get_poll_rows(id)?
            .map(|(poll, options)| poll.into_poll(options))
            .transpose()
    }

    fn list_polls(&self) -> Result<Vec<Poll>> {
        self.list_poll_rows()?
            .into_iter()
            .map(|(poll, options)| poll.into_poll(options))
            .collect()
    }

    fn polls_by_author(&self, author_id: &str) -> Result<Vec<Poll>> {
        self.poll_rows_by_author(author_id)?
            .into_iter()
            .map(|(poll, options)| poll.into_poll(options))
            .collect()
    }

    fn update_poll(&self, poll: &Poll) -> Result<()> {
        self.update_poll_rows(&PollRow::from(poll), &OptionRow::for_poll(poll))
    }

    fn find_vote(&self, poll_id: &str, user_id: &str) -> Result<Option<Vote>> {
        self.find_vote_row(poll_id, user_id)?
            .map(VoteRow::into_vote)
            .transpose()
    }

    fn insert_vote(&self, vote: &Vote) -> Result<()> {
        self.insert_vote_row(&VoteRow::from(vote))
    }

    fn update_vote(&self, vote: &Vote) -> Result<()> {
        self.update_vote_row(&VoteRow::from(vote))
    }

    fn votes_for_poll(&self, poll_id: &str) -> Result<Vec<Vote>> {
        self.vote_rows_for_poll(poll_id)?
            .into_iter()
            .map(VoteRow::into_vote)
            .collect()
    }

    fn list_votes(&self) -> Result<Vec<Vote>> {
        self.all_vote_rows()?
            .into_iter()
            .map(VoteRow::into_vote)
            .collect()
    }

    fn reset(&self) -> Result<()> {
        self.clear_polls()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use polly_types::models::PollOption;
    use uuid::Uuid;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            created_at: Utc::now(),
        }
    }

    fn poll(author_id: &str, texts: &[&str]) -> Poll {
        let now = Utc::now();
        Poll {
            id: Uuid::new_v4().to_string(),
            question: "Which one?".into(),
            description: Some("Pick carefully".into()),
            options: texts
                .iter()
                .map(|text| PollOption {
                    id: Uuid::new_v4().to_string(),
                    text: text.to_string(),
                    votes: 0,
                    percentage: 0,
                })
                .collect(),
            category: "General".into(),
            author_id: author_id.to_string(),
            is_active: true,
            total_votes: 0,
            created_at: now,
            updated_at: now,
            expires_at: Some(now + Duration::days(1)),
        }
    }

    fn vote(poll: &Poll, option: usize, user_id: &str) -> Vote {
        Vote {
            id: Uuid::new_v4().to_string(),
            poll_id: poll.id.clone(),
            option_id: poll.options[option].id.clone(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        }
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&user("u1")).unwrap();
        db.insert_user(&user("u2")).unwrap();
        db
    }

    #[test]
    fn poll_roundtrip_keeps_option_order() {
        let db = seeded();
        let created = poll("u1", &["Zeta", "Alpha", "Mid"]);
        db.insert_poll(&created).unwrap();

        let loaded = db.get_poll(&created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
        assert!(db.get_poll("missing").unwrap().is_none());
    }

    #[test]
    fn listing_is_in_creation_order_and_scoped_by_author() {
        let db = seeded();
        let first = poll("u1", &["a", "b"]);
        let second = poll("u2", &["c", "d"]);
        let third = poll("u1", &["e", "f"]);
        for p in [&first, &second, &third] {
            db.insert_poll(p).unwrap();
        }

        let ids: Vec<_> = db.list_polls().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first.id.clone(), second.id.clone(), third.id.clone()]);

        let mine = db.polls_by_author("u1").unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|p| p.options.len() == 2));
        assert!(db.polls_by_author("nobody").unwrap().is_empty());
    }

    #[test]
    fn update_poll_writes_derived_fields() {
        let db = seeded();
        let mut p = poll("u1", &["a", "b"]);
        db.insert_poll(&p).unwrap();

        p.is_active = false;
        p.total_votes = 3;
        p.options[0].votes = 2;
        p.options[0].percentage = 67;
        p.options[1].votes = 1;
        p.options[1].percentage = 33;
        db.update_poll(&p).unwrap();

        assert_eq!(db.get_poll(&p.id).unwrap().unwrap(), p);
    }

    #[test]
    fn second_vote_row_for_same_user_is_rejected() {
        let db = seeded();
        let p = poll("u1", &["a", "b"]);
        db.insert_poll(&p).unwrap();

        db.insert_vote(&vote(&p, 0, "u2")).unwrap();
        assert!(db.insert_vote(&vote(&p, 1, "u2")).is_err());
        assert_eq!(db.votes_for_poll(&p.id).unwrap().len(), 1);
    }

    #[test]
    fn update_vote_moves_choice_in_place() {
        let db = seeded();
        let p = poll("u1", &["a", "b"]);
        db.insert_poll(&p).unwrap();

        let mut v = vote(&p, 0, "u2");
        db.insert_vote(&v).unwrap();
        v.option_id = p.options[1].id.clone();
        v.created_at = Utc::now() + Duration::seconds(5);
        db.update_vote(&v).unwrap();

        assert_eq!(db.find_vote(&p.id, "u2").unwrap(), Some(v));
        assert!(db.find_vote(&p.id, "u1").unwrap().is_none());
    }

    #[test]
    fn reset_keeps_users() {
        let db = seeded();
        let p = poll("u1", &["a", "b"]);
        db.insert_poll(&p).unwrap();
        db.insert_vote(&vote(&p, 0, "u1")).unwrap();

        db.reset().unwrap();

        assert!(db.list_polls().unwrap().is_empty());
        assert!(db.list_votes().unwrap().is_empty());
        assert_eq!(db.count_users().unwrap(), 2);
        assert!(db.get_user("u1").unwrap().is_some());
    }
}
