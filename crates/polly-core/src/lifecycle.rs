//! Poll creation and deactivation.

use std::collections::HashSet;

use anyhow::Result;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use polly_db::PollStore;
use polly_types::api::CreatePollData;
use polly_types::models::{Poll, PollOption};

use crate::PollService;
use crate::error::{CoreResult, PollError, ValidationError, recoverable};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;
pub const MAX_OPTION_LEN: usize = 100;
pub const DEFAULT_CATEGORY: &str = "General";

/// Submission fields after trimming, ready to become a poll.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidPoll {
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<String>,
    pub category: String,
}

/// Check a submission without touching the store. The author is checked
/// separately since it needs a lookup.
pub fn validate(data: &CreatePollData) -> Result<ValidPoll, ValidationError> {
    let question = data.question.trim();
    if question.is_empty() {
        return Err(ValidationError::MissingQuestion);
    }

    let options: Vec<&str> = data
        .options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .collect();
    if options.len() < MIN_OPTIONS {
        return Err(ValidationError::TooFewOptions);
    }
    if options.len() > MAX_OPTIONS {
        return Err(ValidationError::TooManyOptions);
    }

    let mut seen = HashSet::new();
    if !options.iter().all(|o| seen.insert(o.to_lowercase())) {
        return Err(ValidationError::DuplicateOptions);
    }

    if options.iter().any(|o| o.chars().count() > MAX_OPTION_LEN) {
        return Err(ValidationError::OptionTooLong);
    }

    let description = data
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let category = data
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string();

    Ok(ValidPoll {
        question: question.to_string(),
        description,
        options: options.into_iter().map(str::to_string).collect(),
        category,
    })
}

impl<S: PollStore> PollService<S> {
    /// Create and persist a poll. `None` when the submission is invalid or the
    /// author is unknown.
    pub async fn create_poll(&self, data: &CreatePollData, author_id: &str) -> Result<Option<Poll>> {
        recoverable(self.try_create_poll(data, author_id).await, "create_poll")
    }

    pub async fn try_create_poll(&self, data: &CreatePollData, author_id: &str) -> CoreResult<Poll> {
        let valid = validate(data)?;

        if author_id.trim().is_empty() || self.store.get_user(author_id)?.is_none() {
            return Err(ValidationError::UnknownAuthor.into());
        }

        let now = Utc::now();
        // expires_at is taken as given, even when already in the past
        let poll = Poll {
            id: Uuid::new_v4().to_string(),
            question: valid.question,
            description: valid.description,
            options: valid
                .options
                .into_iter()
                .map(|text| PollOption {
                    id: Uuid::new_v4().to_string(),
                    text,
                    votes: 0,
                    percentage: 0,
                })
                .collect(),
            category: valid.category,
            author_id: author_id.to_string(),
            is_active: true,
            total_votes: 0,
            created_at: now,
            updated_at: now,
            expires_at: data.expires_at,
        };

        self.store.insert_poll(&poll)?;

        info!("Poll {} created by {} with {} options", poll.id, author_id, poll.options.len());
        Ok(poll)
    }

    /// Close a poll for voting. Only its author may do so; every refusal is
    /// the same `false`.
    pub async fn deactivate_poll(&self, poll_id: &str, user_id: &str) -> Result<bool> {
        let outcome = self.close_poll(poll_id, user_id).await;
        Ok(recoverable(outcome, "deactivate_poll")?.is_some())
    }

    async fn close_poll(&self, poll_id: &str, user_id: &str) -> CoreResult<()> {
        if self.store.get_poll(poll_id)?.is_none() {
            return Err(PollError::PollNotFound);
        }

        let _guard = self.locks.acquire(poll_id).await;
        let mut poll = self.store.get_poll(poll_id)?.ok_or(PollError::PollNotFound)?;
        if poll.author_id != user_id {
            return Err(PollError::NotAuthor);
        }

        poll.is_active = false;
        poll.updated_at = Utc::now();
        self.store.update_poll(&poll)?;

        info!("Poll {} deactivated by {}", poll_id, user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create, data, service};
    use chrono::Duration;

    #[test]
    fn validation_reasons_in_order() {
        assert_eq!(validate(&data("   ", &["a"])), Err(ValidationError::MissingQuestion));
        assert_eq!(validate(&data("Q", &["Only one"])), Err(ValidationError::TooFewOptions));
        assert_eq!(validate(&data("Q", &["a", "  ", ""])), Err(ValidationError::TooFewOptions));

        let eleven: Vec<String> = (1..=11).map(|i| format!("Option {i}")).collect();
        let eleven: Vec<&str> = eleven.iter().map(String::as_str).collect();
        assert_eq!(validate(&data("Q", &eleven)), Err(ValidationError::TooManyOptions));

        assert_eq!(validate(&data("Q", &["Red", "Blue", "Red"])), Err(ValidationError::DuplicateOptions));
        assert_eq!(validate(&data("Q", &["Red", " red "])), Err(ValidationError::DuplicateOptions));

        let long = "x".repeat(101);
        assert_eq!(validate(&data("Q", &["a", long.as_str()])), Err(ValidationError::OptionTooLong));
    }

    #[test]
    fn blanks_are_dropped_before_counting() {
        let mut eleven: Vec<String> = (1..=10).map(|i| format!("Option {i}")).collect();
        eleven.push("   ".into());
        let eleven: Vec<&str> = eleven.iter().map(String::as_str).collect();
        assert_eq!(validate(&data("Q", &eleven)).unwrap().options.len(), 10);
    }

    #[test]
    fn trims_and_defaults() {
        let mut input = data("  What is your favorite color?  ", &["Red", "", "Blue", "   ", " Green "]);
        input.description = Some("  Choose your preferred color  ".into());
        input.category = Some("   ".into());

        let valid = validate(&input).unwrap();
        assert_eq!(valid.question, "What is your favorite color?");
        assert_eq!(valid.description.as_deref(), Some("Choose your preferred color"));
        assert_eq!(valid.options, vec!["Red", "Blue", "Green"]);
        assert_eq!(valid.category, DEFAULT_CATEGORY);
    }

    #[tokio::test]
    async fn creates_poll_with_fresh_ids() {
        let service = service();
        let mut input = data("Favourite colour?", &["Red", "Blue"]);
        input.category = Some("Preferences".into());
        let expires_at = Utc::now() + Duration::days(7);
        input.expires_at = Some(expires_at);

        let poll = service.create_poll(&input, "user-1").await.unwrap().unwrap();
        assert_eq!(poll.category, "Preferences");
        assert_eq!(poll.author_id, "user-1");
        assert_eq!(poll.total_votes, 0);
        assert!(poll.is_active);
        assert_eq!(poll.expires_at, Some(expires_at));
        assert_eq!(poll.created_at, poll.updated_at);
        assert_ne!(poll.options[0].id, poll.options[1].id);

        let stored = service.store().get_poll(&poll.id).unwrap().unwrap();
        assert_eq!(stored, poll);
    }

    #[tokio::test]
    async fn past_expiry_is_accepted_at_creation() {
        let service = service();
        let mut input = data("Too late?", &["Yes", "No"]);
        input.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(service.create_poll(&input, "user-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unknown_author_is_refused() {
        let service = service();
        let input = data("Q", &["a", "b"]);
        assert!(service.create_poll(&input, "nonexistent-user").await.unwrap().is_none());
        assert!(matches!(
            service.try_create_poll(&input, "").await,
            Err(PollError::Validation(ValidationError::UnknownAuthor))
        ));
        assert!(service.store().list_polls().unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_author_can_deactivate() {
        let service = service();
        let poll = create(&service, &["a", "b"], "user-1").await;

        assert!(!service.deactivate_poll(&poll.id, "user-2").await.unwrap());
        assert!(!service.deactivate_poll("missing", "user-1").await.unwrap());
        assert!(service.store().get_poll(&poll.id).unwrap().unwrap().is_active);

        assert!(service.deactivate_poll(&poll.id, "user-1").await.unwrap());
        let stored = service.store().get_poll(&poll.id).unwrap().unwrap();
        assert!(!stored.is_active);
        assert!(stored.updated_at >= poll.updated_at);
    }
}
