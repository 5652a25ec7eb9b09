use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::info;

use polly_db::PollStore;
use polly_types::api::CreatePollData;
use polly_types::models::{Poll, User};

use crate::PollService;

const DEMO_USERS: &[(&str, &str, &str)] = &[
    ("user-1", "Alice Johnson", "alice@example.com"),
    ("user-2", "Bob Smith", "bob@example.com"),
];

impl<S: PollStore> PollService<S> {
    /// Insert the demo users if missing and create two sample polls.
    pub async fn seed_demo_data(&self) -> Result<Vec<Poll>> {
        for &(id, name, email) in DEMO_USERS {
            if self.store.get_user(id)?.is_none() {
                self.store.insert_user(&User {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    created_at: Utc::now(),
                })?;
            }
        }

        let samples = [
            (
                CreatePollData {
                    question: "What is your favorite programming language?".into(),
                    description: Some("Choose your preferred programming language for web development".into()),
                    options: ["JavaScript", "Python", "TypeScript", "Go", "Rust"].map(String::from).to_vec(),
                    category: Some("Technology".into()),
                    expires_at: None,
                },
                "user-1",
            ),
            (
                CreatePollData {
                    question: "Best time for team meetings?".into(),
                    description: Some("Help us decide the optimal time for our weekly team meetings".into()),
                    options: ["9:00 AM", "2:00 PM", "4:00 PM"].map(String::from).to_vec(),
                    category: Some("Work".into()),
                    expires_at: Some(Utc::now() + Duration::days(3)),
                },
                "user-2",
            ),
        ];

        let mut polls = Vec::with_capacity(samples.len());
        for (data, author_id) in &samples {
            polls.push(self.try_create_poll(data, author_id).await?);
        }

        info!("Seeded {} demo users and {} polls", DEMO_USERS.len(), polls.len());
        Ok(polls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polly_db::Database;
    use std::sync::Arc;

    #[tokio::test]
    async fn seeds_into_empty_store() {
        let service = PollService::new(Arc::new(Database::open_in_memory().unwrap()));
        let polls = service.seed_demo_data().await.unwrap();

        assert_eq!(polls.len(), 2);
        assert_eq!(polls[0].options.len(), 5);
        assert_eq!(polls[1].author_id, "user-2");
        assert!(polls[1].expires_at.is_some());
        assert_eq!(service.store().count_users().unwrap(), 2);
    }

    #[tokio::test]
    async fn reseeding_keeps_users_unique() {
        let service = PollService::new(Arc::new(Database::open_in_memory().unwrap()));
        service.seed_demo_data().await.unwrap();
        service.seed_demo_data().await.unwrap();

        assert_eq!(service.store().count_users().unwrap(), 2);
        assert_eq!(service.store().list_polls().unwrap().len(), 4);
    }
}
