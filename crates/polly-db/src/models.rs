//! Database row types. These map directly to SQLite rows and are kept apart
//! from the polly-types models so the schema can move independently.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use polly_types::models::{Poll, PollOption, User, Vote};

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

pub struct PollRow {
    pub id: String,
    pub question: String,
    pub description: Option<String>,
    pub category: String,
    pub author_id: String,
    pub is_active: bool,
    pub total_votes: u32,
    pub created_at: String,
    pub updated_at: String,
    pub expires_at: Option<String>,
}

pub struct OptionRow {
    pub id: String,
    pub poll_id: String,
    pub position: u32,
    pub text: String,
    pub votes: u32,
    pub percentage: u32,
}

pub struct VoteRow {
    pub id: String,
    pub poll_id: String,
    pub option_id: String,
    pub user_id: String,
    pub created_at: String,
}

/// Fixed-width UTC so that lexical order matches chronological order.
pub fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_time(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Corrupt timestamp '{}'", raw))?;
    Ok(parsed.with_timezone(&Utc))
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: encode_time(user.created_at),
        }
    }
}

impl UserRow {
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            created_at: decode_time(&self.created_at)?,
            id: self.id,
            name: self.name,
            email: self.email,
        })
    }
}

impl From<&Poll> for PollRow {
    fn from(poll: &Poll) -> Self {
        Self {
            id: poll.id.clone(),
            question: poll.question.clone(),
            description: poll.description.clone(),
            category: poll.category.clone(),
            author_id: poll.author_id.clone(),
            is_active: poll.is_active,
            total_votes: poll.total_votes,
            created_at: encode_time(poll.created_at),
            updated_at: encode_time(poll.updated_at),
            expires_at: poll.expires_at.map(encode_time),
        }
    }
}

impl PollRow {
    /// Rebuild a poll from its row and its option rows, which must already be
    /// in position order.
    pub fn into_poll(self, options: Vec<OptionRow>) -> Result<Poll> {
        Ok(Poll {
            created_at: decode_time(&self.created_at)?,
            updated_at: decode_time(&self.updated_at)?,
            expires_at: self.expires_at.as_deref().map(decode_time).transpose()?,
            options: options
                .into_iter()
                .map(|o| PollOption {
                    id: o.id,
                    text: o.text,
                    votes: o.votes,
                    percentage: o.percentage,
                })
                .collect(),
            id: self.id,
            question: self.question,
            description: self.description,
            category: self.category,
            author_id: self.author_id,
            is_active: self.is_active,
            total_votes: self.total_votes,
        })
    }
}

impl OptionRow {
    pub fn for_poll(poll: &Poll) -> Vec<Self> {
        poll.options
            .iter()
            .enumerate()
            .map(|(position, o)| Self {
                id: o.id.clone(),
                poll_id: poll.id.clone(),
                position: position as u32,
                text: o.text.clone(),
                votes: o.votes,
                percentage: o.percentage,
            })
            .collect()
    }
}

impl From<&Vote> for VoteRow {
    fn from(vote: &Vote) -> Self {
        Self {
            id: vote.id.clone(),
            poll_id: vote.poll_id.clone(),
            option_id: vote.option_id.clone(),
            user_id: vote.user_id.clone(),
            created_at: encode_time(vote.created_at),
        }
    }
}

impl VoteRow {
    pub fn into_vote(self) -> Result<Vote> {
        Ok(Vote {
            created_at: decode_time(&self.created_at)?,
            id: self.id,
            poll_id: self.poll_id,
            option_id: self.option_id,
            user_id: self.user_id,
        })
    }
}
