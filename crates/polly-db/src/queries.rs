use std::collections::HashMap;

use crate::Database;
use crate::models::{OptionRow, PollRow, UserRow, VoteRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};

/// Which polls a query touches. Options are always fetched with the same scope
/// in one extra query, never one per poll.
#[derive(Clone, Copy)]
enum PollScope<'a> {
    All,
    Id(&'a str),
    Author(&'a str),
}

impl PollScope<'_> {
    fn where_clause(&self) -> &'static str {
        match self {
            Self::All => "",
            Self::Id(_) => "WHERE p.id = ?1",
            Self::Author(_) => "WHERE p.author_id = ?1",
        }
    }

    fn params(&self) -> Vec<&dyn ToSql> {
        match self {
            Self::All => vec![],
            Self::Id(id) | Self::Author(id) => vec![id as &dyn ToSql],
        }
    }
}

impl Database {
    // -- Users --

    pub fn insert_user_row(&self, user: &UserRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![user.id, user.name, user.email, user.created_at],
            )?;
            Ok(())
        })
    }

    pub fn get_user_row(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, email, created_at FROM users WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(UserRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            email: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn count_user_rows(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    // -- Polls --

    pub fn insert_poll_rows(&self, poll: &PollRow, options: &[OptionRow]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO polls (id, question, description, category, author_id, is_active,
                                    total_votes, created_at, updated_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    poll.id,
                    poll.question,
                    poll.description,
                    poll.category,
                    poll.author_id,
                    poll.is_active,
                    poll.total_votes,
                    poll.created_at,
                    poll.updated_at,
                    poll.expires_at,
                ],
            )?;
            for option in options {
                tx.execute(
                    "INSERT INTO poll_options (id, poll_id, position, text, votes, percentage)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        option.id,
                        option.poll_id,
                        option.position,
                        option.text,
                        option.votes,
                        option.percentage,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_poll_rows(&self, id: &str) -> Result<Option<(PollRow, Vec<OptionRow>)>> {
        let mut polls = self.with_conn(|conn| query_polls(conn, PollScope::Id(id)))?;
        Ok(polls.pop())
    }

    pub fn list_poll_rows(&self) -> Result<Vec<(PollRow, Vec<OptionRow>)>> {
        self.with_conn(|conn| query_polls(conn, PollScope::All))
    }

    pub fn poll_rows_by_author(&self, author_id: &str) -> Result<Vec<(PollRow, Vec<OptionRow>)>> {
        self.with_conn(|conn| query_polls(conn, PollScope::Author(author_id)))
    }

    /// Write back the mutable poll fields and every option's derived counts
    /// in a single transaction.
    pub fn update_poll_rows(&self, poll: &PollRow, options: &[OptionRow]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE polls SET is_active = ?2, total_votes = ?3, updated_at = ?4 WHERE id = ?1",
                params![poll.id, poll.is_active, poll.total_votes, poll.updated_at],
            )?;
            for option in options {
                tx.execute(
                    "UPDATE poll_options SET votes = ?3, percentage = ?4 WHERE id = ?1 AND poll_id = ?2",
                    params![option.id, option.poll_id, option.votes, option.percentage],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    // -- Votes --

    pub fn find_vote_row(&self, poll_id: &str, user_id: &str) -> Result<Option<VoteRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, poll_id, option_id, user_id, created_at
                     FROM votes WHERE poll_id = ?1 AND user_id = ?2",
                    [poll_id, user_id],
                    vote_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn insert_vote_row(&self, vote: &VoteRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO votes (id, poll_id, option_id, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![vote.id, vote.poll_id, vote.option_id, vote.user_id, vote.created_at],
            )?;
            Ok(())
        })
    }

    pub fn update_vote_row(&self, vote: &VoteRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE votes SET option_id = ?2, created_at = ?3 WHERE id = ?1",
                params![vote.id, vote.option_id, vote.created_at],
            )?;
            Ok(())
        })
    }

    pub fn vote_rows_for_poll(&self, poll_id: &str) -> Result<Vec<VoteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, poll_id, option_id, user_id, created_at
                 FROM votes WHERE poll_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([poll_id], vote_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn all_vote_rows(&self) -> Result<Vec<VoteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, poll_id, option_id, user_id, created_at FROM votes ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([], vote_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Maintenance --

    /// Drop every poll, option and vote. Users are left in place.
    pub fn clear_polls(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "DELETE FROM votes;
                 DELETE FROM poll_options;
                 DELETE FROM polls;",
            )?;
            Ok(())
        })
    }
}

fn vote_from_row(row: &Row<'_>) -> rusqlite::Result<VoteRow> {
    Ok(VoteRow {
        id: row.get(0)?,
        poll_id: row.get(1)?,
        option_id: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn query_polls(conn: &Connection, scope: PollScope<'_>) -> Result<Vec<(PollRow, Vec<OptionRow>)>> {
    let params = scope.params();

    let mut stmt = conn.prepare(&format!(
        "SELECT p.id, p.question, p.description, p.category, p.author_id, p.is_active,
                p.total_votes, p.created_at, p.updated_at, p.expires_at
         FROM polls p
         {}
         ORDER BY p.rowid",
        scope.where_clause()
    ))?;
    let polls = stmt
        .query_map(params.as_slice(), |row| {
            Ok(PollRow {
                id: row.get(0)?,
                question: row.get(1)?,
                description: row.get(2)?,
                category: row.get(3)?,
                author_id: row.get(4)?,
                is_active: row.get(5)?,
                total_votes: row.get(6)?,
                created_at: row.get(7)?,
                updated_at: row.get(8)?,
                expires_at: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if polls.is_empty() {
        return Ok(vec![]);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT o.id, o.poll_id, o.position, o.text, o.votes, o.percentage
         FROM poll_options o
         JOIN polls p ON p.id = o.poll_id
         {}
         ORDER BY o.poll_id, o.position",
        scope.where_clause()
    ))?;
    let option_rows = stmt
        .query_map(params.as_slice(), |row| {
            Ok(OptionRow {
                id: row.get(0)?,
                poll_id: row.get(1)?,
                position: row.get(2)?,
                text: row.get(3)?,
                votes: row.get(4)?,
                percentage: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut options_by_poll: HashMap<String, Vec<OptionRow>> = HashMap::new();
    for option in option_rows {
        options_by_poll.entry(option.poll_id.clone()).or_default().push(option);
    }

    Ok(polls
        .into_iter()
        .map(|poll| {
            let options = options_by_poll.remove(&poll.id).unwrap_or_default();
            (poll, options)
        })
        .collect())
}
