use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS polls (
            id          TEXT PRIMARY KEY,
            question    TEXT NOT NULL,
            description TEXT,
            category    TEXT NOT NULL,
            author_id   TEXT NOT NULL REFERENCES users(id),
            is_active   INTEGER NOT NULL DEFAULT 1,
            total_votes INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL,
            expires_at  TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_polls_author
            ON polls(author_id);

        CREATE TABLE IF NOT EXISTS poll_options (
            id          TEXT PRIMARY KEY,
            poll_id     TEXT NOT NULL REFERENCES polls(id),
            position    INTEGER NOT NULL,
            text        TEXT NOT NULL,
            votes       INTEGER NOT NULL DEFAULT 0,
            percentage  INTEGER NOT NULL DEFAULT 0,
            UNIQUE(poll_id, position)
        );

        -- One row per (poll, user); a revote rewrites option_id in place
        CREATE TABLE IF NOT EXISTS votes (
            id          TEXT PRIMARY KEY,
            poll_id     TEXT NOT NULL REFERENCES polls(id),
            option_id   TEXT NOT NULL REFERENCES poll_options(id),
            user_id     TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            UNIQUE(poll_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_votes_poll
            ON votes(poll_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
