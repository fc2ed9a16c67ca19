//! Database schema migrations.
//!
//! Applies the initial schema: products, comments, problems,
//! problem_clusters, and the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use squarium_core::error::SquariumError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), SquariumError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| SquariumError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| SquariumError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema. Timestamps are Unix epoch milliseconds.
fn apply_v1(conn: &Connection) -> Result<(), SquariumError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS products (
            id              TEXT PRIMARY KEY NOT NULL,
            ph_id           TEXT NOT NULL UNIQUE,
            name            TEXT NOT NULL DEFAULT '',
            tagline         TEXT NOT NULL DEFAULT '',
            description     TEXT NOT NULL DEFAULT '',
            category        TEXT NOT NULL DEFAULT 'General',
            votes           INTEGER NOT NULL DEFAULT 0,
            url             TEXT NOT NULL DEFAULT '',
            launch_date     TEXT NOT NULL,
            created_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS comments (
            id              TEXT PRIMARY KEY NOT NULL,
            ph_comment_id   TEXT NOT NULL UNIQUE,
            product_id      TEXT NOT NULL,
            author          TEXT NOT NULL DEFAULT '',
            body            TEXT NOT NULL DEFAULT '',
            upvotes         INTEGER NOT NULL DEFAULT 0,
            posted_at       INTEGER NOT NULL,
            FOREIGN KEY (product_id) REFERENCES products(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_comments_product
            ON comments (product_id);

        CREATE TABLE IF NOT EXISTS problems (
            id                TEXT PRIMARY KEY NOT NULL,
            product_id        TEXT NOT NULL,
            comment_id        TEXT,
            problem_text      TEXT NOT NULL,
            confidence_score  REAL NOT NULL
                              CHECK (confidence_score >= 0.0 AND confidence_score <= 1.0),
            category          TEXT NOT NULL,
            example_quote     TEXT NOT NULL DEFAULT '',
            embedding         TEXT,
            created_at        INTEGER NOT NULL,
            FOREIGN KEY (product_id) REFERENCES products(id) ON DELETE CASCADE,
            FOREIGN KEY (comment_id) REFERENCES comments(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_problems_category
            ON problems (category, created_at ASC);

        CREATE TABLE IF NOT EXISTS problem_clusters (
            id               TEXT PRIMARY KEY NOT NULL,
            cluster_key      TEXT,
            cluster_title    TEXT NOT NULL,
            cluster_summary  TEXT NOT NULL DEFAULT '',
            mention_count    INTEGER NOT NULL CHECK (mention_count >= 1),
            avg_confidence   REAL NOT NULL,
            recency_score    REAL NOT NULL,
            rank_score       REAL NOT NULL,
            category         TEXT NOT NULL,
            created_at       INTEGER NOT NULL,
            updated_at       INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_clusters_title
            ON problem_clusters (category, cluster_title);

        CREATE INDEX IF NOT EXISTS idx_clusters_key
            ON problem_clusters (category, cluster_key)
            WHERE cluster_key IS NOT NULL;

        CREATE INDEX IF NOT EXISTS idx_clusters_rank
            ON problem_clusters (rank_score DESC);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| SquariumError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
