//! Database connection management.
//!
//! One rusqlite connection behind a Mutex. File databases run in WAL mode;
//! both kinds are migrated on open.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use tracing::info;

use squarium_core::error::SquariumError;

use crate::migrations;

/// Thread-safe SQLite database wrapper.
///
/// The connection is wrapped in a Mutex since rusqlite Connection is not
/// Sync. Every repository call holds the lock for one closure, which is what
/// makes the select-then-insert upserts atomic within a process.
pub struct Database {
    conn: Mutex<Connection>,
}

const FILE_PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA foreign_keys = ON;
     PRAGMA busy_timeout = 5000;";

const MEMORY_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

impl Database {
    /// Open (or create) a database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self, SquariumError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| {
            SquariumError::Storage(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let db = Self::prepare(conn, FILE_PRAGMAS)?;
        info!(path = %path.display(), "Database ready");
        Ok(db)
    }

    /// Open a private in-memory database with the full schema.
    pub fn in_memory() -> Result<Self, SquariumError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SquariumError::Storage(format!("Failed to open in-memory db: {}", e)))?;
        Self::prepare(conn, MEMORY_PRAGMAS)
    }

    fn prepare(conn: Connection, pragmas: &str) -> Result<Self, SquariumError> {
        conn.execute_batch(pragmas)
            .map_err(|e| SquariumError::Storage(format!("Failed to set pragmas: {}", e)))?;
        register_functions(&conn)?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, SquariumError>
    where
        F: FnOnce(&Connection) -> Result<T, SquariumError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SquariumError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

/// SQL name of the Unicode-aware lower-casing function.
pub const FOLD_CASE_FN: &str = "fold_case";

/// SQLite's own `lower()` and `LIKE` fold ASCII only.
fn register_functions(conn: &Connection) -> Result<(), SquariumError> {
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )
    .map_err(|e| SquariumError::Storage(format!("Failed to register {}: {}", FOLD_CASE_FN, e)))
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM problem_clusters", [], |row| row.get(0))
                .map_err(|e| SquariumError::Storage(e.to_string()))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_fold_case_handles_non_ascii() {
        let db = Database::in_memory().unwrap();
        let (folded, null): (String, Option<String>) = db
            .with_conn(|conn| {
                conn.query_row("SELECT fold_case('ÉCHEC Über'), fold_case(NULL)", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .map_err(|e| SquariumError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(folded, "échec über");
        assert!(null.is_none());
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("squarium.db");
        let db = Database::new(&path).unwrap();

        db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))
                .map_err(|e| SquariumError::Storage(e.to_string()))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_reopen_keeps_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("squarium.db");
        drop(Database::new(&path).unwrap());

        let db = Database::new(&path).unwrap();
        let version: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                    row.get(0)
                })
                .map_err(|e| SquariumError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(version, 1);
    }
}
