//! SQLite database handle and schema migrations

mod seeds;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub use seeds::{seed_settings, DEFAULT_SETTINGS};

/// Schema statements, applied in order; each must be idempotent
const MIGRATIONS: &[(&str, &str)] = &[(
    "create_settings_table",
    "CREATE TABLE IF NOT EXISTS settings (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        key         TEXT NOT NULL UNIQUE,
        value       TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL,
        deleted_at  TEXT
    )",
)];

/// Shared connection to the site database
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (creating if needed) the database file and run migrations
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
        }

        let conn =
            Connection::open(path).with_context(|| format!("Failed to open database {:?}", path))?;
        tracing::debug!("Opened database {:?}", path);
        Self::with_connection(conn)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Apply all migrations
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock().map_err(|e| anyhow::anyhow!(e))?;
        for (name, sql) in MIGRATIONS {
            conn.execute_batch(sql)
                .with_context(|| format!("Migration {} failed", name))?;
            tracing::debug!("Migrated: {}", name);
        }
        Ok(())
    }

    /// Exclusive access to the connection
    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, String> {
        self.conn
            .lock()
            .map_err(|_| "database connection lock poisoned".to_string())
    }
}
