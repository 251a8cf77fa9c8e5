use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use super::schema::kv_entries;
use super::Storage;
use crate::error::{HookPromptError, Result};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[derive(Insertable)]
#[diesel(table_name = kv_entries)]
struct NewKvEntry<'a> {
    key: &'a str,
    value: &'a str,
    updated_at: i64,
}

/// SQLite-backed [`Storage`]. One row per key; writes replace the row.
pub struct SqliteStorage {
    conn: Mutex<SqliteConnection>,
}

impl SqliteStorage {
    pub fn open(sqlite_path: impl AsRef<str>) -> Result<Self> {
        let sqlite_path = sqlite_path.as_ref();
        ensure_parent_dir(sqlite_path)?;

        let mut conn = SqliteConnection::establish(sqlite_path)
            .map_err(|e| HookPromptError::Storage(e.to_string()))?;
        diesel::sql_query("PRAGMA busy_timeout = 5000")
            .execute(&mut conn)
            .map_err(|e| HookPromptError::Storage(e.to_string()))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| HookPromptError::Storage(e.to_string()))?;

        tracing::debug!(path = %sqlite_path, "Opened key-value store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, SqliteConnection>> {
        self.conn
            .lock()
            .map_err(|_| HookPromptError::Storage("store connection poisoned".to_string()))
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn()?;
        kv_entries::table
            .find(key)
            .select(kv_entries::value)
            .first::<String>(&mut *conn)
            .optional()
            .map_err(|e| HookPromptError::Storage(e.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let row = NewKvEntry {
            key,
            value,
            updated_at: now_ts(),
        };
        diesel::replace_into(kv_entries::table)
            .values(&row)
            .execute(&mut *conn)
            .map_err(|e| HookPromptError::Storage(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::delete(kv_entries::table.find(key))
            .execute(&mut *conn)
            .map_err(|e| HookPromptError::Storage(e.to_string()))?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HookPromptError::Storage(e.to_string()))?;
        }
    }
    Ok(())
}

fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
