use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::models::ConfigItem;

/// Keys whose values are whole seconds.
pub const SECONDS_CONFIGS: [&str; 2] = ["toast_secs", "request_timeout_secs"];

/// Config keys the client understands, with a short description for each.
pub const KNOWN_CONFIGS: [(&str, &str); 5] = [
    ("base_url", "Base URL of the maintenance API"),
    ("toast_secs", "Seconds a notification stays visible"),
    ("kanban_data", "Path of the kanban board payload (JSON)"),
    ("request_timeout_secs", "HTTP request timeout in seconds (unset = none)"),
    ("log_file", "Path of the log file"),
];

pub fn default_db_path() -> PathBuf {
    let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home_dir).join(".gear-guard.db")
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open config database {}", path.display()))?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Store a value without key validation.
    #[cfg(test)]
    pub fn raw_set(&self, key: &str, value: &str) {
        self.conn
            .execute(
                "INSERT INTO configs (key_name, value) VALUES (?1, ?2)
                 ON CONFLICT(key_name) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .unwrap();
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS configs (
                key_name TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                description TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(Database { conn })
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        if SECONDS_CONFIGS.contains(&key) && value.trim().parse::<u64>().is_err() {
            bail!("config '{key}' must be a whole number of seconds, got '{value}'");
        }
        let description = KNOWN_CONFIGS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, d)| *d);
        if description.is_none() {
            log::warn!("storing unrecognized config key '{}'", key);
        }
        self.conn.execute(
            "INSERT INTO configs (key_name, value, description) VALUES (?1, ?2, ?3)
             ON CONFLICT(key_name) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value, description],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM configs WHERE key_name = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Returns whether a row was removed.
    pub fn delete_config(&self, key: &str) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM configs WHERE key_name = ?1", [key])?;
        Ok(removed > 0)
    }

    pub fn get_all_configs(&self) -> Result<Vec<ConfigItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT key_name, value, description, created_at, updated_at FROM configs ORDER BY key_name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ConfigItem {
                key_name: row.get(0)?,
                value: row.get(1)?,
                description: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?;

        let mut configs = Vec::new();
        for row in rows {
            configs.push(row?);
        }
        Ok(configs)
    }
}
