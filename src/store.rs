use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::ahsp::ProjectRollup;
use crate::model::LineItem;
use crate::util::{ensure_parent_directory, now_utc_string};

const STORE_SCHEMA_VERSION: &str = "1";

/// Append-only project bill persisted between command runs.
pub struct ProjectStore {
    connection: Connection,
}

impl ProjectStore {
    pub fn open(path: &Path) -> Result<Self> {
        ensure_parent_directory(path)?;
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().context("failed to open in-memory store")?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Returns the sequence number assigned to the new line.
    pub fn append(&mut self, line_item: &LineItem) -> Result<i64> {
        let payload =
            serde_json::to_string(line_item).context("failed to serialize line item")?;
        let now = now_utc_string();

        let tx = self.connection.transaction()?;
        tx.execute(
            "INSERT INTO line_items(code, volume, line_total, added_at, payload)
             VALUES(?1, ?2, ?3, ?4, ?5)",
            params![
                &line_item.code,
                line_item.volume,
                line_item.line_total,
                &now,
                payload
            ],
        )
        .with_context(|| format!("failed to append line item {}", line_item.code))?;
        let seq = tx.last_insert_rowid();
        touch_updated_at(&tx, &now)?;
        tx.commit()?;

        debug!(seq, code = %line_item.code, "line item stored");
        Ok(seq)
    }

    pub fn clear(&mut self) -> Result<usize> {
        let tx = self.connection.transaction()?;
        let removed = tx
            .execute("DELETE FROM line_items", [])
            .context("failed to clear line items")?;
        touch_updated_at(&tx, &now_utc_string())?;
        tx.commit()?;
        Ok(removed)
    }

    /// Line items in the order they were added.
    pub fn load_rollup(&self) -> Result<ProjectRollup> {
        let mut statement = self
            .connection
            .prepare("SELECT seq, payload FROM line_items ORDER BY seq")?;

        let mut rows = statement.query([])?;
        let mut rollup = ProjectRollup::new();
        while let Some(row) = rows.next()? {
            let seq: i64 = row.get(0)?;
            let payload: String = row.get(1)?;
            let line_item: LineItem = serde_json::from_str(&payload)
                .with_context(|| format!("failed to parse stored line item {seq}"))?;
            rollup.append(line_item);
        }

        Ok(rollup)
    }

    pub fn line_count(&self) -> Result<i64> {
        let count = self
            .connection
            .query_row("SELECT COUNT(*) FROM line_items", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .connection
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("failed to read metadata key {key}"))?;
        Ok(value)
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS line_items (
          seq INTEGER PRIMARY KEY AUTOINCREMENT,
          code TEXT NOT NULL,
          volume REAL NOT NULL,
          line_total REAL NOT NULL,
          added_at TEXT NOT NULL,
          payload TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_line_items_code ON line_items(code);
        ",
    )?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('store_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [STORE_SCHEMA_VERSION],
    )?;

    Ok(())
}

fn touch_updated_at(connection: &Connection, now: &str) -> Result<()> {
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('project_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;
    Ok(())
}
