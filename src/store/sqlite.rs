use super::{DocumentStore, WorkflowSummary, decode_stored, ensure_sequence};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS workflows (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        workflow_id TEXT NOT NULL UNIQUE,
        json TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );";

/// SQLite-backed document store using the `workflows` table.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Database(format!("Failed to create db directory: {}", e))
            })?;
        }

        let conn = Connection::open(path).map_err(db_error)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(db_error)?;
        conn.execute_batch(SCHEMA).map_err(db_error)?;

        debug!(path = %path.display(), "SQLite document store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        conn.execute_batch(SCHEMA).map_err(db_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

fn db_error(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Database(format!("Bad timestamp '{}': {}", text, e)))
}

impl DocumentStore for SqliteDocumentStore {
    fn get(&self, workflow_id: &str) -> BoxFuture<'_, Result<Value, StoreError>> {
        let workflow_id = workflow_id.to_string();
        Box::pin(async move {
            let json: Option<String> = {
                let conn = self.lock()?;
                conn.query_row(
                    "SELECT json FROM workflows WHERE workflow_id = ?1",
                    params![workflow_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_error)?
            };
            match json {
                Some(json) => decode_stored(&workflow_id, &json),
                None => Err(StoreError::NotFound { workflow_id }),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<WorkflowSummary>, StoreError>> {
        Box::pin(async move {
            let conn = self.lock()?;
            let mut stmt = conn
                .prepare("SELECT workflow_id, updated_at FROM workflows ORDER BY workflow_id ASC")
                .map_err(db_error)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
                .map_err(db_error)?;

            let mut out = Vec::new();
            for row in rows {
                let (workflow_id, updated_at) = row.map_err(db_error)?;
                out.push(WorkflowSummary {
                    workflow_id,
                    updated_at: parse_timestamp(&updated_at)?,
                });
            }
            Ok(out)
        })
    }

    fn upsert(&self, workflow_id: &str, document: Value) -> BoxFuture<'_, Result<(), StoreError>> {
        let workflow_id = workflow_id.to_string();
        Box::pin(async move {
            ensure_sequence(&document)?;
            let json = serde_json::to_string(&document).map_err(|source| StoreError::Corrupt {
                workflow_id: workflow_id.clone(),
                source,
            })?;
            let now = Utc::now().to_rfc3339();
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO workflows (workflow_id, json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(workflow_id) DO UPDATE SET json = excluded.json, updated_at = excluded.updated_at",
                params![workflow_id, json, now],
            )
            .map_err(db_error)?;
            info!(workflow_id = %workflow_id, "workflow saved");
            Ok(())
        })
    }
}
