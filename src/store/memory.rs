use super::{DocumentStore, WorkflowSummary, decode_stored, ensure_sequence};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::info;

struct Row {
    json: String,
    updated_at: DateTime<Utc>,
}

/// A process-local document store. Rows are kept ordered by workflow id.
#[derive(Default)]
pub struct MemoryDocumentStore {
    rows: Mutex<BTreeMap<String, Row>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Row>>, StoreError> {
        self.rows
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, workflow_id: &str) -> BoxFuture<'_, Result<Value, StoreError>> {
        let workflow_id = workflow_id.to_string();
        Box::pin(async move {
            let json = {
                let rows = self.lock()?;
                match rows.get(&workflow_id) {
                    Some(row) => row.json.clone(),
                    None => return Err(StoreError::NotFound { workflow_id }),
                }
            };
            decode_stored(&workflow_id, &json)
        })
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<WorkflowSummary>, StoreError>> {
        Box::pin(async move {
            let rows = self.lock()?;
            Ok(rows
                .iter()
                .map(|(workflow_id, row)| WorkflowSummary {
                    workflow_id: workflow_id.clone(),
                    updated_at: row.updated_at,
                })
                .collect())
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
            let now = Utc::now();
            let mut rows = self.lock()?;
            match rows.get_mut(&workflow_id) {
                Some(row) => {
                    row.json = json;
                    row.updated_at = now;
                }
                None => {
                    rows.insert(
                        workflow_id.clone(),
                        Row {
                            json,
                            updated_at: now,
                        },
                    );
                }
            }
            info!(workflow_id = %workflow_id, "workflow saved");
            Ok(())
        })
    }
}
