//! Persistence of workflow documents.
//!
//! A [`DocumentStore`] keeps raw workflow JSON keyed by workflow id. Writes
//! replace the whole document (last write wins) and are rejected unless the
//! root is an array of steps. Reads hand back the document with missing step
//! identifiers filled in.

mod memory;
mod seed;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryDocumentStore;
pub use seed::{LOGIN_WORKFLOW, REGISTER_WORKFLOW, seed_documents, seed_if_empty};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDocumentStore;

use crate::error::{SchemaError, StoreError, json_type_name};
use crate::schema::{Workflow, normalize_identifiers};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One row of a store listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSummary {
    pub workflow_id: String,
    pub updated_at: DateTime<Utc>,
}

/// Keyed storage for workflow documents.
pub trait DocumentStore: Send + Sync {
    /// Fetches a document, normalized. Fails with [`StoreError::NotFound`].
    fn get(&self, workflow_id: &str) -> BoxFuture<'_, Result<Value, StoreError>>;

    /// Lists stored workflows ordered by id.
    fn list(&self) -> BoxFuture<'_, Result<Vec<WorkflowSummary>, StoreError>>;

    /// Replaces (or creates) a document.
    fn upsert(&self, workflow_id: &str, document: Value) -> BoxFuture<'_, Result<(), StoreError>>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    fn get(&self, workflow_id: &str) -> BoxFuture<'_, Result<Value, StoreError>> {
        (**self).get(workflow_id)
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<WorkflowSummary>, StoreError>> {
        (**self).list()
    }

    fn upsert(&self, workflow_id: &str, document: Value) -> BoxFuture<'_, Result<(), StoreError>> {
        (**self).upsert(workflow_id, document)
    }
}

/// Fetches and loads a workflow in one go.
pub async fn load_workflow<S: DocumentStore + ?Sized>(
    store: &S,
    workflow_id: &str,
) -> Result<Workflow, StoreError> {
    let document = store.get(workflow_id).await?;
    Ok(Workflow::from_value(document)?)
}

/// Rejects documents whose root is not an array of steps.
pub(crate) fn ensure_sequence(document: &Value) -> Result<(), StoreError> {
    if document.is_array() {
        Ok(())
    } else {
        Err(SchemaError::NotASequence {
            found: json_type_name(document),
        }
        .into())
    }
}

/// Parses a stored blob and fills in missing step identifiers.
pub(crate) fn decode_stored(workflow_id: &str, json: &str) -> Result<Value, StoreError> {
    let mut document: Value =
        serde_json::from_str(json).map_err(|source| StoreError::Corrupt {
            workflow_id: workflow_id.to_string(),
            source,
        })?;
    normalize_identifiers(&mut document)?;
    Ok(document)
}
