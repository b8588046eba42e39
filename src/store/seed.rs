use super::DocumentStore;
use crate::error::StoreError;
use serde_json::Value;
use tracing::info;

/// The bundled registration workflow.
pub const REGISTER_WORKFLOW: &str = include_str!("../../data/workflows/register.json");

/// The bundled login workflow.
pub const LOGIN_WORKFLOW: &str = include_str!("../../data/workflows/login.json");

/// The bundled documents as `(workflow_id, document)` pairs.
pub fn seed_documents() -> Result<Vec<(&'static str, Value)>, StoreError> {
    let mut out = Vec::with_capacity(2);
    for (workflow_id, json) in [("register", REGISTER_WORKFLOW), ("login", LOGIN_WORKFLOW)] {
        let document = serde_json::from_str(json).map_err(|source| StoreError::Corrupt {
            workflow_id: workflow_id.to_string(),
            source,
        })?;
        out.push((workflow_id, document));
    }
    Ok(out)
}

/// Inserts the bundled documents when the store holds nothing yet.
/// Returns how many documents were written.
pub async fn seed_if_empty<S: DocumentStore + ?Sized>(store: &S) -> Result<usize, StoreError> {
    if !store.list().await?.is_empty() {
        return Ok(0);
    }
    let documents = seed_documents()?;
    let count = documents.len();
    for (workflow_id, document) in documents {
        store.upsert(workflow_id, document).await?;
    }
    info!(count, "seeded empty store");
    Ok(count)
}
