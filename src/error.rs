use thiserror::Error;

/// Errors that can occur while loading a workflow document.
///
/// These are the only hard failures of the engine. Everything inside a loaded
/// workflow (conditions, validation rules, step references) degrades gracefully.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Workflow document must be an array of steps, found {found}")]
    NotASequence { found: &'static str },

    #[error("Failed to parse workflow JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by a document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Workflow '{workflow_id}' not found")]
    NotFound { workflow_id: String },

    #[error("Invalid workflow document: {0}")]
    Schema(#[from] SchemaError),

    #[error("Invalid workflow JSON stored for '{workflow_id}': {source}")]
    Corrupt {
        workflow_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database error: {0}")]
    Database(String),
}

/// Errors raised by a session store when reading or writing snapshot blobs.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Session blob is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Names the JSON type of a value for error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Errors that stop the HTTP server from starting or running.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
