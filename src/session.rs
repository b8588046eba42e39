//! Session persistence for workflow runs.
//!
//! A run persists three string blobs under one session key:
//! `<key>:values` (the value set as a JSON object), `<key>:step` (the current
//! step index) and, once a terminal step is reached, `<key>:submission`.
//! The engine only talks to a [`SessionStore`]; the medium is up to the caller.

use crate::error::SessionError;
use crate::value::ValueSet;
use ahash::AHashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// The session key used when none is configured.
pub const DEFAULT_SESSION_KEY: &str = "form.flow";

/// Keyed string storage for session blobs.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, key: &str, blob: &str) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), SessionError> {
        (**self).set(key, blob)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        (**self).remove(key)
    }
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), SessionError> {
        (**self).set(key, blob)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        (**self).remove(key)
    }
}

/// The three blob keys derived from one session key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    pub values: String,
    pub step: String,
    pub submission: String,
}

impl SessionKeys {
    pub fn new(session_key: &str) -> Self {
        Self {
            values: format!("{}:values", session_key),
            step: format!("{}:step", session_key),
            submission: format!("{}:submission", session_key),
        }
    }
}

/// Everything persisted for one session key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub values: Option<ValueSet>,
    pub step: Option<usize>,
    pub submission: Option<ValueSet>,
}

impl SessionSnapshot {
    /// Reads all three blobs. Missing blobs read as `None`; a malformed value
    /// or submission blob is an error, a malformed step index reads as `None`.
    pub fn load<S: SessionStore + ?Sized>(store: &S, session_key: &str) -> Result<Self, SessionError> {
        let keys = SessionKeys::new(session_key);
        let values = match store.get(&keys.values)? {
            Some(blob) => serde_json::from_str::<Option<ValueSet>>(&blob)?,
            None => None,
        };
        let submission = match store.get(&keys.submission)? {
            Some(blob) => serde_json::from_str::<Option<ValueSet>>(&blob)?,
            None => None,
        };
        let step = store
            .get(&keys.step)?
            .and_then(|blob| blob.trim().parse::<usize>().ok());
        Ok(Self {
            values,
            step,
            submission,
        })
    }

    /// Removes all three blobs.
    pub fn clear<S: SessionStore + ?Sized>(store: &S, session_key: &str) -> Result<(), SessionError> {
        let keys = SessionKeys::new(session_key);
        store.remove(&keys.values)?;
        store.remove(&keys.step)?;
        store.remove(&keys.submission)
    }
}

/// An in-process session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    blobs: Mutex<AHashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, AHashMap<String, String>>, SessionError> {
        self.blobs
            .lock()
            .map_err(|e| SessionError::Storage(e.to_string()))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), SessionError> {
        self.lock()?.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Stores each blob as a file in a directory. Used by the terminal runner so
/// a run can be resumed across invocations.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::Storage(e.to_string())),
        }
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), SessionError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            SessionError::Storage(format!("Failed to create session directory: {}", e))
        })?;
        std::fs::write(self.path_for(key), blob).map_err(|e| SessionError::Storage(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Storage(e.to_string())),
        }
    }
}
