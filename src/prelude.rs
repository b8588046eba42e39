//! Prelude module for convenient imports
//!
//! Re-exports the types most programs need to load a workflow and drive a run.
//!
//! # Example
//!
//! ```rust,no_run
//! use formflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/workflow.json")?;
//! let workflow = Workflow::from_json(&json)?;
//!
//! let nav = Navigator::builder(workflow, MemorySessionStore::new())
//!     .with_session_key("signup")
//!     .build();
//! for field in nav.visible_fields() {
//!     println!("{}: {:?}", field.identifier, nav.check_field(field));
//! }
//! # Ok(())
//! # }
//! ```

// Engine
pub use crate::navigation::{Navigator, StepValidity, Transition};
pub use crate::validation::{Rule, Validator, Violation};

// Schema and values
pub use crate::schema::{Condition, Field, Node, Step, Workflow};
pub use crate::value::{Operand, ValueSet};

// Persistence
pub use crate::session::{MemorySessionStore, SessionSnapshot, SessionStore};
pub use crate::store::{DocumentStore, MemoryDocumentStore};

// Error types
pub use crate::error::{SchemaError, SessionError, StoreError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
