//! # formflow - Declarative Multi-Step Form Engine
//!
//! **formflow** runs multi-step forms described entirely by JSON "workflow"
//! documents. A workflow is an array of steps; each step holds a tree of
//! sections and fields carrying visibility conditions and validation rules.
//! The engine decides, for any document and any set of answers, which fields
//! are visible, which are required, whether a step may advance and what the
//! final submission looks like.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: parse a document with [`Workflow::from_json`] (or fetch one from a
//!     [`store::DocumentStore`]). Loading is tolerant; only a non-array root or
//!     invalid JSON fails.
//! 2.  **Start a run**: build a [`Navigator`] over the workflow and a
//!     [`session::SessionStore`]. Defaults are seeded and any persisted session resumes.
//! 3.  **Answer and advance**: record values with `set_value`, then call `advance`.
//!     Each call returns a [`Transition`]: moved, blocked (with the field to focus),
//!     stayed, or completed with the submission snapshot.
//!
//! ## Quick Start
//!
//! ```rust
//! use formflow::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let workflow = Workflow::from_json(formflow::store::LOGIN_WORKFLOW)?;
//! let mut nav = Navigator::builder(workflow, MemorySessionStore::new()).build();
//!
//! nav.set_value("method", "username");
//! nav.set_value("username", "john_doe");
//! nav.set_value("password", "abc12345");
//!
//! match nav.advance() {
//!     Transition::Completed(submission) => println!("submitted {} answers", submission.len()),
//!     other => println!("not done yet: {:?}", other),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The building blocks are usable on their own: [`condition::evaluate`],
//! [`validation::validate`] and [`visibility::collect_visible_fields`] are
//! pure functions over a node and a [`ValueSet`].

pub mod condition;
pub mod error;
pub mod navigation;
pub mod options;
pub mod prelude;
pub mod schema;
pub mod session;
pub mod store;
pub mod validation;
pub mod value;
pub mod visibility;

#[cfg(feature = "server")]
pub mod server;

pub use navigation::{Navigator, Transition};
pub use schema::Workflow;
pub use value::ValueSet;
