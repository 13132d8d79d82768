//! Collaborator adapters.
//!
//! The hosted backend exposes auth, storage and records behind one
//! endpoint, so each adapter implements all three collaborator ports.
//!
//! - `InMemoryCollaborator` - deterministic fake with test hooks
//! - `RestCollaborator` - HTTP client for the hosted REST surface

mod in_memory;
mod rest;

pub use in_memory::{InMemoryCollaborator, Operation, SentMail, SentMailKind};
pub use rest::{RestCollaborator, RestCollaboratorConfig};
