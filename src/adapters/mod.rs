//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `collaborator` - Hosted backend (auth, storage, records): in-memory and REST
//! - `slot` - Tab-scoped key/value slot

pub mod collaborator;
pub mod slot;

pub use collaborator::{InMemoryCollaborator, RestCollaborator, RestCollaboratorConfig};
pub use slot::InMemorySessionSlot;
