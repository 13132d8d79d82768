//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the hosted backend. Adapters implement these ports.
//!
//! ## Collaborator Ports
//!
//! - `AuthGateway` - Accounts, sessions, one-time codes, session-change push
//! - `FileStorage` - Media uploads with public URLs
//! - `RecordStore` - CRUD on named collections
//!
//! ## Local Ports
//!
//! - `SessionSlot` - Tab-scoped key/value slot for the post-sign-in redirect

mod auth_gateway;
mod file_storage;
mod record_store;
mod session_slot;

pub use auth_gateway::{
    AccountCreated, AuthGateway, GatewayError, NewAccount, OtpPurpose, SessionChange,
};
pub use file_storage::{FileStorage, StorageError, StoredFile};
pub use record_store::{RecordError, RecordFilter, RecordStore, SortOrder};
pub use session_slot::SessionSlot;
