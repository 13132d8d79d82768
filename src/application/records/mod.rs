//! Typed facades over the record store and file storage.
//!
//! Rows travel as JSON; these services own the mapping to domain records and
//! translate collaborator failures into `DomainError`s.

mod bookings;
mod tours;

pub use bookings::BookingLedger;
pub use tours::TourCatalog;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::ports::{RecordError, StorageError};

pub(crate) const TOURS: &str = "tours";
pub(crate) const BOOKINGS: &str = "bookings";

fn record_error(collection: &str, not_found: ErrorCode, err: RecordError) -> DomainError {
    warn!(collection, error = %err, "record operation failed");
    let mapped = match err {
        RecordError::NotFound { id, .. } => {
            DomainError::new(not_found, "Record not found").with_detail("id", id)
        }
        RecordError::Malformed(message) => DomainError::new(ErrorCode::MalformedRecord, message),
        RecordError::Rejected(message) | RecordError::Unavailable(message) => {
            DomainError::new(ErrorCode::CollaboratorError, message)
        }
    };
    mapped.with_detail("collection", collection)
}

fn storage_error(path: &str, err: StorageError) -> DomainError {
    warn!(path, error = %err, "upload failed");
    DomainError::new(ErrorCode::CollaboratorError, err.to_string()).with_detail("path", path)
}

fn validation_failure(errors: &[ValidationError]) -> DomainError {
    let message = errors
        .iter()
        .map(ValidationError::user_message)
        .collect::<Vec<_>>()
        .join("; ");
    DomainError::new(ErrorCode::ValidationFailed, message)
}

fn encode<T: Serialize>(collection: &str, record: &T) -> Result<Value, DomainError> {
    serde_json::to_value(record).map_err(|err| {
        error!(collection, error = %err, "failed to encode record");
        DomainError::new(ErrorCode::InternalError, err.to_string())
    })
}

fn decode<T: DeserializeOwned>(collection: &str, row: Value) -> Result<T, DomainError> {
    serde_json::from_value(row).map_err(|err| {
        error!(collection, error = %err, "unexpected row shape");
        DomainError::new(ErrorCode::MalformedRecord, err.to_string())
            .with_detail("collection", collection)
    })
}

fn decode_all<T: DeserializeOwned>(collection: &str, rows: Vec<Value>) -> Result<Vec<T>, DomainError> {
    rows.into_iter().map(|row| decode(collection, row)).collect()
}
