//! Media uploads attached to tour listings.
//!
//! Size and MIME checks happen here, when a file is staged, so an
//! oversized or unsupported file never reaches storage.

mod upload;

pub use upload::{FileUpload, MediaKind, UploadLimits};
