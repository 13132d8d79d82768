//! Record store port for the hosted tables.
//!
//! Records travel as JSON objects; typed mapping is done by the record
//! services in the application layer.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during record operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Record '{id}' not found in {collection}")]
    NotFound { collection: String, id: String },

    /// Rejected by a constraint or row policy.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The payload or response was not a JSON object.
    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

/// Sort direction for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Equality filter with optional ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub equals: Vec<(String, Value)>,
    pub order_by: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    /// Matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if `record` satisfies every equality clause.
    pub fn matches(&self, record: &Value) -> bool {
        self.equals
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

/// CRUD over named collections. Every record has a string `id` field.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query(&self, collection: &str, filter: &RecordFilter) -> Result<Vec<Value>, RecordError>;

    /// Inserts and returns the stored row.
    async fn insert(&self, collection: &str, record: Value) -> Result<Value, RecordError>;

    /// Merges `patch` into the row with `id` and returns the stored row.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value, RecordError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RecordError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matches_all_clauses() {
        let filter = RecordFilter::all().eq("status", "published").eq("host_id", "h1");
        assert!(filter.matches(&json!({"status": "published", "host_id": "h1"})));
        assert!(!filter.matches(&json!({"status": "draft", "host_id": "h1"})));
        assert!(!filter.matches(&json!({"status": "published"})));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(RecordFilter::all().matches(&json!({"id": "x"})));
    }
}
