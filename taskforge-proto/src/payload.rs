//! Serialization of task collections for persistence and sync.
//!
//! One codec serves the two on-disk task files, export/import files, and
//! the content blob pushed to the remote paste service: a pretty-printed
//! JSON array of task records with RFC 3339 timestamps and absent optional
//! fields serialized as null.

use crate::task::Task;

/// Error type for payload encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// Serialization or deserialization failed.
    #[error("payload serialization error: {0}")]
    Serialization(String),
}

/// Encodes a task collection as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns `PayloadError::Serialization` if the tasks cannot be serialized.
pub fn encode_tasks(tasks: &[Task]) -> Result<String, PayloadError> {
    serde_json::to_string_pretty(tasks).map_err(|e| PayloadError::Serialization(e.to_string()))
}

/// Decodes a task collection from a JSON array.
///
/// Task ids are taken verbatim from the payload; no fresh ids are assigned
/// and no field validation is applied beyond structural correctness.
///
/// # Errors
///
/// Returns `PayloadError::Serialization` if the content is not a valid
/// task array.
pub fn decode_tasks(content: &str) -> Result<Vec<Task>, PayloadError> {
    serde_json::from_str(content).map_err(|e| PayloadError::Serialization(e.to_string()))
}
