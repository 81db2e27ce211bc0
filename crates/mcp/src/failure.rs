// Structured failure results. Every error that happens inside a tool is
// converted to one of these before it crosses the tool boundary; the
// model only ever sees this shape.

use crate::protocol::CallToolResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tally_core::StoreError;

/// Machine-readable classification of a tool failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Validation,
    Internal,
}

/// Uniform failure payload handed back to the caller in place of a raw
/// error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ToolFailure {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::NotFound,
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Validation,
            message: message.into(),
            details: None,
        }
    }

    /// Internal failure with a fixed generic message. The underlying
    /// error is logged server-side and never forwarded.
    pub fn internal() -> Self {
        Self {
            kind: FailureKind::Internal,
            message: "an internal error occurred while executing the tool".to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Render as an error tool result.
    pub fn into_result(self) -> CallToolResult {
        let body = serde_json::to_string_pretty(&self)
            .unwrap_or_else(|_| self.message.clone());
        CallToolResult::error_text(body)
    }
}

impl From<StoreError> for ToolFailure {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => {
                Self::not_found(err.to_string()).with_details(serde_json::json!({ "id": id }))
            }
            StoreError::Validation(message) => Self::validation(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::TodoId;

    #[test]
    fn test_store_error_mapping() {
        let failure: ToolFailure = StoreError::NotFound(TodoId(7)).into();
        assert_eq!(failure.kind, FailureKind::NotFound);
        assert_eq!(failure.message, "todo 7 not found");
        assert_eq!(failure.details, Some(serde_json::json!({ "id": 7 })));

        let failure: ToolFailure = StoreError::Validation("bad title".to_string()).into();
        assert_eq!(failure.kind, FailureKind::Validation);
        assert_eq!(failure.message, "bad title");
    }

    #[test]
    fn test_internal_failure_is_generic() {
        let failure = ToolFailure::internal();
        assert_eq!(failure.kind, FailureKind::Internal);
        // Must not contain anything implementation specific.
        assert!(!failure.message.contains("panic"));
        assert!(failure.details.is_none());
    }

    #[test]
    fn test_into_result_sets_error_flag() {
        let result = ToolFailure::validation("title must not be empty").into_result();
        assert!(result.is_failure());
        let text = result.text_content();
        assert!(text.contains("\"kind\": \"validation\""));
        assert!(text.contains("title must not be empty"));
    }
}
