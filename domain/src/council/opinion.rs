//! Stage-1 opinion value object

use crate::util::now_ms;
use serde::{Deserialize, Serialize};

/// A councilor's stage-1 answer (Value Object).
///
/// Exactly one of `text` / `error` is meaningful: `text` is empty whenever
/// `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOpinion {
    /// The model that produced (or failed to produce) this opinion.
    pub model_id: String,
    /// The full answer text; empty on failure.
    pub text: String,
    /// Failure description, if the call errored or timed out.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    /// Milliseconds since the Unix epoch when the stream terminated.
    pub finished_at: u64,
}

impl ModelOpinion {
    pub fn success(model_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            text: text.into(),
            error: None,
            finished_at: now_ms(),
        }
    }

    pub fn failure(model_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            text: String::new(),
            error: Some(error.into()),
            finished_at: now_ms(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_error() {
        let op = ModelOpinion::success("m1", "four");
        assert!(op.is_success());
        assert_eq!(op.text, "four");
        assert!(op.error.is_none());
    }

    #[test]
    fn test_failure_has_empty_text() {
        let op = ModelOpinion::failure("m1", "timeout");
        assert!(!op.is_success());
        assert!(op.text.is_empty());
        assert_eq!(op.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_error_field_skipped_on_success() {
        let json = serde_json::to_string(&ModelOpinion::success("m1", "ok")).unwrap();
        assert!(!json.contains("error"));
    }
}
