//! Stage-2 review value objects

use serde::{Deserialize, Serialize};

/// One line of a parsed review: where a reviewer placed a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    /// The ranked model. Never the reviewer itself, and always a model
    /// that produced a non-error opinion in the same turn.
    pub model_id: String,
    /// Position, 1 is best. Contiguous 1..k within one review.
    pub rank: u32,
    pub reasoning: String,
}

/// A reviewer's parsed stage-2 reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub reviewer_model_id: String,
    pub rankings: Vec<Ranking>,
    /// The reply exactly as received, kept even when parsing failed.
    pub raw_text: String,
    /// False when the reply could not be interpreted (or the call failed);
    /// such reviews are excluded from aggregation.
    pub parse_ok: bool,
}

impl ReviewResult {
    /// A reply that was received but could not be interpreted.
    pub fn unparsed(reviewer_model_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            reviewer_model_id: reviewer_model_id.into(),
            rankings: Vec::new(),
            raw_text: raw_text.into(),
            parse_ok: false,
        }
    }

    /// A review call that never produced a reply.
    pub fn errored(reviewer_model_id: impl Into<String>) -> Self {
        Self::unparsed(reviewer_model_id, "")
    }
}
