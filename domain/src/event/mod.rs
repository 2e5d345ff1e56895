//! Caller-facing event model
//!
//! Every producer in one orchestration sends exactly these variants onto
//! the output channel; the wire form is one JSON object per event with a
//! `type` tag. Consumers identify interleaved chunks by `model_id`.

use crate::council::review::{Ranking, ReviewResult};
use serde::{Deserialize, Serialize};

/// Deliberation stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    FirstOpinions,
    Review,
    FinalResponse,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::FirstOpinions => "first_opinions",
            Stage::Review => "review",
            Stage::FinalResponse => "final_response",
        }
    }

    /// Human-readable banner carried in the `stage_update` event.
    pub fn announcement(&self) -> &'static str {
        match self {
            Stage::FirstOpinions => "Councilors are drafting their answers",
            Stage::Review => "Councilors are reviewing each other's answers",
            Stage::FinalResponse => "Chairman is synthesizing the final answer",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reason code carried in a terminal `error` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No councilor could be resolved for the request.
    NoCouncilors,
    /// Every stage-1 call errored; stages 2 and 3 were skipped.
    NoOpinions,
    /// The chairman stream errored or timed out.
    ChairmanFailure,
    /// The overall turn deadline expired.
    TurnTimeout,
    /// Persistence failed at the final append step.
    StoreFailure,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NoCouncilors => "no_councilors",
            FailureReason::NoOpinions => "no_opinions",
            FailureReason::ChairmanFailure => "chairman_failure",
            FailureReason::TurnTimeout => "turn_timeout",
            FailureReason::StoreFailure => "store_failure",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of a `review` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewData {
    pub rankings: Vec<Ranking>,
    pub parse_ok: bool,
}

impl From<&ReviewResult> for ReviewData {
    fn from(review: &ReviewResult) -> Self {
        Self {
            rankings: review.rankings.clone(),
            parse_ok: review.parse_ok,
        }
    }
}

/// One event on the output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouncilEvent {
    /// Opens a stage. Emitted exactly once per stage, in stage order.
    StageUpdate { stage: Stage, content: String },
    /// One stage-1 text chunk from one councilor.
    ModelResponse { model_id: String, content: String },
    /// One reviewer's parsed stage-2 result.
    Review { model_id: String, data: ReviewData },
    /// One stage-3 text chunk from the chairman.
    FinalResponse { content: String },
    /// Last event of a successful turn.
    Complete,
    /// Per-model soft error (with `model_id`) or terminal failure (without).
    Error {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        model_id: Option<String>,
    },
}

impl CouncilEvent {
    pub fn stage_update(stage: Stage) -> Self {
        CouncilEvent::StageUpdate {
            stage,
            content: stage.announcement().to_string(),
        }
    }

    pub fn model_chunk(model_id: impl Into<String>, content: impl Into<String>) -> Self {
        CouncilEvent::ModelResponse {
            model_id: model_id.into(),
            content: content.into(),
        }
    }

    pub fn review(review: &ReviewResult) -> Self {
        CouncilEvent::Review {
            model_id: review.reviewer_model_id.clone(),
            data: ReviewData::from(review),
        }
    }

    pub fn final_chunk(content: impl Into<String>) -> Self {
        CouncilEvent::FinalResponse {
            content: content.into(),
        }
    }

    pub fn model_error(model_id: impl Into<String>, content: impl Into<String>) -> Self {
        CouncilEvent::Error {
            content: content.into(),
            model_id: Some(model_id.into()),
        }
    }

    pub fn terminal_error(reason: FailureReason) -> Self {
        CouncilEvent::Error {
            content: reason.as_str().to_string(),
            model_id: None,
        }
    }
}
