//! Council turn entity

use crate::council::opinion::ModelOpinion;
use crate::council::ranking::RankingSummary;
use crate::council::review::ReviewResult;
use crate::util::now_ms;
use serde::{Deserialize, Serialize};

/// One user message and the full three-stage deliberation it induced
/// (Entity). Written to the store exactly once, at the turn boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilTurn {
    pub turn_id: String,
    pub user_message: String,
    /// Stage 1: one entry per councilor, success or failure.
    pub opinions: Vec<ModelOpinion>,
    /// Stage 2: one entry per reviewer.
    pub reviews: Vec<ReviewResult>,
    /// Aggregate standing shown to the chairman.
    #[serde(default)]
    pub ranking: RankingSummary,
    /// Stage 3: the synthesized answer. May be a truncated prefix when the
    /// stage deadline fired or the chairman stream errored mid-way.
    pub final_text: String,
    pub started_at: u64,
    pub finished_at: u64,
}

impl CouncilTurn {
    pub fn new(turn_id: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            turn_id: turn_id.into(),
            user_message: user_message.into(),
            opinions: Vec::new(),
            reviews: Vec::new(),
            ranking: RankingSummary::default(),
            final_text: String::new(),
            started_at: now_ms(),
            finished_at: 0,
        }
    }

    /// Stamp the end of the turn.
    pub fn mark_finished(&mut self) {
        self.finished_at = now_ms();
    }

    /// Whether stage 1 produced at least one usable opinion.
    pub fn has_opinions(&self) -> bool {
        self.opinions.iter().any(ModelOpinion::is_success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_turn_is_unfinished() {
        let turn = CouncilTurn::new("t1", "What is 2+2?");
        assert!(turn.started_at > 0);
        assert_eq!(turn.finished_at, 0);
        assert!(!turn.has_opinions());
    }

    #[test]
    fn test_has_opinions_ignores_failures() {
        let mut turn = CouncilTurn::new("t1", "q");
        turn.opinions.push(ModelOpinion::failure("m1", "timeout"));
        assert!(!turn.has_opinions());
        turn.opinions.push(ModelOpinion::success("m2", "four"));
        assert!(turn.has_opinions());
    }
}
