//! Council deliberation domain
//!
//! Types and pure logic for the three-stage flow: parallel opinions
//! (stage 1), anonymized peer review (stage 2), and chairman synthesis
//! (stage 3).

pub mod label;
pub mod opinion;
pub mod parsing;
pub mod ranking;
pub mod review;
pub mod turn;

// Re-export main types
pub use label::LabelMap;
pub use opinion::ModelOpinion;
pub use parsing::parse_review;
pub use ranking::{RankedModel, RankingSummary};
pub use review::{Ranking, ReviewResult};
pub use turn::CouncilTurn;
