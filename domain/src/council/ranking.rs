//! Aggregated ranking across reviews
//!
//! Condenses the valid stage-2 reviews into one ordered standing that the
//! chairman sees during synthesis.

use crate::council::review::ReviewResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One model's aggregate standing. Lower mean rank is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedModel {
    pub model_id: String,
    /// Mean rank across the reviewers that ranked this model.
    pub mean_rank: f64,
    /// How many reviewers ranked this model.
    pub reviewer_count: usize,
}

/// Ordered aggregate of all valid reviews (Value Object).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingSummary {
    pub entries: Vec<RankedModel>,
}

impl RankingSummary {
    /// Aggregate the reviews that parsed successfully.
    ///
    /// Entries are ordered by mean rank ascending; ties break
    /// lexicographically by model id.
    pub fn from_reviews(reviews: &[ReviewResult]) -> Self {
        let mut tallies: BTreeMap<&str, (u64, usize)> = BTreeMap::new();

        for review in reviews.iter().filter(|r| r.parse_ok) {
            for ranking in &review.rankings {
                let tally = tallies.entry(ranking.model_id.as_str()).or_insert((0, 0));
                tally.0 += u64::from(ranking.rank);
                tally.1 += 1;
            }
        }

        let mut entries: Vec<RankedModel> = tallies
            .into_iter()
            .map(|(model_id, (sum, count))| RankedModel {
                model_id: model_id.to_string(),
                mean_rank: sum as f64 / count as f64,
                reviewer_count: count,
            })
            .collect();

        // BTreeMap iteration is id-ascending; a stable sort on the mean
        // alone therefore leaves ties in lexicographic order.
        entries.sort_by(|a, b| {
            a.mean_rank
                .partial_cmp(&b.mean_rank)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedModel> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::council::review::Ranking;

    fn review(reviewer: &str, ranked: &[(&str, u32)]) -> ReviewResult {
        ReviewResult {
            reviewer_model_id: reviewer.to_string(),
            rankings: ranked
                .iter()
                .map(|(id, rank)| Ranking {
                    model_id: id.to_string(),
                    rank: *rank,
                    reasoning: String::new(),
                })
                .collect(),
            raw_text: String::new(),
            parse_ok: true,
        }
    }

    #[test]
    fn test_mean_ranks() {
        // m1 ranked 1 by both peers; m2 ranked 1 and 2; m3 ranked 2 twice.
        let reviews = vec![
            review("m1", &[("m2", 1), ("m3", 2)]),
            review("m2", &[("m1", 1), ("m3", 2)]),
            review("m3", &[("m1", 1), ("m2", 2)]),
        ];
        let summary = RankingSummary::from_reviews(&reviews);

        assert_eq!(summary.entries.len(), 3);
        assert_eq!(summary.entries[0].model_id, "m1");
        assert_eq!(summary.entries[0].mean_rank, 1.0);
        assert_eq!(summary.entries[0].reviewer_count, 2);
        assert_eq!(summary.entries[1].model_id, "m2");
        assert_eq!(summary.entries[1].mean_rank, 1.5);
        assert_eq!(summary.entries[2].model_id, "m3");
        assert_eq!(summary.entries[2].mean_rank, 2.0);
    }

    #[test]
    fn test_ties_break_lexicographically() {
        let reviews = vec![
            review("r1", &[("zeta", 1), ("alpha", 2)]),
            review("r2", &[("alpha", 1), ("zeta", 2)]),
        ];
        let summary = RankingSummary::from_reviews(&reviews);

        assert_eq!(summary.entries[0].model_id, "alpha");
        assert_eq!(summary.entries[1].model_id, "zeta");
    }

    #[test]
    fn test_invalid_reviews_excluded() {
        let mut bad = review("r1", &[("m2", 1)]);
        bad.parse_ok = false;
        let summary = RankingSummary::from_reviews(&[bad]);
        assert!(summary.is_empty());
    }

    #[test]
    fn test_empty_reviews() {
        let summary = RankingSummary::from_reviews(&[]);
        assert!(summary.is_empty());
    }
}
