//! Review reply parsing
//!
//! Extracts a ranking structure from a free-form stage-2 reply. Pure text
//! processing — no I/O, no session state. Tolerant of the format drift
//! real models produce: `Rank 1: A — ...`, `#2: Response B: ...` and
//! `3. C - ...` all parse to the same structure.

use crate::council::label::LabelMap;
use crate::council::review::{Ranking, ReviewResult};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// One ranking line. Captures: rank number, label, reasoning.
///
/// Accepted prefixes: `Rank 3:`, `rank #3:`, `#3:`, `3.`, `3)`.
/// Accepted label forms: `A`, `Response A` (case-insensitive, up to two
/// letters so labels past `Z` keep working).
fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:rank\s*#?|#)?\s*(\d+)\s*[:.)]\s*(?:response\s+)?([a-z]{1,2})\b\s*(?:[—:–-]\s*)?(.*)$")
            .expect("ranking line pattern is valid")
    })
}

/// Parse a reviewer's raw reply against the anonymization map.
///
/// Self-rankings are dropped and the surviving ranks renumbered to a
/// contiguous `1..k` in order of parsed rank (ties broken by order of
/// appearance). Later duplicates of an already-ranked model are discarded.
/// When fewer than half of the expected labels are matched the result
/// carries `parse_ok = false` and an empty ranking list, but the raw text
/// is kept for the turn record.
pub fn parse_review(reviewer_model_id: &str, labels: &LabelMap, raw_text: &str) -> ReviewResult {
    let pattern = line_pattern();

    // (parsed rank, appearance index, model id, reasoning)
    let mut entries: Vec<(u32, usize, String, String)> = Vec::new();
    let mut matched_labels: HashSet<String> = HashSet::new();

    for (position, line) in raw_text.lines().enumerate() {
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        let Ok(rank) = caps[1].parse::<u32>() else {
            continue;
        };
        let label = caps[2].to_ascii_uppercase();
        // Unknown labels are noise (numbered prose, hallucinated labels).
        let Some(model_id) = labels.model_of(&label) else {
            continue;
        };
        matched_labels.insert(label);
        if model_id == reviewer_model_id {
            continue;
        }
        let reasoning = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        entries.push((rank, position, model_id.to_string(), reasoning));
    }

    // The reviewer was asked for one line per label (minus its own). A
    // reply that covers less than half of the labels is not a ranking.
    if matched_labels.len() * 2 < labels.len() {
        return ReviewResult::unparsed(reviewer_model_id, raw_text);
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut rankings: Vec<Ranking> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (_, _, model_id, reasoning) in entries {
        if !seen.insert(model_id.clone()) {
            continue;
        }
        rankings.push(Ranking {
            model_id,
            rank: rankings.len() as u32 + 1,
            reasoning,
        });
    }

    ReviewResult {
        reviewer_model_id: reviewer_model_id.to_string(),
        rankings,
        raw_text: raw_text.to_string(),
        parse_ok: true,
    }
}
