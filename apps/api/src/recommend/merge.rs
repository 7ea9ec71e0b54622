//! Hybrid Score Merger — collapses one or two distance-keyed result sets
//! into a single ranked, deduplicated recommendation list.
//!
//! This is pure CPU-bound code: no I/O, no suspension, no clocks. Timing
//! belongs to the orchestrator.
//!
//! Scoring: raw distances are inverted into a [0, 100] similarity that is
//! re-normalized per batch — the worst match in the current batch lands
//! near 0, the best near 100. When both collections contribute, a hybrid
//! distance (60% title, 40% description) is built first via an outer join
//! on candidate id; a candidate missing on one axis is charged the worst
//! observed distance on that axis, never zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::vector_store::CandidateRecord;

/// A title match is a stronger role-fit signal than partial description
/// overlap, so it carries the larger share of the hybrid distance.
const TITLE_WEIGHT: f64 = 0.6;
const DESCRIPTION_WEIGHT: f64 = 0.4;

/// One ranked job match. `similarity_score` is in [0, 100], higher = better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedRecommendation {
    pub job_id: String,
    pub similarity_score: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// Ranks candidates from the mandatory description results and, when
/// present, the title results.
///
/// The description signal is required: with no description hits there is
/// nothing meaningful to rank and the output is empty. An empty title
/// result set is treated the same as an absent one.
///
/// Input ordering is not trusted — ranking is re-derived from the distances
/// themselves, so out-of-order delivery from a collection cannot corrupt
/// the output.
pub fn rank(
    descriptions: &[CandidateRecord],
    titles: Option<&[CandidateRecord]>,
) -> Vec<RankedRecommendation> {
    if descriptions.is_empty() {
        return Vec::new();
    }

    match titles.filter(|t| !t.is_empty()) {
        None => normalize(best_distances(descriptions)),
        Some(titles) => rank_hybrid(descriptions, titles),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Hybrid path — outer join + weighted distance
// ────────────────────────────────────────────────────────────────────────────

fn rank_hybrid(
    descriptions: &[CandidateRecord],
    titles: &[CandidateRecord],
) -> Vec<RankedRecommendation> {
    let desc = best_distances(descriptions);
    let title = best_distances(titles);

    // Fill value for a candidate absent on one axis: the worst distance
    // observed on that axis in this batch. A zero fill would read as a
    // perfect match on the missing side and invert the ranking.
    let worst_desc = batch_max(&desc);
    let worst_title = batch_max(&title);

    // Outer join on candidate id, built once, iterated once.
    let mut joined: BTreeMap<&str, f64> = BTreeMap::new();
    for (&id, &d) in &desc {
        let t = title.get(id).copied().unwrap_or(worst_title);
        joined.insert(id, TITLE_WEIGHT * t + DESCRIPTION_WEIGHT * d);
    }
    for (&id, &t) in &title {
        joined
            .entry(id)
            .or_insert(TITLE_WEIGHT * t + DESCRIPTION_WEIGHT * worst_desc);
    }

    normalize(joined)
}

// ────────────────────────────────────────────────────────────────────────────
// Shared pieces
// ────────────────────────────────────────────────────────────────────────────

/// Best (smallest) distance per candidate id. Collapses duplicates within a
/// single result set so every id is scored exactly once.
fn best_distances(records: &[CandidateRecord]) -> BTreeMap<&str, f64> {
    let mut best: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        best.entry(record.id.as_str())
            .and_modify(|d| *d = (*d).min(record.distance))
            .or_insert(record.distance);
    }
    best
}

fn batch_max(distances: &BTreeMap<&str, f64>) -> f64 {
    distances.values().copied().fold(0.0, f64::max)
}

/// ` similarity = (1 − distance / max_distance) × 100 `, with `max_distance`
/// taken from this batch. When every distance in the batch is identical
/// (including the single-candidate batch) the formula would either divide
/// by zero or flatten everything to 0; in that case every candidate is
/// equally, maximally similar relative to the batch and scores 100.
fn normalize(distances: BTreeMap<&str, f64>) -> Vec<RankedRecommendation> {
    let max = distances.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = distances.values().copied().fold(f64::INFINITY, f64::min);
    let uniform = max == min;

    let mut ranked: Vec<RankedRecommendation> = distances
        .into_iter()
        .map(|(id, distance)| RankedRecommendation {
            job_id: id.to_string(),
            similarity_score: if uniform {
                100.0
            } else {
                (1.0 - distance / max) * 100.0
            },
        })
        .collect();

    // Descending similarity; ties broken by id so output order is stable.
    ranked.sort_by(|a, b| {
        b.similarity_score
            .total_cmp(&a.similarity_score)
            .then_with(|| a.job_id.cmp(&b.job_id))
    });
    ranked
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
