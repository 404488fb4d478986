//! # Routing Statistics
//!
//! Aggregate confidence figures over a set of routing results, used by the
//! service after each pass and by operators inspecting the result store.
//!
//! Scores are bucketed as:
//!
//! | Bucket | Range |
//! |---|---|
//! | high | `score >= 0.8` |
//! | medium | `0.6 <= score < 0.8` |
//! | low | `score < 0.6` |

use serde::{Deserialize, Serialize};

use crate::types::RoutingResult;

/// Lower bound of a high-confidence match
pub const HIGH_CONFIDENCE: f64 = 0.8;
/// Lower bound of a medium-confidence match
pub const MEDIUM_CONFIDENCE: f64 = 0.6;

/// Spread of the routing scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub min: f64,
    pub max: f64,
    /// Population standard deviation
    pub std: f64,
}

/// Summary of a set of routing results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingStatistics {
    pub total_routings: usize,
    pub average_score: f64,
    pub high_confidence_matches: usize,
    pub medium_confidence_matches: usize,
    pub low_confidence_matches: usize,
    /// Absent when there are no results
    pub score_distribution: Option<ScoreDistribution>,
}

/// Compute statistics over `results`; empty input yields zeros
pub fn get_routing_statistics(results: &[RoutingResult]) -> RoutingStatistics {
    if results.is_empty() {
        return RoutingStatistics::default();
    }

    let scores: Vec<f64> = results.iter().map(|r| r.routing_score).collect();
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    RoutingStatistics {
        total_routings: scores.len(),
        average_score: mean,
        high_confidence_matches: scores.iter().filter(|s| **s >= HIGH_CONFIDENCE).count(),
        medium_confidence_matches: scores
            .iter()
            .filter(|s| (MEDIUM_CONFIDENCE..HIGH_CONFIDENCE).contains(*s))
            .count(),
        low_confidence_matches: scores.iter().filter(|s| **s < MEDIUM_CONFIDENCE).count(),
        score_distribution: Some(ScoreDistribution {
            min,
            max,
            std: variance.sqrt(),
        }),
    }
}
