//! Summary statistics for pull duration samples

use serde::Serialize;

/// Five-number style summary of a sample, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub min: f64,
    pub p25: f64,
    pub mean: f64,
    pub p75: f64,
    pub max: f64,
}

/// Summarize a sample; `None` when it is empty
pub fn summary(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
    Some(Summary {
        min: sorted[0],
        p25: quantile(&sorted, 0.25),
        mean,
        p75: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

/// Empirical (inverse CDF) quantile of an ascending sample
///
/// Returns the smallest value whose cumulative share of the sample reaches
/// `p`; no interpolation between neighbours.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let rank = (p.clamp(0.0, 1.0) * n as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(n - 1)]
}
