//! Per-node pull timelines of a single run

use serde::Serialize;

use super::stats::summary;
use super::Series;

/// One node's pull, relative to the first pull of the image
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineBar {
    /// Arrival order of the pull, starting at zero
    pub rank: usize,
    pub start: f64,
    pub stop: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePanel {
    pub title: String,
    pub bars: Vec<TimelineBar>,
    pub caption: String,
}

impl TimelinePanel {
    /// Latest stop over all bars, zero when there are none
    pub fn span(&self) -> f64 {
        self.bars.iter().map(|b| b.stop).fold(0.0, f64::max)
    }
}

pub fn build_timeline(series: &[Series]) -> Vec<TimelinePanel> {
    series.iter().map(build_panel).collect()
}

fn build_panel(series: &Series) -> TimelinePanel {
    let mut measurements: Vec<_> = series.benchmark.measurements.iter().collect();
    measurements.sort_by_key(|m| m.start);

    let bars: Vec<_> = match measurements.first() {
        Some(first) => {
            let origin = first.start;
            measurements
                .iter()
                .enumerate()
                .map(|(rank, m)| TimelineBar {
                    rank,
                    start: seconds_between(origin, m.start),
                    stop: seconds_between(origin, m.stop),
                })
                .collect()
        }
        None => Vec::new(),
    };

    let total = bars.iter().map(|b| b.stop).fold(0.0, f64::max);
    let caption = match summary(&series.benchmark.durations_secs()) {
        Some(s) => format!("mean {:.2}s, p75 {:.2}s, total {:.2}s", s.mean, s.p75, total),
        None => "no measurements".to_string(),
    };

    TimelinePanel {
        title: series.label.clone(),
        bars,
        caption,
    }
}

fn seconds_between(from: chrono::DateTime<chrono::Utc>, to: chrono::DateTime<chrono::Utc>) -> f64 {
    (to - from)
        .num_nanoseconds()
        .map_or(0.0, |n| n as f64 / 1e9)
}
