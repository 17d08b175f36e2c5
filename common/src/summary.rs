//! Per-direction descriptive statistics over normalized samples.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::samples::{Direction, NormalizedSample};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DirectionSummary {
    pub avg_mbps: f64,
    pub min_mbps: f64,
    pub max_mbps: f64,
    /// Population standard deviation (divisor N)
    pub std_mbps: f64,
    pub avg_jitter_ms: Option<f64>,
    pub avg_loss_pct: Option<f64>,
}

impl DirectionSummary {
    /// Returns `None` for an empty partition.
    pub fn from_samples<'a, I>(samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a NormalizedSample>,
    {
        let mut mbps = Vec::new();
        let mut jitter = Vec::new();
        let mut loss = Vec::new();
        for s in samples {
            mbps.push(s.mbps());
            jitter.extend(s.jitter_ms);
            loss.extend(s.loss_pct);
        }

        // Sorted so the floating point sums don't depend on input order.
        sort_values(&mut mbps);
        let (&min_mbps, &max_mbps) = (mbps.first()?, mbps.last()?);
        let avg_mbps = sorted_mean(&mbps)?;
        let mut squared: Vec<f64> = mbps.iter().map(|x| (x - avg_mbps).powi(2)).collect();
        sort_values(&mut squared);
        let std_mbps = sorted_mean(&squared).map(f64::sqrt).unwrap_or(0.0);

        Some(Self {
            avg_mbps,
            min_mbps,
            max_mbps,
            std_mbps,
            avg_jitter_ms: mean(jitter),
            avg_loss_pct: mean(loss),
        })
    }
}

/// Summarize each direction, ignoring samples taken before `omit_seconds`.
///
/// Directions left with no samples are absent from the result.
pub fn summarize(
    samples: &[NormalizedSample],
    omit_seconds: f64,
) -> BTreeMap<Direction, DirectionSummary> {
    let omit = if omit_seconds.is_finite() && omit_seconds > 0.0 {
        omit_seconds
    } else {
        0.0
    };

    let mut partitions: BTreeMap<Direction, Vec<&NormalizedSample>> = BTreeMap::new();
    for sample in samples.iter().filter(|s| s.timestamp_offset >= omit) {
        partitions.entry(sample.direction).or_default().push(sample);
    }

    partitions
        .into_iter()
        .filter_map(|(direction, partition)| {
            DirectionSummary::from_samples(partition).map(|summary| (direction, summary))
        })
        .collect()
}

fn sort_values(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

fn sorted_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn mean(mut values: Vec<f64>) -> Option<f64> {
    sort_values(&mut values);
    sorted_mean(&values)
}
