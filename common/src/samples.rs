use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::summary::DirectionSummary;

/// Which side of which flow a sample was measured on.
///
/// Declaration order is the order samples are emitted and the order
/// summary keys are serialized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Client-side sender view of the client->server flow. Throughput only.
    Uplink,
    /// Server-side receiver view of the client->server flow.
    UplinkRx,
    /// Client-side receiver view of the reverse-mode server->client flow.
    Downlink,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Uplink, Direction::UplinkRx, Direction::Downlink];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Uplink => "uplink",
            Direction::UplinkRx => "uplink_rx",
            Direction::Downlink => "downlink",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One interval measurement, reduced to the fields every direction shares.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NormalizedSample {
    /// Seconds since the start of the run that produced this sample
    pub timestamp_offset: f64,
    pub direction: Direction,
    /// Bits per second
    pub bps: f64,
    /// Receiver-side jitter; `None` on sender-side samples
    pub jitter_ms: Option<f64>,
    /// Receiver-side loss percentage; `None` on sender-side samples
    pub loss_pct: Option<f64>,
}

impl NormalizedSample {
    pub fn mbps(&self) -> f64 {
        self.bps / 1e6
    }
}

/// The document written at the end of a run pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TestResult {
    pub samples: Vec<NormalizedSample>,
    pub summary: BTreeMap<Direction, DirectionSummary>,
}

impl TestResult {
    pub fn new(samples: Vec<NormalizedSample>, omit_seconds: f64) -> Self {
        let summary = crate::summary::summarize(&samples, omit_seconds);
        Self { samples, summary }
    }

    /// Directions with no usable data after omission.
    pub fn missing_directions(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| !self.summary.contains_key(d))
            .collect()
    }
}
