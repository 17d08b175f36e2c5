//! iperf3 JSON report definitions.
//!
//! These mirror the document `iperf3 -J` prints on stdout. Only the fields
//! the normalizer needs are modeled; everything else is ignored. Sections
//! that fail to parse are treated as absent rather than failing the whole
//! report, and individual interval records that fail to parse are skipped.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

/// Which side of a flow a set of statistics describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Sender,
    Receiver,
}

/// Statistics for one interval, one stream or one aggregate
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IntervalStats {
    /// Interval start, seconds since the run started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,

    /// Interval end, seconds since the run started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,

    /// Bytes transferred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,

    /// Bits per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits_per_second: Option<f64>,

    /// Jitter in milliseconds (UDP receiver only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_ms: Option<f64>,

    /// Lost packets (UDP receiver only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_packets: Option<u64>,

    /// Total packets (UDP only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packets: Option<u64>,

    /// Lost percentage (UDP receiver only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_percent: Option<f64>,

    /// Set by iperf3 for intervals inside its own `-O` window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omitted: Option<bool>,

    /// true when these numbers were taken on the sending host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<bool>,
}

impl IntervalStats {
    /// Whether these stats describe `side`. Unflagged stats count as
    /// `unflagged_default`.
    pub fn is_side(&self, side: Side, unflagged_default: bool) -> bool {
        match self.sender {
            Some(sender) => sender == (side == Side::Sender),
            None => unflagged_default,
        }
    }

    /// Combine per-stream stats for one interval into a single record.
    pub fn aggregate<'a, I>(streams: I) -> Option<IntervalStats>
    where
        I: IntoIterator<Item = &'a IntervalStats>,
    {
        let mut iter = streams.into_iter();
        let first = iter.next()?;
        let mut total = first.clone();
        let mut jitter: Vec<f64> = first.jitter_ms.into_iter().collect();
        let mut percents: Vec<f64> = first.lost_percent.into_iter().collect();

        for s in iter {
            total.start = min_opt(total.start, s.start);
            total.end = max_opt(total.end, s.end);
            total.bytes = sum_opt(total.bytes, s.bytes);
            total.bits_per_second = match (total.bits_per_second, s.bits_per_second) {
                (Some(a), Some(b)) => Some(a + b),
                _ => None,
            };
            total.lost_packets = sum_opt(total.lost_packets, s.lost_packets);
            total.packets = sum_opt(total.packets, s.packets);
            jitter.extend(s.jitter_ms);
            percents.extend(s.lost_percent);
        }

        total.jitter_ms = if jitter.is_empty() {
            None
        } else {
            Some(jitter.iter().sum::<f64>() / jitter.len() as f64)
        };
        total.lost_percent = match (total.lost_packets, total.packets) {
            (Some(lost), Some(packets)) if packets > 0 => {
                Some(lost as f64 * 100.0 / packets as f64)
            }
            _ if percents.is_empty() => None,
            _ => Some(percents.iter().sum::<f64>() / percents.len() as f64),
        };
        Some(total)
    }
}

fn min_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        _ => None,
    }
}

fn max_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        _ => None,
    }
}

fn sum_opt(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.saturating_add(b)),
        _ => None,
    }
}

/// One reporting interval
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IntervalRecord {
    /// Per-stream stats
    #[serde(default)]
    pub streams: Vec<IntervalStats>,

    /// Sum of all streams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<IntervalStats>,

    /// Sum of the sending direction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_sent: Option<IntervalStats>,

    /// Sum of the receiving direction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_received: Option<IntervalStats>,
}

impl IntervalRecord {
    /// Statistics for one side of the flow, if this record carries them.
    ///
    /// Prefers the explicit `sum_sent`/`sum_received` aggregate, then `sum`,
    /// then an aggregate of the matching streams. Stats without a `sender`
    /// flag count as `side` only when `unflagged_default` is set.
    pub fn side_stats(&self, side: Side, unflagged_default: bool) -> Option<IntervalStats> {
        let explicit = match side {
            Side::Sender => self.sum_sent.as_ref(),
            Side::Receiver => self.sum_received.as_ref(),
        };
        if let Some(stats) = explicit {
            return Some(stats.clone());
        }
        if let Some(sum) = &self.sum {
            return sum
                .is_side(side, unflagged_default)
                .then(|| sum.clone());
        }
        IntervalStats::aggregate(
            self.streams
                .iter()
                .filter(|s| s.is_side(side, unflagged_default)),
        )
    }
}

/// Top-level iperf3 JSON report
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Iperf3Report {
    /// Start-of-test information
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub start: Option<StartInfo>,

    /// Periodic interval reports; `None` when the key is missing entirely
    #[serde(default, deserialize_with = "lenient_records", skip_serializing_if = "Option::is_none")]
    pub intervals: Option<Vec<IntervalRecord>>,

    /// End (final) results
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub end: Option<EndInfo>,

    /// Error message, present when iperf3 failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The server's own report, present with `--get-server-output`
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub server_output_json: Option<Box<Iperf3Report>>,
}

impl Iperf3Report {
    pub fn version(&self) -> Option<&str> {
        self.start.as_ref()?.version.as_deref()
    }

    pub fn test_start(&self) -> Option<&TestStartInfo> {
        self.start.as_ref()?.test_start.as_ref()
    }
}

/// Start information
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StartInfo {
    /// Version string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// System info
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_info: Option<String>,

    /// Test start parameters
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub test_start: Option<TestStartInfo>,
}

/// Test start parameters, used for logging only
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TestStartInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_streams: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blksize: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// iperf3 encodes this as 0/1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_bitrate: Option<u64>,
}

impl TestStartInfo {
    pub fn is_reverse(&self) -> bool {
        self.reverse.unwrap_or(0) != 0
    }
}

/// End (final) results
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EndInfo {
    /// Sum of all streams
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub sum: Option<IntervalStats>,

    /// Sum of sending direction
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub sum_sent: Option<IntervalStats>,

    /// Sum of receiving direction
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub sum_received: Option<IntervalStats>,
}

impl EndInfo {
    /// The end summary viewed as a single whole-run interval.
    pub fn as_record(&self) -> IntervalRecord {
        IntervalRecord {
            streams: Vec::new(),
            sum: self.sum.clone(),
            sum_sent: self.sum_sent.clone(),
            sum_received: self.sum_received.clone(),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match serde_json::from_value(v) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!("iperf3: ignoring unparseable report section: {}", e);
            None
        }
    }))
}

fn lenient_records<'de, D>(deserializer: D) -> Result<Option<Vec<IntervalRecord>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Array(values)) => values,
        Some(other) => {
            tracing::debug!("iperf3: intervals is not a list: {}", other);
            return Ok(None);
        }
        None => return Ok(None),
    };

    let records = values
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| match serde_json::from_value(v) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("iperf3: skipping unparseable interval {}: {}", i, e);
                None
            }
        })
        .collect();
    Ok(Some(records))
}
