//! Turns the uplink and downlink iperf3 reports into one sample series.
//!
//! Each report is read independently. Uplink intervals yield a sender-side
//! `uplink` sample and, where receiver-side stats exist, an `uplink_rx`
//! sample. Downlink (reverse mode) intervals yield one receiver-side
//! `downlink` sample. Records with a bad interval span or no throughput are
//! skipped without affecting the rest.

use std::borrow::Cow;

use common::{Direction, NormalizedSample, TestResult};

use crate::protocol::{IntervalRecord, IntervalStats, Iperf3Report, Side};

/// Normalize both reports. Samples come out grouped as `uplink`,
/// `uplink_rx`, `downlink`, each group in interval order.
pub fn normalize(uplink: &Iperf3Report, downlink: &Iperf3Report) -> Vec<NormalizedSample> {
    let mut samples = uplink_samples(uplink);
    samples.extend(downlink_samples(downlink));
    samples
}

/// Normalize both reports and summarize, discarding the first `omit_seconds`.
pub fn build_result(
    uplink: &Iperf3Report,
    downlink: &Iperf3Report,
    omit_seconds: f64,
) -> TestResult {
    TestResult::new(normalize(uplink, downlink), omit_seconds)
}

fn uplink_samples(report: &Iperf3Report) -> Vec<NormalizedSample> {
    let records = interval_records(report, "uplink");

    let mut samples = collect(
        records.iter().map(|r| r.side_stats(Side::Sender, true)),
        Direction::Uplink,
    );

    let mut rx = collect(
        records.iter().map(|r| r.side_stats(Side::Receiver, false)),
        Direction::UplinkRx,
    );
    if rx.is_empty() {
        if let Some(server) = &report.server_output_json {
            tracing::debug!("iperf3: taking uplink receiver stats from the server report");
            let server_records = interval_records(server, "uplink server");
            rx = collect(
                server_records
                    .iter()
                    .map(|r| r.side_stats(Side::Receiver, true)),
                Direction::UplinkRx,
            );
        }
    }

    samples.extend(rx);
    samples
}

fn downlink_samples(report: &Iperf3Report) -> Vec<NormalizedSample> {
    let records = interval_records(report, "downlink");
    collect(
        records.iter().map(|r| r.side_stats(Side::Receiver, true)),
        Direction::Downlink,
    )
}

/// Interval records of a report. An empty interval list falls back to the
/// end summary as one whole-run record; a missing list yields nothing.
fn interval_records<'a>(report: &'a Iperf3Report, label: &str) -> Cow<'a, [IntervalRecord]> {
    match &report.intervals {
        None => {
            tracing::warn!("iperf3: {} report has no interval list", label);
            Cow::Borrowed(&[])
        }
        Some(records) if records.is_empty() => match &report.end {
            Some(end) => {
                tracing::debug!("iperf3: {} report has no intervals, using end summary", label);
                Cow::Owned(vec![end.as_record()])
            }
            None => Cow::Borrowed(&[]),
        },
        Some(records) => Cow::Borrowed(records.as_slice()),
    }
}

fn collect<I>(stats: I, direction: Direction) -> Vec<NormalizedSample>
where
    I: IntoIterator<Item = Option<IntervalStats>>,
{
    let mut samples: Vec<NormalizedSample> = Vec::new();
    for (index, stats) in stats.into_iter().enumerate() {
        let Some(stats) = stats else {
            continue;
        };
        let Some(sample) = to_sample(&stats, direction) else {
            tracing::debug!(
                "iperf3: dropping malformed {} interval {}: {:?}",
                direction,
                index,
                stats
            );
            continue;
        };
        if let Some(last) = samples.last() {
            if sample.timestamp_offset < last.timestamp_offset {
                tracing::debug!(
                    "iperf3: dropping out-of-order {} interval {} at {}s",
                    direction,
                    index,
                    sample.timestamp_offset
                );
                continue;
            }
        }
        samples.push(sample);
    }
    samples
}

/// Build a sample from one side's stats, or `None` if the record is unusable.
fn to_sample(stats: &IntervalStats, direction: Direction) -> Option<NormalizedSample> {
    let start = stats.start.filter(|v| v.is_finite() && *v >= 0.0)?;
    let end = stats.end.filter(|v| v.is_finite())?;
    if end <= start {
        return None;
    }
    let bps = stats.bits_per_second.filter(|v| v.is_finite() && *v >= 0.0)?;

    let (jitter_ms, loss_pct) = match direction {
        Direction::Uplink => (None, None),
        Direction::UplinkRx | Direction::Downlink => (
            stats.jitter_ms.filter(|v| v.is_finite() && *v >= 0.0),
            stats.lost_percent.filter(|v| v.is_finite() && *v >= 0.0),
        ),
    };

    Some(NormalizedSample {
        timestamp_offset: start,
        direction,
        bps,
        jitter_ms,
        loss_pct,
    })
}
