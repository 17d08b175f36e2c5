//! Integration tests for the iperf3 client.

use common::Direction;
use iperf3_client::{build_result, Iperf3Error, Iperf3Report, Iperf3Runner, RunConfig, RunDirection};
use serde_json::json;

/// Uplink report shaped like `iperf3 -u -J --get-server-output`
fn uplink_report() -> Iperf3Report {
    serde_json::from_value(json!({
        "start": {
            "version": "iperf 3.16",
            "test_start": {"protocol": "UDP", "num_streams": 1, "blksize": 1448,
                           "omit": 0, "duration": 2, "reverse": 0, "target_bitrate": 50000000}
        },
        "intervals": [
            {
                "streams": [{"socket": 5, "start": 0, "end": 1.000054, "seconds": 1.000054,
                             "bytes": 6250000, "bits_per_second": 49997300.0, "packets": 4317,
                             "omitted": false, "sender": true}],
                "sum": {"start": 0, "end": 1.000054, "seconds": 1.000054, "bytes": 6250000,
                        "bits_per_second": 49997300.0, "packets": 4317, "omitted": false, "sender": true}
            },
            {
                "streams": [{"socket": 5, "start": 1.000054, "end": 2.000041, "seconds": 0.999987,
                             "bytes": 6250000, "bits_per_second": 50000650.0, "packets": 4316,
                             "omitted": false, "sender": true}],
                "sum": {"start": 1.000054, "end": 2.000041, "seconds": 0.999987, "bytes": 6250000,
                        "bits_per_second": 50000650.0, "packets": 4316, "omitted": false, "sender": true}
            }
        ],
        "end": {
            "streams": [],
            "sum_sent": {"start": 0, "end": 2.000041, "bits_per_second": 49998975.0, "sender": true},
            "sum_received": {"start": 0, "end": 2.000143, "bits_per_second": 48500000.0, "sender": false}
        },
        "server_output_json": {
            "start": {"version": "iperf 3.16"},
            "intervals": [
                {"streams": [],
                 "sum": {"start": 0, "end": 1.000213, "seconds": 1.000213, "bytes": 6100000,
                         "bits_per_second": 48789600.0, "jitter_ms": 0.034, "lost_packets": 104,
                         "packets": 4317, "lost_percent": 2.409, "omitted": false, "sender": false}},
                {"streams": [],
                 "sum": {"start": 1.000213, "end": 2.000143, "seconds": 0.99993, "bytes": 6130000,
                         "bits_per_second": 49043400.0, "jitter_ms": 0.029, "lost_packets": 83,
                         "packets": 4316, "lost_percent": 1.923, "omitted": false, "sender": false}}
            ]
        }
    }))
    .unwrap()
}

/// Downlink report shaped like `iperf3 -u -R -J`
fn downlink_report() -> Iperf3Report {
    serde_json::from_value(json!({
        "start": {
            "version": "iperf 3.16",
            "test_start": {"protocol": "UDP", "num_streams": 1, "blksize": 1448,
                           "omit": 0, "duration": 2, "reverse": 1, "target_bitrate": 50000000}
        },
        "intervals": [
            {"streams": [],
             "sum": {"start": 0, "end": 1.00012, "bits_per_second": 100000000.0, "jitter_ms": 0.05,
                     "lost_packets": 0, "packets": 8633, "lost_percent": 0, "sender": false}},
            {"streams": [],
             "sum": {"start": 1.00012, "end": 2.0001, "bits_per_second": 300000000.0, "jitter_ms": 0.07,
                     "lost_packets": 86, "packets": 25900, "lost_percent": 0.332, "sender": false}}
        ],
        "end": {}
    }))
    .unwrap()
}

#[test]
fn test_config_defaults() {
    let config = RunConfig::default();
    assert_eq!(config.host, "");
    assert_eq!(config.port, 5201);
    assert_eq!(config.duration_secs, 10);
    assert_eq!(config.bandwidth_mbps, 10.0);
    assert_eq!(config.blksize, 0);
    assert_eq!(config.omit_secs, 0.0);
    assert_eq!(config.iperf3_bin, "iperf3");
    assert_eq!(config.grace_secs, 10);
    assert!(config.server_output);
}

#[test]
fn test_config_serialization() {
    let config = RunConfig {
        host: "10.0.0.2".to_string(),
        port: 5202,
        duration_secs: 30,
        bandwidth_mbps: 100.0,
        blksize: 1200,
        omit_secs: 2.0,
        iperf3_bin: "/usr/local/bin/iperf3".to_string(),
        grace_secs: 5,
        server_output: false,
    };

    let json = serde_json::to_string(&config).unwrap();
    let parsed: RunConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);

    let sparse: RunConfig = serde_json::from_str(r#"{"host": "10.0.0.2"}"#).unwrap();
    assert_eq!(sparse.port, 5201);
    assert!(sparse.validate().is_ok());
}

#[test]
fn test_two_runs_end_to_end() {
    let result = build_result(&uplink_report(), &downlink_report(), 0.0);

    let count = |d: Direction| result.samples.iter().filter(|s| s.direction == d).count();
    assert_eq!(count(Direction::Uplink) + count(Direction::UplinkRx), 4);
    assert_eq!(count(Direction::Downlink), 2);
    assert_eq!(result.samples.len(), 6);
    assert_eq!(result.summary.len(), 3);

    let down = result.summary[&Direction::Downlink];
    assert_eq!(down.avg_mbps, 200.0);
    assert_eq!(down.min_mbps, 100.0);
    assert_eq!(down.max_mbps, 300.0);
    assert_eq!(down.std_mbps, 100.0);
    assert!(down.avg_jitter_ms.is_some());

    let up = result.summary[&Direction::Uplink];
    assert_eq!(up.avg_jitter_ms, None);
    assert_eq!(up.avg_loss_pct, None);

    let rx = result.summary[&Direction::UplinkRx];
    let loss = rx.avg_loss_pct.unwrap();
    assert!((loss - 2.166).abs() < 1e-9);
}

#[test]
fn test_every_sample_has_throughput_and_ordered_offsets() {
    let result = build_result(&uplink_report(), &downlink_report(), 0.0);
    for direction in Direction::ALL {
        let offsets: Vec<f64> = result
            .samples
            .iter()
            .filter(|s| s.direction == direction)
            .map(|s| s.timestamp_offset)
            .collect();
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        assert!(offsets.iter().all(|o| *o >= 0.0));
    }
    assert!(result.samples.iter().all(|s| s.bps.is_finite()));
}

#[test]
fn test_omit_beyond_run_empties_summary_but_keeps_samples() {
    let result = build_result(&uplink_report(), &downlink_report(), 60.0);
    assert_eq!(result.samples.len(), 6);
    assert!(result.summary.is_empty());
    assert_eq!(result.missing_directions().len(), 3);
}

#[test]
fn test_document_shape() {
    let result = build_result(&uplink_report(), &downlink_report(), 0.0);
    let value = serde_json::to_value(&result).unwrap();
    let obj = value.as_object().unwrap();
    assert_eq!(obj.len(), 2);
    let keys: Vec<&String> = obj["summary"].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 3);
    for key in ["uplink", "uplink_rx", "downlink"] {
        assert!(obj["summary"][key]["std_mbps"].is_number());
    }
    assert!(obj["samples"][0]["jitter_ms"].is_null());
}

fn config_with_bin(bin: &str) -> RunConfig {
    RunConfig {
        host: "127.0.0.1".to_string(),
        duration_secs: 1,
        grace_secs: 5,
        iperf3_bin: bin.to_string(),
        ..RunConfig::default()
    }
}

#[tokio::test]
async fn test_missing_binary_fails_uplink_run() {
    let runner = Iperf3Runner::new(config_with_bin("/nonexistent/iperf3-binary")).unwrap();
    let err = runner.run_both().await.unwrap_err();
    assert!(matches!(err, Iperf3Error::Spawn { .. }));
    assert!(err.is_run_failure());
    assert_eq!(err.direction(), Some(RunDirection::Uplink));
    assert!(err.to_string().starts_with("uplink run: failed to spawn iperf3"));
}

/// Write an executable shell script standing in for iperf3.
#[cfg(unix)]
fn fake_iperf3(dir: &std::path::Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("iperf3");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

#[cfg(unix)]
#[tokio::test]
async fn test_slow_binary_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig {
        grace_secs: 1,
        ..config_with_bin(&fake_iperf3(dir.path(), "exec sleep 30"))
    };
    let runner = Iperf3Runner::new(config).unwrap();

    let started = std::time::Instant::now();
    let err = runner.run(RunDirection::Uplink).await.unwrap_err();
    assert!(matches!(
        err,
        Iperf3Error::Timeout {
            direction: RunDirection::Uplink,
            secs: 2
        }
    ));
    assert!(err.is_run_failure());
    assert!(started.elapsed() < std::time::Duration::from_secs(20));
}

#[cfg(unix)]
#[tokio::test]
async fn test_successful_run_records_launch_time() {
    let dir = tempfile::tempdir().unwrap();
    let bin = fake_iperf3(
        dir.path(),
        r#"echo '{"start": {"version": "iperf 3.16"}, "intervals": []}'"#,
    );
    let runner = Iperf3Runner::new(config_with_bin(&bin)).unwrap();

    let before = chrono::Utc::now();
    let run = runner.run(RunDirection::Downlink).await.unwrap();
    let after = chrono::Utc::now();

    assert_eq!(run.direction, RunDirection::Downlink);
    assert_eq!(run.report.version(), Some("iperf 3.16"));
    assert!(run.started_at >= before && run.started_at <= after);
    assert!(run.t0_epoch() >= before.timestamp() as f64);
}

#[cfg(unix)]
#[test]
fn test_failing_binary_is_exit_error() {
    let runner = Iperf3Runner::new(config_with_bin("false")).unwrap();
    let err = tokio_test::block_on(runner.run(RunDirection::Downlink)).unwrap_err();
    match err {
        Iperf3Error::Exit { direction, code, .. } => {
            assert_eq!(direction, RunDirection::Downlink);
            assert_eq!(code, Some(1));
        }
        other => panic!("unexpected error: {other}"),
    }
}
