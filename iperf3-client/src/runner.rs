//! Launches iperf3 for the uplink and downlink runs.

use crate::config::RunConfig;
use crate::error::{Iperf3Error, Result};
use crate::normalize::build_result;
use crate::protocol::Iperf3Report;
use chrono::{DateTime, Utc};
use common::TestResult;
use std::fmt;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Longest stderr excerpt kept in an error message
const STDERR_EXCERPT_LEN: usize = 512;

/// Which of the two runs is being executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunDirection {
    /// Client sends to server
    Uplink,
    /// Server sends to client (`--reverse`)
    Downlink,
}

impl fmt::Display for RunDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunDirection::Uplink => f.write_str("uplink"),
            RunDirection::Downlink => f.write_str("downlink"),
        }
    }
}

/// A finished run and its parsed report
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub direction: RunDirection,
    /// Wall-clock time the run was launched
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub report: Iperf3Report,
}

impl RunOutput {
    /// Launch time as seconds since the Unix epoch.
    pub fn t0_epoch(&self) -> f64 {
        self.started_at.timestamp_millis() as f64 / 1000.0
    }
}

/// Runs iperf3 as a subprocess, one run at a time
pub struct Iperf3Runner {
    config: RunConfig,
}

impl Iperf3Runner {
    /// Create a runner after validating the configuration
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Command-line arguments for one run
    pub fn command_args(&self, direction: RunDirection) -> Vec<String> {
        let config = &self.config;
        let mut args = vec![
            "-c".to_string(),
            config.host.clone(),
            "-p".to_string(),
            config.port.to_string(),
            "-u".to_string(),
            "-b".to_string(),
            config.bandwidth_bps().to_string(),
            "-t".to_string(),
            config.duration_secs.to_string(),
            "-J".to_string(),
        ];
        if config.blksize > 0 {
            args.push("-l".to_string());
            args.push(config.blksize.to_string());
        }
        match direction {
            RunDirection::Uplink => {
                if config.server_output {
                    args.push("--get-server-output".to_string());
                }
            }
            RunDirection::Downlink => args.push("-R".to_string()),
        }
        args
    }

    /// Run iperf3 once and parse its report.
    ///
    /// The child is killed if it outlives `duration + grace`.
    pub async fn run(&self, direction: RunDirection) -> Result<RunOutput> {
        let args = self.command_args(direction);
        let limit = self.config.run_timeout();
        tracing::info!(
            "iperf3: starting {} run against {}:{} ({}s at {} Mbit/s)",
            direction,
            self.config.host,
            self.config.port,
            self.config.duration_secs,
            self.config.bandwidth_mbps
        );
        tracing::debug!("iperf3: {} {}", self.config.iperf3_bin, args.join(" "));

        let child = Command::new(&self.config.iperf3_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Iperf3Error::Spawn { direction, source })?;

        let started_at = Utc::now();
        let started = Instant::now();

        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| Iperf3Error::Spawn { direction, source })?,
            Err(_) => {
                return Err(Iperf3Error::Timeout {
                    direction,
                    secs: limit.as_secs(),
                })
            }
        };
        let elapsed = started.elapsed();

        let stderr = String::from_utf8_lossy(&output.stderr);
        let report = parse_report(direction, &output.stdout, output.status.code(), &stderr)?;

        let run = RunOutput {
            direction,
            started_at,
            elapsed,
            report,
        };
        tracing::info!(
            "iperf3: {} run started {} (t0={:.3}) finished in {:.1}s ({})",
            direction,
            run.started_at.to_rfc3339(),
            run.t0_epoch(),
            run.elapsed.as_secs_f64(),
            run.report.version().unwrap_or("unknown version")
        );
        if let Some(test_start) = run.report.test_start() {
            tracing::debug!(
                "iperf3: {} run protocol={:?} blksize={:?} target_bitrate={:?} reverse={}",
                direction,
                test_start.protocol,
                test_start.blksize,
                test_start.target_bitrate,
                test_start.is_reverse()
            );
        }

        Ok(run)
    }

    /// Run uplink, then downlink. The downlink run only starts after the
    /// uplink report has been fully read; any failure aborts both.
    pub async fn run_both(&self) -> Result<(RunOutput, RunOutput)> {
        let uplink = self.run(RunDirection::Uplink).await?;
        let downlink = self.run(RunDirection::Downlink).await?;
        Ok((uplink, downlink))
    }

    /// Run both directions and build the sample/summary document.
    pub async fn measure(&self) -> Result<TestResult> {
        let (uplink, downlink) = self.run_both().await?;
        tracing::debug!(
            "iperf3: downlink started {:.3}s after uplink",
            downlink.t0_epoch() - uplink.t0_epoch()
        );
        Ok(build_result(
            &uplink.report,
            &downlink.report,
            self.config.omit_secs,
        ))
    }
}

/// Interpret the output of a finished iperf3 process.
///
/// `exit_code` is `None` when the process was terminated by a signal.
pub fn parse_report(
    direction: RunDirection,
    stdout: &[u8],
    exit_code: Option<i32>,
    stderr: &str,
) -> Result<Iperf3Report> {
    let success = exit_code == Some(0);
    match serde_json::from_slice::<Iperf3Report>(stdout) {
        Ok(report) => {
            if let Some(message) = report.error.clone() {
                return Err(Iperf3Error::Tool { direction, message });
            }
            if !success {
                return Err(Iperf3Error::Exit {
                    direction,
                    code: exit_code,
                    stderr: excerpt(stderr),
                });
            }
            Ok(report)
        }
        Err(_) if !success => Err(Iperf3Error::Exit {
            direction,
            code: exit_code,
            stderr: excerpt(stderr),
        }),
        Err(source) => Err(Iperf3Error::MalformedOutput { direction, source }),
    }
}

fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    match trimmed.char_indices().nth(STDERR_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
