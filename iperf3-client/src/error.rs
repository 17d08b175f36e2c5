//! Error types for iperf3 runs.

use crate::runner::RunDirection;
use thiserror::Error;

/// Errors that can occur while running iperf3 or reading its report
#[derive(Error, Debug)]
pub enum Iperf3Error {
    /// iperf3 could not be started or its output could not be collected
    #[error("{direction} run: failed to spawn iperf3: {source}")]
    Spawn {
        direction: RunDirection,
        #[source]
        source: std::io::Error,
    },

    /// The run did not finish within duration + grace
    #[error("{direction} run: timed out after {secs} seconds")]
    Timeout { direction: RunDirection, secs: u64 },

    /// iperf3 exited unsuccessfully without reporting an error of its own
    #[error("{direction} run: iperf3 exited with {}: {stderr}", exit_description(.code))]
    Exit {
        direction: RunDirection,
        code: Option<i32>,
        stderr: String,
    },

    /// iperf3 reported an error in its JSON output
    #[error("{direction} run: iperf3 error: {message}")]
    Tool {
        direction: RunDirection,
        message: String,
    },

    /// stdout was not a JSON report
    #[error("{direction} run: malformed iperf3 report: {source}")]
    MalformedOutput {
        direction: RunDirection,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl Iperf3Error {
    /// True for failures that mean a run produced no usable report.
    pub fn is_run_failure(&self) -> bool {
        !matches!(self, Iperf3Error::InvalidParameter(_))
    }

    /// The run this error belongs to, if any.
    pub fn direction(&self) -> Option<RunDirection> {
        match self {
            Iperf3Error::Spawn { direction, .. }
            | Iperf3Error::Timeout { direction, .. }
            | Iperf3Error::Exit { direction, .. }
            | Iperf3Error::Tool { direction, .. }
            | Iperf3Error::MalformedOutput { direction, .. } => Some(*direction),
            Iperf3Error::InvalidParameter(_) => None,
        }
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (killed by signal)".to_string(),
    }
}

/// Result type for iperf3 operations
pub type Result<T> = std::result::Result<T, Iperf3Error>;
