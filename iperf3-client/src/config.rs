//! Configuration for a pair of iperf3 UDP runs.

use crate::error::{Iperf3Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the uplink/downlink run pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// iperf3 server hostname or IP
    #[serde(default)]
    pub host: String,

    /// Control port (default: 5201)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Duration of each run in seconds
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Target UDP rate in Mbit/s
    #[serde(default = "default_bandwidth_mbps")]
    pub bandwidth_mbps: f64,

    /// Datagram size in bytes (0 = let iperf3 choose)
    #[serde(default)]
    pub blksize: u32,

    /// Warm-up seconds excluded from the summary (samples are still kept)
    #[serde(default)]
    pub omit_secs: f64,

    /// Path or name of the iperf3 binary
    #[serde(default = "default_iperf3_bin")]
    pub iperf3_bin: String,

    /// Extra seconds a run may take beyond `duration_secs` before it is killed
    #[serde(default = "default_grace")]
    pub grace_secs: u64,

    /// Ask the server for its own report so uplink receiver stats are available
    #[serde(default = "default_server_output")]
    pub server_output: bool,
}

fn default_port() -> u16 {
    5201
}

fn default_duration() -> u64 {
    10
}

fn default_bandwidth_mbps() -> f64 {
    10.0
}

fn default_iperf3_bin() -> String {
    "iperf3".to_string()
}

fn default_grace() -> u64 {
    10
}

fn default_server_output() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            duration_secs: default_duration(),
            bandwidth_mbps: default_bandwidth_mbps(),
            blksize: 0,
            omit_secs: 0.0,
            iperf3_bin: default_iperf3_bin(),
            grace_secs: default_grace(),
            server_output: default_server_output(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Iperf3Error::InvalidParameter(
                "server host must be set".to_string(),
            ));
        }
        if self.duration_secs == 0 {
            return Err(Iperf3Error::InvalidParameter(
                "duration must be at least 1 second".to_string(),
            ));
        }
        if !self.bandwidth_mbps.is_finite() || self.bandwidth_mbps <= 0.0 {
            return Err(Iperf3Error::InvalidParameter(format!(
                "bandwidth must be a positive number of Mbit/s, got {}",
                self.bandwidth_mbps
            )));
        }
        if !self.omit_secs.is_finite() || self.omit_secs < 0.0 {
            return Err(Iperf3Error::InvalidParameter(format!(
                "omit must be >= 0 seconds, got {}",
                self.omit_secs
            )));
        }
        if self.iperf3_bin.trim().is_empty() {
            return Err(Iperf3Error::InvalidParameter(
                "iperf3 binary path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Target rate in bits/second as passed to `iperf3 -b`
    pub fn bandwidth_bps(&self) -> u64 {
        (self.bandwidth_mbps * 1_000_000.0).round() as u64
    }

    /// Upper bound on how long a single run may take
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.duration_secs.saturating_add(self.grace_secs))
    }
}
