use clap::Parser;
use std::path::PathBuf;

/// Flags override values from the config file and environment.
#[derive(Parser, Debug, Default)]
#[command(
    name = "udp-timeseries",
    version,
    about = "Run iperf3 UDP in both directions and export interval metrics to JSON"
)]
pub struct Cli {
    /// iperf3 server hostname or IP
    #[arg(long, value_name = "HOST")]
    pub server: Option<String>,

    /// iperf3 server port [default: 5201]
    #[arg(long)]
    pub port: Option<u16>,

    /// Duration of each run in seconds [default: 10]
    #[arg(long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Target UDP bandwidth in Mbit/s [default: 10]
    #[arg(long, value_name = "MBPS")]
    pub bandwidth_mbps: Option<f64>,

    /// Warm-up seconds excluded from the summary [default: 0]
    #[arg(long, value_name = "SECS")]
    pub omit: Option<f64>,

    /// Datagram size in bytes; 0 lets iperf3 choose
    #[arg(long, value_name = "BYTES")]
    pub blksize: Option<u32>,

    /// iperf3 binary to run
    #[arg(long, value_name = "PATH")]
    pub iperf3_bin: Option<String>,

    /// Seconds a run may overrun its duration before it is killed [default: 10]
    #[arg(long, value_name = "SECS")]
    pub grace_secs: Option<u64>,

    /// Don't request the server's report (no uplink_rx samples with most iperf3 builds)
    #[arg(long, default_value_t = false)]
    pub no_server_output: bool,

    /// Output JSON file path
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Config file (toml, json, yaml...); defaults to ./udp_timeseries.* if present
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
