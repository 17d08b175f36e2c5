//! # iperf3-client
//!
//! Runs iperf3 UDP tests in both directions and turns the JSON reports into
//! a per-interval time series with per-direction summary statistics.
//!
//! ## Features
//!
//! - Sequential uplink and reverse-mode downlink runs with a bounded timeout
//! - Typed iperf3 JSON report schema, tolerant of partial or odd reports
//! - Sender and receiver views of the uplink flow as separate sample series
//! - Warm-up omission applied at summary time
//!
//! ## Example
//!
//! ```no_run
//! use iperf3_client::{Iperf3Runner, RunConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = RunConfig {
//!         host: "192.0.2.10".to_string(),
//!         ..RunConfig::default()
//!     };
//!     let runner = Iperf3Runner::new(config).unwrap();
//!     let result = runner.measure().await.unwrap();
//!     println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! }
//! ```

pub mod config;
pub mod error;
pub mod normalize;
pub mod protocol;
pub mod runner;

pub use config::RunConfig;
pub use error::Iperf3Error;
pub use normalize::{build_result, normalize};
pub use protocol::Iperf3Report;
pub use runner::{Iperf3Runner, RunDirection, RunOutput};
