use crate::cli::Cli;
use iperf3_client::RunConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_pretty() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            pretty: default_pretty(),
        }
    }
}

impl Config {
    /// Load from `file` (or an optional `udp_timeseries.*` in the working
    /// directory) and `UDP_TIMESERIES__SECTION__KEY` environment variables.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with_env(file, None)
    }

    /// Like [`Config::load`], reading variables from `env` instead of the
    /// process environment when it is given.
    fn load_with_env(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder();
        let builder = match file {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name("udp_timeseries").required(false)),
        };
        let config = builder
            .add_source(
                config::Environment::with_prefix("UDP_TIMESERIES")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn load_or_default() -> Self {
        Self::load(None).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config file: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Command-line flags win over file and environment values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        let run = &mut self.run;
        if let Some(server) = &cli.server {
            run.host = server.clone();
        }
        if let Some(port) = cli.port {
            run.port = port;
        }
        if let Some(duration) = cli.duration {
            run.duration_secs = duration;
        }
        if let Some(bandwidth) = cli.bandwidth_mbps {
            run.bandwidth_mbps = bandwidth;
        }
        if let Some(omit) = cli.omit {
            run.omit_secs = omit;
        }
        if let Some(blksize) = cli.blksize {
            run.blksize = blksize;
        }
        if let Some(bin) = &cli.iperf3_bin {
            run.iperf3_bin = bin.clone();
        }
        if let Some(grace) = cli.grace_secs {
            run.grace_secs = grace;
        }
        if cli.no_server_output {
            run.server_output = false;
        }
        if let Some(path) = &cli.output {
            self.output.path = Some(path.clone());
        }
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
    }
}
