mod cli;
mod config;
mod output;

use clap::Parser;
use cli::Cli;
use iperf3_client::Iperf3Runner;

fn log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => config::Config::load(Some(path.as_path()))?,
        None => config::Config::load_or_default(),
    };
    config.apply_cli(&cli);

    // Logs go to stderr; stdout carries the summary
    tracing_subscriber::fmt()
        .with_max_level(log_level(&config.logging.level))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting udp-timeseries");
    tracing::info!("Configuration loaded:");
    tracing::info!("  Server: {}:{}", config.run.host, config.run.port);
    tracing::info!(
        "  Duration: {}s per direction, target {} Mbit/s, omit {}s",
        config.run.duration_secs,
        config.run.bandwidth_mbps,
        config.run.omit_secs
    );
    tracing::info!("  Log level: {}", config.logging.level);

    let output_path = config
        .output
        .path
        .clone()
        .ok_or("no output path configured (use --output)")?;

    let runner = Iperf3Runner::new(config.run.clone())?;
    let result = runner.measure().await.map_err(|e| {
        tracing::error!("{}", e);
        e
    })?;

    output::write_result(&result, &output_path, config.output.pretty)?;
    tracing::info!(
        "Wrote {} with {} samples",
        output_path.display(),
        result.samples.len()
    );

    for direction in result.missing_directions() {
        tracing::warn!(
            "No usable {} samples after omitting the first {}s",
            direction,
            config.run.omit_secs
        );
    }

    println!(
        "Wrote {} with {} samples.",
        output_path.display(),
        result.samples.len()
    );
    print!("{}", output::render_summary(&result));

    if result.summary.is_empty() {
        return Err(format!(
            "no usable samples after omitting the first {}s",
            config.run.omit_secs
        )
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(log_level("DEBUG"), tracing::Level::DEBUG);
        assert_eq!(log_level("warn"), tracing::Level::WARN);
        assert_eq!(log_level("verbose"), tracing::Level::INFO);
    }
}
