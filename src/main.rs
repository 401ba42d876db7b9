use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use openimage_mapper::{pipeline, MapperConfig};

fn main() -> ExitCode {
    // Config comes first so its log level can drive the subscriber
    let config = MapperConfig::load();
    let log_level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| MapperConfig::default().log_level);
    init_tracing(&log_level);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    match pipeline::run(&config) {
        Ok(summary) => {
            println!("\n{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("❌ Mapping aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr so stdout carries only the run summary
fn init_tracing(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
