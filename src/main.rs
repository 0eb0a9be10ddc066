mod app;
mod cli;
mod config;
mod output;
mod timezone;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;

/// `RUST_LOG` wins, then `--debug`, then the config's `log_level`, then `warn`
fn init_tracing(debug: bool, log_level: Option<&str>) {
    let fallback = if debug {
        "debug"
    } else {
        log_level.unwrap_or("warn")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let (config, config_path) = Config::load();
    let cli = Cli::parse().with_config(&config);

    init_tracing(cli.debug, config.log_level.as_deref());
    if let Some(path) = config_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    if let Err(e) = app::run(&cli, &config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
