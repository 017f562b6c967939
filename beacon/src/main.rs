mod config;
mod logging;
mod statsd;

use clap::Parser;
use config::Config;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(about = "Analytics beacon relay and badge server")]
struct Cli {
    /// YAML config file; every setting has a default
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Port for the beacon listener, overriding the config file
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config_file.as_deref(), cli.port) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    let sentry_guard = logging::init(&config.common.logging);

    if let Some(metrics_config) = &config.common.metrics {
        if let Err(e) = statsd::init(metrics_config) {
            tracing::error!(error = %e, "Metrics disabled");
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            process::exit(1);
        }
    };

    tracing::info!("Starting beacon");
    if let Err(e) = runtime.block_on(relay::run(config.relay)) {
        tracing::error!(error = %e, "Beacon failed");
        drop(sentry_guard);
        process::exit(1);
    }
    tracing::info!("Beacon stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_flags() {
        let cli = Cli::try_parse_from(["beacon", "-c", "/etc/beacon.yaml", "--port", "9000"])
            .expect("parse args");
        assert_eq!(cli.config_file, Some(PathBuf::from("/etc/beacon.yaml")));
        assert_eq!(cli.port, Some(9000));
    }
}
