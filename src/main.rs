mod app;
mod config;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::Application;
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("dispatchd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Dispatch tracking backend")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .default_value("info")
                .help("Log verbosity"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["json", "pretty"])
                .default_value("pretty")
                .help("Log output format"),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let log_level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("info");
    let log_format = matches
        .get_one::<String>("log-format")
        .map(String::as_str)
        .unwrap_or("pretty");

    init_logging(log_level, log_format)?;

    let config = AppConfig::load(config_path).context("failed to load configuration")?;
    info!(bind_address = %config.api.bind_address, "starting dispatchd");

    let application = Application::new(config).await?;
    application.run().await
}

fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    // RUST_LOG wins over the CLI flag when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dispatchd={log_level},dispatch_api={log_level},dispatch_domain={log_level},dispatch_infrastructure={log_level}")));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match log_format {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
    Ok(())
}
