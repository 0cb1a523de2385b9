use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use statter::config::load_config;
use statter::observability::{init_logging, LogFormat};
use statter::{Registry, Tags};

#[derive(Parser)]
#[command(name = "statter-cli")]
#[command(about = "Send test metrics and check statter configuration", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "statter.toml")]
    config: PathBuf,

    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the config file and print it normalized
    Check,
    /// Send a counter
    Count {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value_t = 1)]
        value: i64,
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },
    /// Send a gauge
    Gauge {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        value: f64,
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },
    /// Send a histogram sample
    Histogram {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        value: f64,
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },
    /// Send a timing in milliseconds
    Timing {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        ms: u64,
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // Only fails when a subscriber is already installed.
    let _ = init_logging(cli.log_format, "statter=info");

    let config = load_config(&cli.config)?;

    let registry = Registry::new();
    match cli.command {
        Commands::Check => {
            println!("{}", serde_json::to_string_pretty(&config.normalized())?);
            return Ok(());
        }
        Commands::Count { name, value, tags } => {
            registry.init_with_config(&config)?;
            registry.counter(&name, value, &Tags::from_iter(tags));
        }
        Commands::Gauge { name, value, tags } => {
            registry.init_with_config(&config)?;
            registry.gauge(&name, value, &Tags::from_iter(tags));
        }
        Commands::Histogram { name, value, tags } => {
            registry.init_with_config(&config)?;
            registry.histogram(&name, value, &Tags::from_iter(tags));
        }
        Commands::Timing { name, ms, tags } => {
            registry.init_with_config(&config)?;
            registry.timer(&name, Duration::from_millis(ms), &Tags::from_iter(tags));
        }
    }

    tracing::info!(active = registry.is_active(), "Metric sent");
    registry.close();
    Ok(())
}
