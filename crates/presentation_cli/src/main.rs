//! skycast CLI
//!
//! Command-line interface for current weather and weather icons.

#![allow(clippy::print_stdout)]

mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use integration_openweather::{
    Icon, IconCache, IconStore, OpenWeatherClient, WeatherClient, WeatherInfo,
};
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

/// skycast CLI
#[derive(Parser)]
#[command(name = "skycast-cli")]
#[command(author, version, about = "Current weather and weather icons from OpenWeatherMap", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Configuration file (default: ./skycast.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// OpenWeatherMap API key
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Icon cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current weather for a coordinate
    ///
    /// Example: skycast-cli weather --lat 52.37 --lon 4.89
    Weather {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a weather icon through the local cache
    ///
    /// Example: skycast-cli icon 10d --output rain.png
    Icon {
        /// Icon identifier, e.g. 10d
        icon_id: String,

        /// Write the decoded icon as PNG to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect the icon cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cache directory
    Path,
    /// List cached icon identifiers
    List,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8, json: bool) {
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_filter_from_verbosity(verbose)));

    // Logs go to stderr so command output stays machine-readable
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Human-readable rendering of current weather
fn format_weather(info: &WeatherInfo) -> String {
    let mut out = format!(
        "📍 {}\n🌡️  {:.1}°C / {:.1}°F ({:.2} K)",
        info.name,
        info.temperature_celsius(),
        info.temperature_fahrenheit(),
        info.temperature
    );
    for condition in &info.conditions {
        out.push_str(&format!(
            "\n   • {} (icon {})",
            condition.description, condition.icon
        ));
    }
    out
}

/// One-line description of a resolved icon
fn describe_icon(icon_id: &str, icon: &Icon) -> String {
    let (width, height) = icon.dimensions();
    format!("{icon_id}: {width}x{height} from {}", icon.source())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_json);

    let app_config =
        AppConfig::load(cli.config.as_deref())?.with_overrides(cli.api_key, cli.cache_dir);
    let settings = app_config.openweather;

    match cli.command {
        Commands::Weather { lat, lon, json } => {
            let client = OpenWeatherClient::new(&settings)?;
            let info = client.get_weather(lat, lon).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{}", format_weather(&info));
            }
        },

        Commands::Icon { icon_id, output } => {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let cache = IconCache::new(&settings)?.with_persist_events(tx);

            let icon = cache.get_icon(&icon_id).await;
            println!("🖼️  {}", describe_icon(&icon_id, &icon));

            // Let the background write finish before the runtime shuts down
            drop(cache);
            while let Some(event) = rx.recv().await {
                match event.outcome {
                    Ok(path) => println!("💾 Cached at {}", path.display()),
                    Err(e) => println!("⚠️  Could not cache icon: {e}"),
                }
            }

            if icon.is_placeholder() {
                println!("❌ No icon available for '{icon_id}'");
                std::process::exit(1);
            }

            if let Some(path) = output {
                icon
                    .image()
                    .save_with_format(&path, image::ImageFormat::Png)?;
                println!("📁 Wrote {}", path.display());
            }
        },

        Commands::Cache { action } => {
            let store = IconStore::new(settings.resolve_cache_dir());
            match action {
                CacheAction::Path => println!("{}", store.dir().display()),
                CacheAction::List => {
                    let ids = store.list().await.inspect_err(|e| {
                        warn!(error = %e, "Could not read cache directory");
                    })?;
                    for id in ids {
                        println!("{id}");
                    }
                },
            }
        },
    }

    Ok(())
}
