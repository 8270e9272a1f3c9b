use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use evebox::config::{default_config_path, Config};
use evebox::report::SortOrder;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "evebox")]
#[command(about = "EveBox reports - aggregate security events from the terminal")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.evebox/reports.toml)
    #[arg(long, short, global = true, env = "EVEBOX_CONFIG")]
    config: Option<PathBuf>,

    /// EveBox server URL (overrides config)
    #[arg(long, global = true, env = "EVEBOX_URL")]
    url: Option<String>,

    /// Request timeout in milliseconds (overrides config)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Aggregate these EVE log files locally instead of querying a server
    #[arg(long = "eve", global = true, value_name = "FILE")]
    eve_files: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a custom aggregation on a field
    Agg {
        /// Field to aggregate on, e.g. tls.sni
        #[arg(short, long)]
        field: String,

        #[command(flatten)]
        opts: ReportArgs,
    },

    /// Run a named preset aggregation
    Preset {
        /// Preset name (see `evebox presets`)
        name: String,

        #[command(flatten)]
        opts: ReportArgs,
    },

    /// List available presets
    Presets,

    /// Show or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Number of buckets to return
    #[arg(short, long)]
    pub size: Option<String>,

    /// Bucket order: ASC or DESC
    #[arg(short, long)]
    pub order: Option<SortOrder>,

    /// Only count events matching this query string
    #[arg(short, long)]
    pub query: Option<String>,

    /// Relative time range, e.g. 24h or 7d
    #[arg(long)]
    pub time_range: Option<String>,

    /// Only count events of this type
    #[arg(long)]
    pub event_type: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| config.logging.format.clone());

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Apply CLI overrides
    if let Some(url) = cli.url {
        config.server.url = url;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.server.timeout_ms = timeout_ms;
    }

    init_logging(&config);

    match cli.command {
        Commands::Agg { field, opts } => {
            commands::run_agg(&config, &cli.eve_files, &field, &opts).await?;
        }
        Commands::Preset { name, opts } => {
            commands::run_preset(&config, &cli.eve_files, &name, &opts).await?;
        }
        Commands::Presets => {
            commands::run_presets(&config);
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::run_config_show(&config)?,
            ConfigAction::Init { force } => commands::run_config_init(&config_path, force)?,
        },
    }

    Ok(())
}
