mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vcal_core::{StoreKind, VcalConfig};

use crate::commands::EventFields;

#[derive(Parser)]
#[command(name = "vcal")]
#[command(about = "Month view and event editing, locally or against a vcal-server")]
struct Cli {
    /// Use the local event file, whatever the config says
    #[arg(long, global = true, conflicts_with = "remote")]
    local: bool,

    /// Use the sync server at this URL (e.g. ws://127.0.0.1:8001/ws)
    #[arg(long, global = true)]
    remote: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a month grid
    Month {
        /// Month to show (YYYY-MM, YYYY-MM-DD or e.g. "next month"); defaults to this month
        month: Option<String>,

        /// Go back N months from the given month
        #[arg(long, value_name = "N", conflicts_with = "next")]
        prev: Option<u32>,

        /// Go forward N months from the given month
        #[arg(long, value_name = "N")]
        next: Option<u32>,
    },
    /// List the events on one day
    Day {
        /// Date (YYYY-MM-DD, "tomorrow", "fri", ...); defaults to today
        date: Option<String>,
    },
    /// Create an event
    New {
        /// Prompted for when omitted
        title: Option<String>,

        #[command(flatten)]
        fields: EventFields,
    },
    /// Change fields of an existing event
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[command(flatten)]
        fields: EventFields,
    },
    /// Show every field of one event
    Show {
        id: String,

        /// Print the stored JSON record
        #[arg(long)]
        json: bool,
    },
    /// Delete an event
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Redraw a month grid whenever the events change
    Watch {
        month: Option<String>,
    },
    /// Show configuration paths and values
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = VcalConfig::load()?;
    if cli.local {
        config.store = StoreKind::Local;
    }
    if let Some(url) = cli.remote {
        config.store = StoreKind::Remote;
        config.server_url = url;
    }

    init_logging(config.log_level.as_deref());

    match cli.command {
        Commands::Month { month, prev, next } => {
            let offset = i64::from(next.unwrap_or(0)) - i64::from(prev.unwrap_or(0));
            commands::month::run(&config, month.as_deref(), offset).await
        }
        Commands::Day { date } => commands::day::run(&config, date.as_deref()).await,
        Commands::New { title, fields } => commands::new::run(&config, title, fields).await,
        Commands::Edit { id, title, fields } => {
            commands::edit::run(&config, &id, title, fields).await
        }
        Commands::Show { id, json } => commands::show::run(&config, &id, json).await,
        Commands::Delete { id, force } => commands::delete::run(&config, &id, force).await,
        Commands::Watch { month } => commands::watch::run(&config, month.as_deref()).await,
        Commands::Config => commands::config::run(&config),
    }
}

/// Logs go to stderr so command output stays clean. `RUST_LOG` wins over the
/// configured level.
fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
