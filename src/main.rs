mod cli;
mod config;
mod db;
mod insight;
mod journal;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aura", version, about = "A one-entry-per-day journal with AI reflection")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save an entry for a day and analyze it
    Write {
        /// Day to write (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Image file to attach
        #[arg(long)]
        image: Option<PathBuf>,
        /// Latitude of the entry
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude of the entry
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Entry text
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Interactive editing session with auto-save
    Edit {
        /// Day to open (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Talk with Aura, keeping the conversation under a day
    Chat {
        /// Day of the conversation (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Do not save this conversation
        #[arg(long)]
        incognito: bool,
    },
    /// List recent entries
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the entry of one day
    Show {
        /// Day (YYYY-MM-DD)
        date: String,
    },
    /// Month overview (YYYY-MM), defaults to the current month
    Calendar {
        #[arg(long)]
        month: Option<String>,
    },
    /// Journal statistics
    Stats,
    /// Export all entries as JSON to stdout
    Export,
    /// Import entries from a JSON file
    Import {
        file: PathBuf,
    },
    /// Check database health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::AuraConfig::load()?;

    // Log to stderr so stdout stays clean for export output.
    let filter = EnvFilter::try_new(&config.logging.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Write {
            date,
            image,
            lat,
            lon,
            text,
        } => {
            let location = lat
                .zip(lon)
                .map(|(latitude, longitude)| journal::types::Location {
                    latitude,
                    longitude,
                });
            cli::write::write(
                &config,
                date.as_deref(),
                image.as_deref(),
                location,
                &text.join(" "),
            )
            .await?;
        }
        Command::Edit { date } => cli::edit::edit(&config, date.as_deref()).await?,
        Command::Chat { date, incognito } => {
            cli::chat::chat(&config, date.as_deref(), incognito).await?
        }
        Command::List { limit } => cli::show::list(&config, limit)?,
        Command::Show { date } => cli::show::show(&config, &date)?,
        Command::Calendar { month } => cli::calendar::calendar(&config, month.as_deref())?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Export => cli::export::export(&config)?,
        Command::Import { file } => cli::import::import(&config, &file)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
