//! indexload CLI: load daily index data and query the loaded collections.
//!
//! Commands:
//! - `load`: drop the database, then load the three indices from CSV and from the API
//! - `collections` / `symbols`: list collection names and market symbols
//! - `show`: records of one collection, optionally within a date range
//! - `recent`: the newest N records of one collection
//! - `latest`: the newest record of one collection
//! - `insert`: add one validated daily record
//! - `predict` / `predictions`: add or list predicted closes

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indexload_core::config::IngestConfig;
use indexload_core::data::{
    run_ingest, AlphaVantageProvider, CsvProvider, FailurePolicy, IngestJob, Providers,
    StdoutProgress,
};
use indexload_core::domain::DataSource;
use indexload_core::logging::{init_logging, LogConfig, LogFormat};
use indexload_core::query::{DateRange, MarketQuery, NewRecord};
use indexload_core::store::SqliteStore;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "indexload",
    version,
    about = "indexload: daily index loader (API + Yahoo CSV) and collection queries"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides the config).
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop the database, then load all six collections (CSV first, then API).
    Load {
        /// Directory holding sp_500.csv, dow.csv and nasdaq.csv (overrides the config).
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// API key (overrides the config and ALPHAVANTAGE_API_KEY).
        #[arg(long)]
        api_key: Option<String>,

        /// Keep running the remaining jobs after one fails.
        #[arg(long, default_value_t = false)]
        keep_going: bool,
    },
    /// List collection names.
    Collections,
    /// List market symbols.
    Symbols,
    /// Show records of a collection, ordered by date.
    Show {
        /// Collection name or symbol (e.g. dow, DJIA).
        name: String,

        /// Start date (YYYY-MM-DD); requires --to.
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        to: Option<String>,

        #[command(flatten)]
        source: SourceArg,
    },
    /// Show the newest records of a collection, newest first.
    Recent {
        /// Collection name or symbol.
        name: String,

        /// Number of records (min 1).
        #[arg(long, allow_negative_numbers = true)]
        days: i64,

        #[command(flatten)]
        source: SourceArg,
    },
    /// Show the newest record of a collection.
    Latest {
        /// Collection name or symbol.
        name: String,

        #[command(flatten)]
        source: SourceArg,
    },
    /// Insert one daily record (date, open, high, low and close are required).
    Insert {
        /// Collection name or symbol.
        name: String,

        /// Date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        #[arg(long)]
        open: String,

        #[arg(long)]
        high: String,

        #[arg(long)]
        low: String,

        #[arg(long)]
        close: String,

        #[command(flatten)]
        source: SourceArg,
    },
    /// Insert one predicted close.
    Predict {
        /// Collection name or symbol.
        name: String,

        /// Date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        #[arg(long)]
        close: String,
    },
    /// Show predictions for a collection.
    Predictions {
        /// Collection name or symbol.
        name: String,

        /// Start date (YYYY-MM-DD); requires --to.
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        to: Option<String>,

        /// Only the newest N predictions, newest first (min 1).
        #[arg(long, conflicts_with_all = ["from", "to"], allow_negative_numbers = true)]
        days: Option<i64>,
    },
}

#[derive(clap::Args, Clone, Copy)]
struct SourceArg {
    /// Which collection family to read: yahoo (CSV-derived) or api.
    #[arg(long, value_enum, default_value_t = SourceChoice::Yahoo)]
    source: SourceChoice,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceChoice {
    Yahoo,
    Api,
}

impl From<SourceArg> for DataSource {
    fn from(arg: SourceArg) -> Self {
        match arg.source {
            SourceChoice::Yahoo => DataSource::File,
            SourceChoice::Api => DataSource::Api,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
        });
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("init logging: {e}"))?;

    let mut config = match &cli.config {
        Some(path) => IngestConfig::from_file(path)?,
        None => IngestConfig::default(),
    }
    .with_env_overrides();
    if let Some(database) = cli.database {
        config.database = database;
    }

    match cli.command {
        Commands::Load {
            csv_dir,
            api_key,
            keep_going,
        } => {
            if let Some(dir) = csv_dir {
                config.csv_dir = dir;
            }
            if let Some(key) = api_key {
                config.api.api_key = key;
            }
            if keep_going {
                config.failure_policy = FailurePolicy::Continue;
            }
            run_load(&config)
        }
        Commands::Collections => print_json(&MarketQuery::collections()),
        Commands::Symbols => print_json(&MarketQuery::symbols()),
        Commands::Show {
            name,
            from,
            to,
            source,
        } => {
            let range = DateRange::parse(from.as_deref(), to.as_deref())?;
            let mut store = open_store(&config)?;
            let query = MarketQuery::new(&mut store).with_source(source.into());
            print_json(&query.get(&name, range.as_ref())?)
        }
        Commands::Recent { name, days, source } => {
            let mut store = open_store(&config)?;
            let query = MarketQuery::new(&mut store).with_source(source.into());
            print_json(&query.recent(&name, days)?)
        }
        Commands::Latest { name, source } => {
            let mut store = open_store(&config)?;
            let query = MarketQuery::new(&mut store).with_source(source.into());
            print_json(&query.latest(&name)?)
        }
        Commands::Insert {
            name,
            date,
            open,
            high,
            low,
            close,
            source,
        } => {
            let mut store = open_store(&config)?;
            let mut query = MarketQuery::new(&mut store).with_source(source.into());
            let record = query.insert(
                &name,
                NewRecord {
                    date,
                    open,
                    high,
                    low,
                    close,
                },
            )?;
            print_json(&record)
        }
        Commands::Predict { name, date, close } => {
            let mut store = open_store(&config)?;
            let mut query = MarketQuery::new(&mut store);
            print_json(&query.insert_prediction(&name, &date, &close)?)
        }
        Commands::Predictions {
            name,
            from,
            to,
            days,
        } => {
            let mut store = open_store(&config)?;
            let query = MarketQuery::new(&mut store);
            match days {
                Some(days) => print_json(&query.recent_predictions(&name, days)?),
                None => {
                    let range = DateRange::parse(from.as_deref(), to.as_deref())?;
                    print_json(&query.predictions(&name, range.as_ref())?)
                }
            }
        }
    }
}

fn run_load(config: &IngestConfig) -> Result<()> {
    // Checked before the store is opened so a missing key leaves the database intact.
    config.api.require_key()?;

    let file_provider = CsvProvider::new(&config.csv_dir);
    let api_provider = AlphaVantageProvider::new(&config.api)?;
    let providers = Providers {
        api: &api_provider,
        file: &file_provider,
    };

    let mut store = open_store(config)?;
    let plan = IngestJob::default_plan();

    let summary = run_ingest(
        &plan,
        &providers,
        &mut store,
        config.failure_policy,
        &StdoutProgress,
    )
    .context("database reset failed")?;

    if !summary.all_succeeded() {
        for (job, err) in &summary.errors {
            eprintln!("Error for {job}: {err}");
        }
        for job in &summary.skipped {
            eprintln!("Skipped: {job}");
        }
        bail!(
            "{} of {} jobs failed, {} skipped",
            summary.failed(),
            summary.total,
            summary.skipped.len()
        );
    }

    Ok(())
}

fn open_store(config: &IngestConfig) -> Result<SqliteStore> {
    SqliteStore::open(&config.database)
        .with_context(|| format!("open database {}", config.database.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
