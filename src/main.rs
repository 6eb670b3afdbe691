use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use log::warn;
use rust_decimal::Decimal;
use std::fs::File;
use std::path::PathBuf;

mod aggregator;
mod config;
mod csv_writer;
mod errors;
mod fetcher;
mod gain_loss;
mod joiner;
mod models;
mod processor;
mod store;
mod traits;
mod updater;

use config::{Config, RateSourceConfig};
use csv_writer::CSVWriter;
use store::RateStore;

/// Converts USD salary CSVs to JPY using MUFG TTM rates
#[derive(Parser)]
#[command(name = "ttm-converter", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Rate store file
    #[arg(long, global = true, env = "TTM_STORE_PATH", default_value = config::DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// Base URL the YYMMDD date key is appended to
    #[arg(long, global = true, env = "TTM_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    /// HTTP timeout in seconds
    #[arg(long, global = true, env = "TTM_HTTP_TIMEOUT", default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every missing daily rate up to yesterday
    Update,

    /// Show how far the stored rates reach
    Status,

    /// List the columns of an upload
    Columns {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Convert a salary CSV to JPY
    Convert {
        #[arg(short, long)]
        input: PathBuf,

        /// Column holding the payment date
        #[arg(long)]
        date_column: String,

        /// Column holding the USD amount
        #[arg(long)]
        amount_column: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Realized FX gain/loss for USD converted at the bank's rate
    GainLoss {
        /// Rate actually obtained from the bank
        #[arg(long)]
        actual_rate: Decimal,

        /// USD amount converted
        #[arg(long)]
        amount: Decimal,

        /// TTM to compare against (latest stored TTM when omitted)
        #[arg(long)]
        benchmark_rate: Option<Decimal>,
    },
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Config::new(
            cli.store.clone(),
            RateSourceConfig {
                base_url: cli.base_url.clone(),
                timeout_secs: cli.timeout,
                ..RateSourceConfig::default()
            },
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = Config::from(&cli);
    let store = RateStore::new(config.store_path.clone());

    match cli.command {
        Commands::Update => {
            let fetcher = fetcher::MufgRateFetcher::new(&config.rate_source)?;
            let updater = updater::RateUpdater::new(fetcher, store, config.anchor.clone());
            let report = updater.update()?;

            println!(
                "added {} rates; TTM available through {}",
                report.added(),
                report
                    .series()
                    .last_date()
                    .map(|d| d.to_string())
                    .unwrap_or_default()
            );
            if let Some(interruption) = report.interrupted() {
                bail!(
                    "update incomplete at {}: {}",
                    interruption.date,
                    interruption.error
                );
            }
        }
        Commands::Status => {
            let series = store.load_or_empty();
            match series.latest() {
                Some(rate) => println!(
                    "{} daily rates stored; TTM available through {} ({})",
                    series.len(),
                    rate.date(),
                    rate.mid_rate()
                ),
                None => println!("no rates stored in {}", store.path().display()),
            }
        }
        Commands::Columns { input } => {
            let upload = aggregator::Upload::from_reader(File::open(input)?)?;
            for header in upload.headers() {
                println!("{header}");
            }
        }
        Commands::Convert {
            input,
            date_column,
            amount_column,
            output,
        } => {
            let upload = aggregator::Upload::from_reader(File::open(&input)?)?;
            if upload.is_empty() {
                warn!("{} has no rows", input.display());
            }
            upload.check_columns(&date_column, &amount_column)?;
            let rates = store.load_or_empty();

            let summary = match &output {
                Some(path) => processor::Engine::new(CSVWriter::create_with_bom(path)?, upload, &rates)
                    .run(&date_column, &amount_column)?,
                None => processor::Engine::new(CSVWriter::stdout(), upload, &rates)
                    .run(&date_column, &amount_column)?,
            };

            if !summary.unmatched.is_empty() {
                let dates: Vec<String> = summary.unmatched.iter().map(|d| d.to_string()).collect();
                eprintln!("no TTM for: {}", dates.join(", "));
            }
            if let Some(path) = output {
                eprintln!("wrote {} converted dates to {}", summary.converted, path.display());
            }
        }
        Commands::GainLoss {
            actual_rate,
            amount,
            benchmark_rate,
        } => {
            let benchmark = benchmark_rate.unwrap_or_else(|| {
                gain_loss::benchmark_rate(&store.load_or_empty(), *config.anchor.mid_rate())
            });
            let value = gain_loss::compute(benchmark, actual_rate, amount);
            println!(
                "benchmark TTM {benchmark}, FX gain/loss: {:.2} JPY ({})",
                value,
                gain_loss::classify(value)
            );
        }
    }

    Ok(())
}
