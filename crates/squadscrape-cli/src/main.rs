use std::fs;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use squadscrape::config::{ConfigError, PipelineConfig};
use squadscrape::fallback::fallback_dataset;
use squadscrape::scraper::{DEFAULT_ATTEMPTS, DEFAULT_SQUAD_URL, WebScraper};
use squadscrape::types::{COLUMNS, PlayerRecord, Position};
use squadscrape::utils::{SquadFilter, SquadStats};
use squadscrape::{DataSource, SquadData, SquadPipeline};

#[derive(Parser)]
#[command(name = "squadscrape")]
#[command(about = "A football squad roster scraper with a validation gate", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "JSON file with pipeline settings"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Minimum number of players to accept a scrape")]
    min_rows: Option<usize>,

    #[arg(
        long,
        global = true,
        help = "Minimum share of players with a valid age (0 to 1)"
    )]
    min_age_ratio: Option<f64>,

    #[arg(
        long,
        global = true,
        help = "Minimum number of distinct positions represented"
    )]
    min_positions: Option<usize>,

    #[arg(
        long,
        global = true,
        help = "How many years ahead a contract expiry may lie"
    )]
    contract_years: Option<i32>,

    #[arg(
        long,
        global = true,
        value_name = "YYYY-MM-DD",
        help = "Reference date for ages and contract windows (defaults to today)",
        value_parser = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string()),
    )]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
struct OutputArgs {
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value = "text",
        help = "Output format"
    )]
    format: OutputFormat,

    #[arg(long, value_parser = parse_position, help = "Only show players in this position")]
    position: Option<Position>,

    #[arg(long, help = "Only show players at least this old")]
    min_age: Option<u8>,

    #[arg(long, help = "Only show players at most this old")]
    max_age: Option<u8>,

    #[arg(long, help = "Only show players worth at least this many millions")]
    min_value: Option<f64>,

    #[arg(long, help = "Only show players worth at most this many millions")]
    max_value: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the live squad page, falling back to the built-in squad when the scrape is not trustworthy
    Fetch {
        #[arg(long, default_value = DEFAULT_SQUAD_URL, help = "URL of the squad page")]
        url: String,

        #[arg(
            long,
            default_value_t = DEFAULT_ATTEMPTS,
            value_parser = clap::value_parser!(u32).range(1..),
            help = "Number of scrape attempts before falling back"
        )]
        attempts: u32,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run the extraction pipeline over a saved squad page
    Parse {
        #[arg(help = "Path to the saved HTML page")]
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the built-in fallback squad
    Fallback {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the JSON schema of a squad dataset
    Schema,
}

fn parse_position(s: &str) -> Result<Position, String> {
    Position::from_str(s).map_err(|e| e.to_string())
}

fn build_config(cli: &Cli) -> Result<PipelineConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(min_rows) = cli.min_rows {
        config.validation.min_rows = min_rows;
    }
    if let Some(ratio) = cli.min_age_ratio {
        config.validation.min_age_ratio = ratio;
    }
    if let Some(positions) = cli.min_positions {
        config.validation.min_distinct_positions = positions;
    }
    if let Some(years) = cli.contract_years {
        config.contract_window.years_ahead = years;
    }

    config.validate()
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn log_source(data: &SquadData) {
    match &data.source {
        DataSource::Scraped => log::info!("Serving {} scraped player(s)", data.records.len()),
        DataSource::Fallback(reason) => log::info!("Serving fallback squad ({})", reason),
    }
}

fn render(records: Vec<PlayerRecord>, output: OutputArgs) {
    let filter = SquadFilter {
        position: output.position,
        min_age: output.min_age,
        max_age: output.max_age,
        min_value: output.min_value,
        max_value: output.max_value,
    };

    let filter = filter.validate().unwrap_or_else(|e| {
        log::error!("Invalid args: {e}");
        process::exit(1);
    });

    let records = filter.apply(records);

    match output.format {
        OutputFormat::Json => serialize_json(&records),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No players to display.");
            } else {
                println!("     {}", COLUMNS.join(" | "));
                for (i, record) in records.iter().enumerate() {
                    println!("{:>3}. {}", i + 1, record);
                }
                print!("{}", SquadStats::from_records(&records));
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let config = build_config(&cli).unwrap_or_else(|e| {
        log::error!("Error loading configuration: {}", e);
        process::exit(1);
    });
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let pipeline = SquadPipeline::new(config);

    match cli.command {
        Commands::Fetch {
            url,
            attempts,
            output,
        } => {
            let scraper = WebScraper::new(pipeline).unwrap_or_else(|e| {
                log::error!("Error creating scraper: {}", e);
                process::exit(1);
            });

            let data = scraper.fetch_squad(&url, attempts, today).await;
            log_source(&data);
            render(data.records, output);
        }

        Commands::Parse { file, output } => {
            log::info!("Parsing squad page from {}...", file.display());

            let html = fs::read_to_string(&file).unwrap_or_else(|e| {
                log::error!("Error reading {}: {}", file.display(), e);
                process::exit(1);
            });

            let data = pipeline.run(&html, today);
            log_source(&data);
            render(data.records, output);
        }

        Commands::Fallback { output } => {
            let records = fallback_dataset(today, &pipeline.config().contract_window);
            render(records, output);
        }

        Commands::Schema => {
            let schema = schemars::schema_for!(Vec<PlayerRecord>);
            serialize_json(&schema);
        }
    }
}
