use std::fmt::Display;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use tashri::legislation::{LawType, LegislationScraper};
use tashri::ministers::MinistersScraper;
use tashri::navigator::Pacing;
use tashri::parliamentarians::ParliamentarianScraper;
use tashri::sink::{documents_equal, stamp_field};
use tashri::utils::RunStats;
use tashri::{HttpBrowser, RunContext, ScrapeConfig};

#[derive(Parser)]
#[command(name = "tashri")]
#[command(
    about = "A scraper for the Moroccan House of Representatives and government compositions",
    long_about = None
)]
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
        short = 'd',
        long = "output-dir",
        default_value = ".",
        global = true,
        help = "Directory the JSON files are written to"
    )]
    output_dir: PathBuf,

    #[arg(
        long,
        global = true,
        help = "Disable the randomized pauses between page loads"
    )]
    no_pacing: bool,

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

#[derive(Subcommand)]
enum Commands {
    /// Crawl bills, private members' bills and adopted texts with their procedural history
    Legislation {
        #[arg(long, help = "Chamber home page holding the legislation menu")]
        url: Option<String>,

        #[arg(
            short = 'c',
            long = "category",
            value_parser = parse_category,
            help = "Restrict the crawl to a category (projets, propositions, adopted); repeatable"
        )]
        categories: Vec<LawType>,

        #[arg(
            long,
            help = "Last listing page to visit per category",
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        page_ceiling: Option<u32>,

        #[arg(
            long,
            default_value_t = 2011,
            help = "Oldest legislature (by start year) to collect adopted texts for"
        )]
        min_year: i32,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Walk the member directory of the House of Representatives
    Parliamentarians {
        #[arg(long, help = "First page of the member directory")]
        url: Option<String>,

        #[arg(
            long,
            default_value_t = 33,
            help = "Last directory page to visit",
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        page_ceiling: u32,

        #[arg(long, help = "Legislative term stamped on every record, e.g. 2021-2026")]
        term: Option<String>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Read a government's ministers from Wikipedia and follow its infobox links once
    Ministers {
        #[arg(long, help = "Wikipedia page of the starting government")]
        url: Option<String>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Check whether two JSON files hold the same document
    Compare {
        #[arg(help = "First JSON file")]
        first: PathBuf,

        #[arg(help = "Second JSON file")]
        second: PathBuf,
    },
    /// Add a field to every object of a JSON array file
    Stamp {
        #[arg(help = "JSON file holding a top-level array")]
        file: PathBuf,

        #[arg(long, help = "Field name")]
        key: String,

        #[arg(long, help = "Field value")]
        value: String,
    },
}

fn parse_category(s: &str) -> Result<LawType, String> {
    LawType::from_str(s)
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

fn print_records<T: Display>(records: &[T]) {
    for (i, record) in records.iter().enumerate() {
        println!("{:>3}. {}", i + 1, record);
    }
}

fn print_stats(stats: &RunStats, format: &OutputFormat) {
    match format {
        OutputFormat::Text => print!("{}", stats),
        OutputFormat::Json => eprint!("{}", stats),
    }
}

fn start(config: ScrapeConfig) -> RunContext<HttpBrowser> {
    RunContext::start(config).unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let mut config = ScrapeConfig::default().with_output_dir(cli.output_dir.clone());
    if cli.no_pacing {
        config = config.with_pacing(Pacing::none());
    }

    match cli.command {
        Commands::Legislation {
            url,
            categories,
            page_ceiling,
            min_year,
            format,
        } => {
            if let Some(url) = url {
                config = config.with_legislation_url(url);
            }
            if !categories.is_empty() {
                config = config.with_categories(categories);
            }
            config = config
                .with_law_page_ceiling(page_ceiling)
                .with_min_legislature_year(min_year);

            let mut ctx = start(config);
            let result = LegislationScraper::new(&mut ctx).run().await;
            ctx.finish();

            let run = result.unwrap_or_else(|e| {
                log::error!("Error scraping legislation: {}", e);
                process::exit(1);
            });
            for failure in &run.failures {
                log::warn!("Failed extraction: {}", failure);
            }

            match format {
                OutputFormat::Json => serialize_json(&run.catalog),
                OutputFormat::Text => {
                    if run.catalog.is_empty() {
                        println!("No laws collected.");
                    }
                    for law_type in LawType::ALL {
                        let records = run.catalog.get(law_type);
                        if !records.is_empty() {
                            println!("\n{} ({}):", law_type, records.len());
                            for record in records {
                                println!("{}", record);
                            }
                        }
                    }
                }
            }
            print_stats(&run.stats(), &format);
        }
        Commands::Parliamentarians {
            url,
            page_ceiling,
            term,
            format,
        } => {
            if let Some(url) = url {
                config = config.with_parliamentarians_url(url);
            }
            config = config
                .with_member_page_ceiling(Some(page_ceiling))
                .with_term(term);

            let mut ctx = start(config);
            let result = ParliamentarianScraper::new(&mut ctx).run().await;
            ctx.finish();

            let run = result.unwrap_or_else(|e| {
                log::error!("Error scraping parliamentarians: {}", e);
                process::exit(1);
            });
            if let Some(end) = &run.end {
                log::info!("Directory walk ended: {}", end);
            }

            match format {
                OutputFormat::Json => serialize_json(&run.parliamentarians),
                OutputFormat::Text => print_records(&run.parliamentarians),
            }
            print_stats(&run.stats(), &format);
        }
        Commands::Ministers { url, format } => {
            if let Some(url) = url {
                config = config.with_government_url(url);
            }

            let mut ctx = start(config);
            let result = MinistersScraper::new(&mut ctx).run().await;
            ctx.finish();

            let run = result.unwrap_or_else(|e| {
                log::error!("Error scraping ministers: {}", e);
                process::exit(1);
            });

            match format {
                OutputFormat::Json => serialize_json(&run.catalog),
                OutputFormat::Text => print!("{}", run.catalog),
            }
            print_stats(&run.stats(), &format);
        }
        Commands::Compare { first, second } => match documents_equal(&first, &second) {
            Ok(true) => println!("The JSON files are identical."),
            Ok(false) => println!("The JSON files are different."),
            Err(e) => {
                log::error!("Error comparing JSON files: {}", e);
                process::exit(1);
            }
        },
        Commands::Stamp { file, key, value } => match stamp_field(&file, &key, &value) {
            Ok(count) => println!(
                "Added '{}' to {} records in {}",
                key,
                count,
                file.display()
            ),
            Err(e) => {
                log::error!("Error updating {}: {}", file.display(), e);
                process::exit(1);
            }
        },
    }
}
