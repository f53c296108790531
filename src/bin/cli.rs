//! silverfish CLI
//!
//! Local execution entry point.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use silverfish::{
    error::Result,
    models::{Config, Place},
    pipeline,
    services::{HttpFetcher, PlaceSource, StaticPlaces, place_source},
};

/// silverfish - Restaurant Contact Crawler
#[derive(Parser, Debug)]
#[command(
    name = "silverfish",
    version,
    about = "Crawls restaurant websites for phone numbers, emails and ordering links"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "silverfish.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover places and crawl their websites
    Crawl {
        /// Output CSV path (default: output.path from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only crawl the configured seed places, never query the Places API
        #[arg(long)]
        static_only: bool,
    },

    /// Validate the configuration file
    Validate,

    /// List discovered places without crawling
    Places {
        /// Only list the configured seed places
        #[arg(long)]
        static_only: bool,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Resolve the place source and fetch the places to crawl.
async fn load_places(config: &Config, static_only: bool) -> Result<Vec<Place>> {
    let source: Box<dyn PlaceSource> = if static_only {
        if config.places.seeds.is_empty() {
            log::warn!("--static-only given but no [[places.seeds]] are configured");
        }
        Box::new(StaticPlaces::new(config.places.seeds.clone()))
    } else {
        place_source(&config.places)?
    };

    source.fetch_places().await
}

fn create_output(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("silverfish starting...");

    let config = Config::load_or_default(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Crawl {
            output,
            static_only,
        } => {
            config.validate()?;

            let places = load_places(&config, static_only).await.map_err(|e| {
                log::error!("Place discovery failed: {}", e);
                e
            })?;
            if places.is_empty() {
                log::warn!("No places to crawl");
            }

            let output = output.unwrap_or_else(|| PathBuf::from(&config.output.path));
            let file = create_output(&output)?;
            let fetcher = Arc::new(HttpFetcher::new(&config.crawler)?);

            let summary = pipeline::run_crawler(&config, places, fetcher, file).await?;

            log::info!(
                "Wrote {} rows to {} ({} duplicate domains, {} failed rows)",
                summary.sink.written,
                output.display(),
                summary.sink.duplicates,
                summary.sink.failed
            );
            if summary.sink.failed > 0 {
                log::warn!("{} rows could not be written", summary.sink.failed);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} follow keywords, {} blocked platforms, {} seed places)",
                config.extraction.follow_keywords.len(),
                config.extraction.blocked_keywords.len(),
                config.places.seeds.len()
            );

            log::info!("All validations passed!");
        }

        Command::Places { static_only } => {
            let places = load_places(&config, static_only).await?;
            for place in &places {
                let site = if place.has_website() {
                    place.website_uri.as_str()
                } else {
                    "-"
                };
                println!("{}\t{}", place.name, site);
            }
            log::info!(
                "{} places, {} with a website",
                places.len(),
                places.iter().filter(|p| p.has_website()).count()
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
