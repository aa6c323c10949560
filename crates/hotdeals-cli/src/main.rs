mod query;
mod scrape;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hotdeals_core::LoaderKind;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hotdeals-cli")]
#[command(about = "Priceza hot-deals scraper command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one scrape of the hot-deals section
    Scrape {
        /// Keep only deals from this merchant (repeatable, case-insensitive)
        #[arg(long = "merchant", value_name = "NAME")]
        merchants: Vec<String>,
        /// Page loader to use instead of `HOTDEALS_LOADER`
        #[arg(long)]
        loader: Option<LoaderKind>,
        /// Also write a JSON export; a timestamped name is used when PATH is omitted
        #[arg(long, value_name = "PATH", num_args = 0..=1)]
        json: Option<Option<PathBuf>>,
        /// Also write a CSV export; a timestamped name is used when PATH is omitted
        #[arg(long, value_name = "PATH", num_args = 0..=1)]
        csv: Option<Option<PathBuf>>,
        /// Skip writing the collected deals to the database
        #[arg(long)]
        no_db: bool,
    },
    /// Print stored deals as JSON
    Deals {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long)]
        page_size: Option<i64>,
        #[arg(long)]
        merchant: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
    /// List merchant names
    Merchants,
    /// Manage the scraper config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print the scraper status document
    Status {
        /// Mark the status idle, clearing a run that died without doing so
        #[arg(long)]
        reset: bool,
    },
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Write the default scraper config to the data directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the scraper config a run would use
    Show,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = hotdeals_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Scrape {
            merchants,
            loader,
            json,
            csv,
            no_db,
        }) => {
            let options = scrape::ScrapeOptions {
                merchants,
                loader: loader.unwrap_or(config.loader),
                json,
                csv,
                persist: !no_db,
            };
            scrape::run_scrape(&config, options).await?;
        }
        Some(Commands::Deals {
            page,
            page_size,
            merchant,
            title,
        }) => {
            let pool = hotdeals_db::connect_from_app_config(&config).await?;
            let filters = hotdeals_db::DealFilters {
                page,
                page_size: page_size.unwrap_or(hotdeals_db::DEFAULT_PAGE_SIZE),
                merchant: merchant.as_deref(),
                title: title.as_deref(),
            };
            query::print_deals(&pool, &filters).await?;
        }
        Some(Commands::Merchants) => {
            let pool = hotdeals_db::connect_from_app_config(&config).await?;
            query::print_merchants(&pool).await?;
        }
        Some(Commands::Config { command }) => {
            let path = config.data_paths().scraper_config;
            match command {
                ConfigCommands::Init { force } => settings::init_scraper_config(&path, force)?,
                ConfigCommands::Show => settings::show_scraper_config(&path)?,
            }
        }
        Some(Commands::Status { reset }) => {
            let path = config.data_paths().status;
            if reset {
                settings::reset_stale_status(&path)?;
            }
            settings::print_status(&path)?;
        }
        Some(Commands::Db { command }) => {
            let pool = hotdeals_db::connect_from_app_config(&config).await?;
            match command {
                DbCommands::Ping => {
                    hotdeals_db::health_check(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = hotdeals_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        None => {
            println!("hotdeals-cli: no command given, see --help");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
