use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use clap::Parser;
use hotdeals_core::{write_scraper_config, LoaderKind, ProductRecord, ScraperConfig, ScraperStatus};

use super::*;

fn record(title: &str, merchant: Option<&str>) -> ProductRecord {
    ProductRecord {
        title: title.to_string(),
        price: "399".to_string(),
        original_price: None,
        discount: None,
        image_url: None,
        product_url: None,
        merchant: merchant.map(str::to_string),
        merchant_image: None,
        rating: None,
        reviews_count: None,
    }
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["hotdeals-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn scrape_defaults() {
    let cli = Cli::try_parse_from(["hotdeals-cli", "scrape"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            ref merchants,
            loader: None,
            json: None,
            csv: None,
            no_db: false,
        }) if merchants.is_empty()
    ));
}

#[test]
fn scrape_collects_repeated_merchants_and_loader() {
    let cli = Cli::try_parse_from([
        "hotdeals-cli",
        "scrape",
        "--merchant",
        "lazada",
        "--merchant",
        "shopee",
        "--loader",
        "http",
        "--no-db",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            ref merchants,
            loader: Some(LoaderKind::Http),
            no_db: true,
            ..
        }) if merchants == &["lazada", "shopee"]
    ));
}

#[test]
fn scrape_export_flags_take_an_optional_path() {
    let cli = Cli::try_parse_from(["hotdeals-cli", "scrape", "--json", "--csv", "out.csv"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            json: Some(None),
            csv: Some(Some(ref path)),
            ..
        }) if path == Path::new("out.csv")
    ));
}

#[test]
fn scrape_rejects_unknown_loader() {
    assert!(Cli::try_parse_from(["hotdeals-cli", "scrape", "--loader", "curl"]).is_err());
}

#[test]
fn parses_deals_filters() {
    let cli = Cli::try_parse_from([
        "hotdeals-cli",
        "deals",
        "--page",
        "2",
        "--page-size",
        "10",
        "--merchant",
        "LAZADA",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Deals {
            page: 2,
            page_size: Some(10),
            merchant: Some(ref m),
            title: None,
        }) if m == "LAZADA"
    ));
}

#[test]
fn parses_config_and_db_commands() {
    let init = Cli::try_parse_from(["hotdeals-cli", "config", "init", "--force"])
        .expect("expected valid cli args");
    assert!(matches!(
        init.command,
        Some(Commands::Config {
            command: ConfigCommands::Init { force: true }
        })
    ));

    let migrate =
        Cli::try_parse_from(["hotdeals-cli", "db", "migrate"]).expect("expected valid cli args");
    assert!(matches!(
        migrate.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn summary_shows_first_records_and_remainder() {
    let records: Vec<ProductRecord> = (1..=7)
        .map(|i| record(&format!("Deal {i}"), (i % 2 == 0).then_some("LAZADA")))
        .collect();

    let lines = scrape::summary_lines(&records, 5);

    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], "collected 7 deals");
    assert_eq!(lines[1], " 1. Deal 1 | 399 | -");
    assert_eq!(lines[2], " 2. Deal 2 | 399 | LAZADA");
    assert_eq!(lines[6], "... and 2 more");
}

#[test]
fn summary_mentions_original_price() {
    let mut discounted = record("Air Fryer 5L", Some("CENTRAL"));
    discounted.original_price = Some("2,590".to_string());

    let lines = scrape::summary_lines(&[discounted], 5);
    assert_eq!(lines[1], " 1. Air Fryer 5L | 399 (was 2,590) | CENTRAL");
}

#[test]
fn export_path_prefers_explicit_path() {
    let at = Local
        .with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
        .single()
        .expect("unambiguous local time");

    assert_eq!(
        scrape::export_path(Some(Path::new("deals.json")), "json", at),
        PathBuf::from("deals.json")
    );
    assert_eq!(
        scrape::export_path(None, "csv", at),
        PathBuf::from("hot_deals_20240501_093000.csv")
    );
}

#[test]
fn config_init_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scraper_config.json");
    let custom = ScraperConfig {
        base_url: "https://www.priceza.com/th".to_string(),
        ..ScraperConfig::default()
    };
    write_scraper_config(&path, &custom).expect("seed config");

    assert!(settings::init_scraper_config(&path, false).is_err());
    assert_eq!(hotdeals_scraper::active_scraper_config(&path), custom);

    settings::init_scraper_config(&path, true).expect("forced init");
    assert_eq!(hotdeals_scraper::active_scraper_config(&path), ScraperConfig::default());
}

#[test]
fn active_config_falls_back_to_defaults_without_creating_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scraper_config.json");

    assert_eq!(hotdeals_scraper::active_scraper_config(&path), ScraperConfig::default());
    assert!(!path.exists());
}

#[test]
fn parses_status_reset() {
    let plain = Cli::try_parse_from(["hotdeals-cli", "status"]).expect("expected valid cli args");
    assert!(matches!(plain.command, Some(Commands::Status { reset: false })));

    let reset = Cli::try_parse_from(["hotdeals-cli", "status", "--reset"])
        .expect("expected valid cli args");
    assert!(matches!(reset.command, Some(Commands::Status { reset: true })));
}

#[test]
fn status_reset_unblocks_a_new_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scraper_status.json");
    hotdeals_scraper::status::write_status(&path, ScraperStatus { is_scraping: true })
        .expect("seed stale status");
    assert!(hotdeals_scraper::StatusGuard::acquire(&path).is_err());

    settings::reset_stale_status(&path).expect("reset");

    assert!(!hotdeals_scraper::read_status(&path).is_scraping);
    let guard = hotdeals_scraper::StatusGuard::acquire(&path).expect("acquire after reset");
    drop(guard);
}
