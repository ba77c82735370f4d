//! Shelfscrape CLI - scrape a bookstore search listing into a local shelf

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use shelfscrape::config::{self, ShelfConfig};
use shelfscrape::extractor::Extractor;
use shelfscrape::menu::{self, Menu};
use shelfscrape::provider::ChromeLauncher;
use shelfscrape::ui::{self, Icons, Spinner};
use shelfscrape::{QueryField, SqliteStore};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code for failures before the shelf is usable
const EXIT_STARTUP: i32 = 2;

#[derive(Parser)]
#[command(name = "shelfscrape")]
#[command(version)]
#[command(about = "Scrape a bookstore search listing into a deduplicated SQLite shelf")]
#[command(long_about = r#"
Shelfscrape walks every page of a bookstore search, keeps title, author,
price and link for each listing, and stores new titles in a local SQLite file.

Example usage:
  shelfscrape                      # interactive menu
  shelfscrape update
  shelfscrape query --field author --keyword Smith
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the listing and store new books
    Update,

    /// Search stored books by title or author
    Query {
        /// Field to match: title or author
        #[arg(short, long, default_value = "title")]
        field: String,

        /// Substring to look for
        #[arg(short, long)]
        keyword: String,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show statistics about the shelf
    Stats,

    /// Interactive menu (default)
    Menu,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let (settings, store) = match startup(&cli) {
        Ok(ready) => ready,
        Err(e) => {
            ui::error(&format!("Startup failed: {e:#}"));
            std::process::exit(EXIT_STARTUP);
        }
    };

    let extractor = Extractor::new(settings.extractor_config());
    let launcher = ChromeLauncher::new(settings.chrome_options());

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Update => {
            let cfg = extractor.config();
            ui::header(&format!("Scraping '{}' from {}", cfg.keyword, cfg.site_url));

            let spinner = Spinner::new("Starting browser...");
            let report = extractor.run_with_progress(&launcher, |batch| {
                spinner.set_message(&format!(
                    "Scraped page {} ({} books)",
                    batch.number,
                    batch.extracted()
                ));
            });
            spinner.finish_and_clear();

            let upserted = store.upsert(&report.records);
            menu::write_update_summary(&mut io::stdout(), &report, &upserted)?;
        }

        Commands::Query { field, keyword, format } => {
            let field: QueryField = field.parse()?;
            let books = store.query(field, &keyword)?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&books)?);
            } else {
                println!("{} Searching {} for '{}'...", Icons::SEARCH, field, keyword);
                if books.is_empty() {
                    println!("{} No matching books.", Icons::EMPTY);
                } else {
                    println!("{}", ui::books_table(&books));
                    ui::summary_row("Matches:", &books.len().to_string());
                }
            }
        }

        Commands::Stats => {
            let stats = store.stats()?;
            let price_range = match (stats.min_price, stats.max_price) {
                (Some(min), Some(max)) => format!("{min} - {max}"),
                _ => "-".to_string(),
            };

            println!("{} Shelf Statistics", Icons::STATS);
            println!(
                "{}",
                ui::stats_table(&[
                    ("Books", stats.books.to_string()),
                    ("Unknown author", stats.unknown_author.to_string()),
                    ("Without link", stats.without_link.to_string()),
                    ("Price range", price_range),
                ])
            );
        }

        Commands::Menu => {
            let stdin = io::stdin();
            Menu::new(&store, stdin.lock(), io::stdout(), || extractor.run(&launcher)).run()?;
        }
    }

    Ok(())
}

/// Load configuration and open the shelf
fn startup(cli: &Cli) -> anyhow::Result<(ShelfConfig, SqliteStore)> {
    let settings = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let database = cli.database.clone().unwrap_or_else(|| settings.database_path());

    config::ensure_db_dir(&database)?;
    let store = SqliteStore::open(&database)?;
    tracing::debug!("Opened shelf at {}", database.display());

    Ok((settings, store))
}
