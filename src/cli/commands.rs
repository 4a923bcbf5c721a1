//! CLI commands implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::models::PropertyType;
use crate::repository::{run_migrations, AsyncSqlitePool, ListingRepository};
use crate::scrapers::PageExtractor;
use crate::services::{BatchReport, ImageStore, ImportService};

#[derive(Parser)]
#[command(name = "melk")]
#[command(about = "Real-estate listing acquisition and ingestion for divar.ir")]
#[command(version)]
pub struct Cli {
    /// Data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Import crawl-output JSON into the database
    Import {
        /// JSON file or directory of JSON files (default: <data_dir>/jsondata)
        input: Option<PathBuf>,
    },

    /// Fetch listing pages and write their extracted records to a JSON file
    Scrape {
        /// Listing page URLs
        urls: Vec<String>,
        /// Output file for the extracted records
        #[arg(short, long, default_value = "divar_data.json")]
        output: PathBuf,
    },

    /// Show row counts for the stored data
    Status,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(|| PathBuf::from("data"));
    let settings = Settings::load(&data_dir)?;

    match cli.command {
        Commands::Init => cmd_init(&settings).await,
        Commands::Import { input } => cmd_import(&settings, input).await,
        Commands::Scrape { urls, output } => cmd_scrape(&settings, &urls, &output).await,
        Commands::Status => cmd_status(&settings).await,
    }
}

fn repository(settings: &Settings) -> ListingRepository {
    ListingRepository::new(AsyncSqlitePool::new(&settings.database_url()))
}

/// Initialize the data directory and database.
async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    std::fs::create_dir_all(&settings.data_dir)?;
    std::fs::create_dir_all(settings.images_dir())?;

    run_migrations(&settings.database_url()).await?;
    settings.save()?;

    println!(
        "{} Initialized melkacquire in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}

/// Import one or more crawl-output files.
async fn cmd_import(settings: &Settings, input: Option<PathBuf>) -> anyhow::Result<()> {
    let input = input.unwrap_or_else(|| settings.data_dir.join("jsondata"));
    if !input.exists() {
        anyhow::bail!("input path does not exist: {}", input.display());
    }

    run_migrations(&settings.database_url()).await?;
    let service = ImportService::new(
        repository(settings),
        ImageStore::new(
            settings.images_dir(),
            Duration::from_secs(settings.image_timeout_secs),
        ),
    );

    let files: Vec<PathBuf> = if input.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&input)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        files
    } else {
        vec![input]
    };

    if files.is_empty() {
        println!("{} No JSON files to import", style("!").yellow());
        return Ok(());
    }

    let mut total = BatchReport::default();
    for file in &files {
        println!("{} Importing {}", style("→").cyan(), file.display());

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("ingesting ads...");
        spinner.enable_steady_tick(Duration::from_millis(100));

        let report = service.run(file).await?;
        spinner.finish_and_clear();

        for error in &report.errors {
            println!("  {} {}", style("✗").red(), error);
        }
        println!(
            "  {} {} stored, {} failed of {}",
            style("✓").green(),
            report.succeeded,
            report.failed,
            report.total
        );

        total.total += report.total;
        total.succeeded += report.succeeded;
        total.failed += report.failed;
    }

    if files.len() > 1 {
        println!(
            "{} Overall: {} stored, {} failed of {}",
            style("✓").green(),
            total.succeeded,
            total.failed,
            total.total
        );
    }

    Ok(())
}

/// Fetch listing pages and write extracted records to a JSON file.
async fn cmd_scrape(settings: &Settings, urls: &[String], output: &PathBuf) -> anyhow::Result<()> {
    if urls.is_empty() {
        anyhow::bail!("no URLs given");
    }

    let mut extractor = PageExtractor::new(
        settings.chrome_headless,
        Duration::from_secs(settings.page_timeout_secs),
        &settings.user_agent,
    );

    let bar = ProgressBar::new(urls.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("[{bar:40}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut records = Vec::new();
    let mut failed = 0usize;
    for (i, url) in urls.iter().enumerate() {
        bar.set_message(url.clone());
        if let Some(record) = extractor.extract(url).await {
            records.push(record);
        } else {
            failed += 1;
        }
        bar.inc(1);

        if i + 1 < urls.len() {
            tokio::time::sleep(Duration::from_millis(settings.ad_delay_ms)).await;
        }
    }
    extractor.close().await;
    bar.finish_and_clear();

    let json = serde_json::to_string_pretty(&records)?;
    tokio::fs::write(output, json).await?;

    println!(
        "{} Extracted {} of {} listings to {}",
        style("✓").green(),
        records.len(),
        urls.len(),
        output.display()
    );
    if failed > 0 {
        println!("{} {} pages could not be fetched", style("!").yellow(), failed);
    }

    Ok(())
}

/// Show row counts.
async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let repo = repository(settings);
    let (cities, neighborhoods, properties, sale_details, rent_details) = repo.counts().await?;

    println!("{}", style("melkacquire status").bold());
    println!("  Database: {}", settings.database_url());
    println!("  Cities:        {}", cities);
    println!("  Neighborhoods: {}", neighborhoods);
    println!(
        "  Properties:    {} ({} {}, {} {})",
        properties,
        sale_details,
        PropertyType::Sale.as_str(),
        rent_details,
        PropertyType::Rent.as_str()
    );

    Ok(())
}
