//! sortdesk - drive the sorting engine against a local database
//!
//! Every command prints its summary as JSON on stdout; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use sortdesk_common::config::{database_path, load_or_default, RootFolderResolver};
use sortdesk_common::time::{parse_day_date, today, tomorrow};
use sortdesk_engine::models::OfflineScan;
use sortdesk_engine::parsers::RawDocument;
use sortdesk_engine::services::sequencing::parse_sequence;
use sortdesk_engine::services::{export_route, CarrierParser};
use sortdesk_engine::{Engine, EngineSettings};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "sortdesk")]
#[command(about = "Parcel ingestion and sort tracking")]
#[command(version)]
struct Args {
    /// Root folder holding the database
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// Bootstrap TOML file
    #[arg(long, global = true, env = "SORTDESK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a carrier spreadsheet; the file name names the driver
    Import {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,
        /// Sorting date (default: tomorrow)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Restrict driver lookup to one subcontractor
        #[arg(long)]
        scope: Option<Uuid>,
    },
    /// Import a multi-driver sequencing manifest (PDF or extracted text)
    ImportSequencing {
        file: PathBuf,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        scope: Option<Uuid>,
    },
    /// Apply a single-route sequence to an existing route
    SequenceRoute { route_id: Uuid, file: PathBuf },
    /// Build a driver's route from a single-route sequence
    CreateRoute {
        driver_id: Uuid,
        file: PathBuf,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Record one scan
    Scan {
        tracking_code: String,
        #[arg(long)]
        operator: Uuid,
        /// Sorting date (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        offline: bool,
    },
    /// Replay an offline batch (JSON array of {tracking_code, scanned_at})
    Sync {
        file: PathBuf,
        #[arg(long)]
        operator: Uuid,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Write a route sheet (.xlsx) in delivery order
    ExportRoute {
        route_id: Uuid,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// List the import history of a day, newest first
    Imports {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    CarrierA,
    CarrierB,
    Auto,
}

impl From<FormatArg> for CarrierParser {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::CarrierA => CarrierParser::CarrierA,
            FormatArg::CarrierB => CarrierParser::CarrierB,
            FormatArg::Auto => CarrierParser::Auto,
        }
    }
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_day_date(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root_folder = RootFolderResolver::new(args.root_folder.clone(), &config).resolve();
    let db_path = database_path(&root_folder, &config);
    info!("Database: {}", db_path.display());

    let settings = EngineSettings::from_toml(&config).context("Invalid configuration")?;
    let engine = Engine::open(&db_path, &settings)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match args.command {
        Commands::Import { file, format, date, scope } => {
            let document = load_document(&file)?;
            let summary = engine
                .importer
                .import_document(date.unwrap_or_else(tomorrow), &document, format.into(), scope)
                .await?;
            print_json(&summary)
        }
        Commands::ImportSequencing { file, date, scope } => {
            let document = load_document(&file)?;
            let summary = engine
                .sequencing
                .import_manifest_document(date.unwrap_or_else(tomorrow), &document, scope)
                .await?;
            print_json(&summary)
        }
        Commands::SequenceRoute { route_id, file } => {
            let document = load_document(&file)?;
            let entries = parse_sequence(&document)?;
            let summary = engine
                .sequencing
                .apply_route_sequence(route_id, &document.file_name, &entries)
                .await?;
            print_json(&summary)
        }
        Commands::CreateRoute { driver_id, file, date } => {
            let document = load_document(&file)?;
            let entries = parse_sequence(&document)?;
            let summary = engine
                .sequencing
                .create_route_with_sequence(
                    date.unwrap_or_else(tomorrow),
                    driver_id,
                    &document.file_name,
                    &entries,
                )
                .await?;
            print_json(&summary)
        }
        Commands::Scan { tracking_code, operator, date, offline } => {
            let outcome = engine
                .scanner
                .record_scan(date.unwrap_or_else(today), &tracking_code, operator, offline)
                .await?;
            print_json(&outcome)
        }
        Commands::Sync { file, operator, date } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let scans: Vec<OfflineScan> =
                serde_json::from_str(&content).context("Offline batch is not a JSON scan list")?;
            let summary = engine
                .sync
                .sync_batch(date.unwrap_or_else(today), operator, &scans)
                .await?;
            print_json(&summary)
        }
        Commands::ExportRoute { route_id, output } => {
            let bytes = export_route(&*engine.store, route_id).await?;
            std::fs::write(&output, bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Route sheet written to {}", output.display());
            Ok(())
        }
        Commands::Imports { date } => {
            use sortdesk_engine::store::ImportLog;
            let records = engine.store.list_imports(date.unwrap_or_else(tomorrow)).await?;
            print_json(&records)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read an input file; PDFs are converted to layout text first
fn load_document(path: &Path) -> Result<RawDocument> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .context("Input path has no file name")?;

    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    let bytes = if is_pdf {
        pdf_to_text(path)?.into_bytes()
    } else {
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
    };

    Ok(RawDocument::new(file_name, bytes))
}

fn pdf_to_text(path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(path)
        .arg("-")
        .output()
        .context("Failed to run pdftotext (install poppler-utils)")?;

    if !output.status.success() {
        bail!(
            "pdftotext failed (exit {}): {}",
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let text = String::from_utf8_lossy(&output.stdout).to_string();
    if text.trim().is_empty() {
        bail!("{} has no extractable text", path.display());
    }
    Ok(text)
}
