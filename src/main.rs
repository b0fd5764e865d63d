// inspection-report: Generate vehicle inspection PDF reports

use chrono::{Local, NaiveDate};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use inspection_report::email::LogMailer;
use inspection_report::storage::{FsBlobStore, FsRecordStore};
use inspection_report::{
    ReportConfig, ReportError, ReportMeta, ReportRequest, ReportService, ReportStyle,
    SchemaVersion,
};

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Generate vehicle inspection PDF reports")]
struct Args {
    /// Inspection data (JSON object of form fields, with an optional "photos" map)
    #[arg(short, long, required_unless_present = "field", conflicts_with = "field")]
    input: Option<PathBuf>,

    /// Form field instead of an input file, e.g. `exteriorChecks[0]=No dents` or
    /// `photos.frontBumper=front.jpg` (repeatable)
    #[arg(short, long, value_name = "KEY=VALUE")]
    field: Vec<String>,

    /// Directory photo references are resolved against (defaults to the input's directory)
    #[arg(long)]
    photos_dir: Option<PathBuf>,

    /// Directory reports and metadata are written to
    #[arg(short, long, default_value = "reports")]
    output_dir: PathBuf,

    /// Report configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Style preset: classic or vibrant
    #[arg(long)]
    style: Option<String>,

    /// Field schema: standard or extended
    #[arg(long)]
    schema: Option<String>,

    /// Leave all photo sections out
    #[arg(long)]
    no_images: bool,

    /// Add a verification QR code to the first page
    #[arg(long)]
    qr: bool,

    /// Report date (YYYY-MM-DD format, defaults to today)
    #[arg(short, long)]
    date: Option<String>,

    /// Fixed report id (generated when omitted)
    #[arg(long)]
    report_id: Option<String>,

    /// Give up if generation takes longer than this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Email address to notify (repeatable)
    #[arg(long)]
    notify: Vec<String>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ReportError> {
    let args = Args::parse();

    let config = build_config(&args)?;
    let date = parse_date(&args.date)?;
    let meta = match &args.report_id {
        Some(id) => ReportMeta::new(id.clone(), date),
        None => ReportMeta::generate(date),
    };

    // Load inspection data
    let mut request = match &args.input {
        Some(input) => load_request(input)?,
        None => ReportRequest::from_form_fields(parse_fields(&args.field)?)?,
    };
    request.meta = Some(meta);

    let photos_dir = args.photos_dir.clone().unwrap_or_else(|| {
        args.input
            .as_deref()
            .and_then(Path::parent)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let photos = FsBlobStore::new(photos_dir);
    let reports = FsBlobStore::new(&args.output_dir);
    let records = FsRecordStore::new(args.output_dir.join("records"));
    let mailer = LogMailer;

    let service = ReportService::new(config, &photos, &reports, &records, &mailer);
    let receipt = service.submit(request)?;

    println!("✓ Generated: {}", receipt.pdf_locator);
    println!("  Vehicle: {}", receipt.vehicle_number);
    println!("  Report ID: {}", receipt.report_id);
    println!("  Date: {}", format_date_display(&date));
    println!("  Pages: {}", receipt.page_count);
    println!("  Photos: {}", receipt.photo_count);

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn load_request(input: &Path) -> Result<ReportRequest, ReportError> {
    let text = fs::read_to_string(input)
        .map_err(|e| ReportError::InvalidRecord(format!("{}: {}", input.display(), e)))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| ReportError::InvalidRecord(format!("{}: {}", input.display(), e)))?;
    ReportRequest::from_json(value)
}

/// `key=value` pairs; the value may itself contain `=`.
fn parse_fields(fields: &[String]) -> Result<Vec<(String, String)>, ReportError> {
    fields
        .iter()
        .map(|field| {
            field
                .split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| ReportError::InvalidRecord(format!("field '{}' must be KEY=VALUE", field)))
        })
        .collect()
}

/// Config file first, then command-line overrides.
fn build_config(args: &Args) -> Result<ReportConfig, ReportError> {
    let mut config = match &args.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    if let Some(name) = &args.style {
        config.style.palette = ReportStyle::preset(name)?.palette;
    }
    if let Some(schema) = &args.schema {
        config.schema = schema.parse::<SchemaVersion>()?;
    }
    if args.no_images {
        config.include_images = false;
    }
    if args.qr {
        config.qr_code = true;
    }
    if args.timeout_secs.is_some() {
        config.timeout_secs = args.timeout_secs;
    }
    if !args.notify.is_empty() {
        config.notify.to = args.notify.clone();
    }
    config.validate()?;
    Ok(config)
}

fn parse_date(date_str: &Option<String>) -> Result<NaiveDate, ReportError> {
    match date_str {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ReportError::DateError(s.clone())),
        None => Ok(Local::now().date_naive()),
    }
}

fn format_date_display(date: &NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}
