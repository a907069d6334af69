// reset; cargo run -- validate ./data/Records.xlsx --sheet-name January
// reset; cargo run -- submit ./data/Records.xlsx --url https://importer.example.org
// RUST_LOG=sheet_import_lib=debug cargo run -- import ./data/Records.xlsx --store records.jsonl

mod utils;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sheet_import_lib::export::export_to_csv;
use sheet_import_lib::pending::PendingImports;
use sheet_import_lib::report::log_validation_report;
use sheet_import_lib::store::{JsonLinesStore, MemoryStore};
use sheet_import_lib::{
    check_file, decode_workbook, format_findings, preview_workbook, FileCandidate, Finding,
    ImportError, Importer, RowValidator, Sheet, WorkbookPreview, ERRORS_LOG_FILE,
};
use tracing_subscriber::EnvFilter;

use crate::utils::{generate_unique_filename, select_sheets, submit_sheets};

#[derive(Parser)]
#[command(name = "sheet-importer")]
#[command(about = "A tool to validate spreadsheet records and import them")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a workbook and print every finding grouped by sheet
    Validate {
        /// Path to the .xlsx or .xls file
        file: PathBuf,

        /// Optional sheet name to validate (if not specified, validates every sheet)
        #[arg(long)]
        sheet_name: Option<String>,
    },

    /// Validate locally, then send the workbook to a remote importer
    Submit {
        file: PathBuf,

        #[arg(long)]
        sheet_name: Option<String>,

        /// Base URL of the importer service; data is posted to {url}/api/import
        #[arg(short, long)]
        url: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Validate and append the records to a local JSON lines store
    Import {
        file: PathBuf,

        #[arg(long)]
        sheet_name: Option<String>,

        #[arg(long, default_value = "records.jsonl")]
        store: PathBuf,
    },

    /// Validate and write the canonical records to a CSV file
    Export {
        file: PathBuf,

        #[arg(long)]
        sheet_name: Option<String>,

        /// Output CSV path (generated from the workbook name if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let arguments = Args::parse();
    match arguments.command {
        Command::Validate { file, sheet_name } => {
            let sheets = load_sheets(&file, sheet_name.as_deref())?;
            preview_or_exit(&sheets);
        }
        Command::Submit {
            file,
            sheet_name,
            url,
            timeout,
        } => {
            let sheets = load_sheets(&file, sheet_name.as_deref())?;
            preview_or_exit(&sheets);

            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(timeout))
                .build()?;
            match submit_sheets(&url, &sheets, &client) {
                Ok(response) => {
                    match response.inserted {
                        Some(inserted) => println!("✅ Import accepted: {inserted} record(s) saved"),
                        None => println!("✅ Import accepted"),
                    }
                    if let Some(message) = response.message {
                        println!("{message}");
                    }
                }
                Err(failure) => {
                    tracing::debug!(?failure, "remote import failed");
                    eprintln!("❌ Import failed: {}", failure.display_message());
                    std::process::exit(1);
                }
            }
        }
        Command::Import {
            file,
            sheet_name,
            store,
        } => {
            let sheets = load_sheets(&file, sheet_name.as_deref())?;
            let validator = RowValidator::new();
            let mut pending = PendingImports::default();
            let (preview, token) = pending.validate_and_stash(sheets, &validator);
            report_preview(&preview);
            let Some(token) = token else {
                exit_with_findings(&preview.findings());
            };

            let store = JsonLinesStore::open(&store)?;
            let mut importer = Importer::new(store).with_validator(validator);
            match importer.import_pending(&mut pending, token) {
                Ok(summary) => {
                    println!(
                        "✅ {} record(s) imported into {}",
                        summary.inserted,
                        importer.store().path().display()
                    );
                }
                Err(error) => exit_with_import_error(error),
            }
        }
        Command::Export {
            file,
            sheet_name,
            output,
        } => {
            let sheets = load_sheets(&file, sheet_name.as_deref())?;
            let mut importer = Importer::new(MemoryStore::new());
            if let Err(error) = importer.import(&sheets) {
                exit_with_import_error(error);
            }

            let csv_path = output.unwrap_or_else(|| PathBuf::from(generate_unique_filename(&file)));
            export_to_csv(importer.store().records(), &csv_path)?;
            println!("✅ CSV file created: {}", csv_path.display());
        }
    }

    Ok(())
}

// Runs the upload guard before decoding
fn load_sheets(path: &Path, sheet_name: Option<&str>) -> anyhow::Result<Vec<Sheet>> {
    let candidate = FileCandidate::from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if let Some(reason) = check_file(&candidate) {
        eprintln!("❌ {reason}");
        std::process::exit(1);
    }

    let sheets = decode_workbook(path)?;
    select_sheets(sheets, sheet_name)
}

fn preview_or_exit(sheets: &[Sheet]) {
    let preview = preview_workbook(sheets, &RowValidator::new());
    report_preview(&preview);
    if !preview.can_import() {
        exit_with_findings(&preview.findings());
    }
}

fn report_preview(preview: &WorkbookPreview) {
    for sheet in &preview.sheets {
        println!(
            "{}: {}/{} valid row(s)",
            sheet.name, sheet.valid_rows, sheet.total_rows
        );
    }
    print_findings(&preview.findings());

    if preview.can_import() {
        println!("✅ Validation completed!");
    }
}

fn exit_with_findings(findings: &[Finding]) -> ! {
    let errors = findings.iter().filter(|f| f.is_error()).count();
    if let Err(error) = log_validation_report(Path::new(ERRORS_LOG_FILE), findings) {
        tracing::warn!(%error, "could not write validation report");
    }
    println!("❌ Validation failed with {errors} errors");
    eprintln!("❌ Check {ERRORS_LOG_FILE} for details.");
    std::process::exit(1);
}

fn print_findings(findings: &[Finding]) {
    for sheet in format_findings(findings).iter() {
        println!("Sheet \"{}\":", sheet.sheet_name);
        for finding in &sheet.findings {
            let marker = if finding.is_error() { "❌" } else { "⚠️" };
            if finding.row == 0 {
                println!("  {marker} {}", finding.message);
            } else {
                println!("  {marker} row {}: {}", finding.row, finding.message);
            }
        }
    }
}

fn exit_with_import_error(error: ImportError) -> ! {
    match error {
        ImportError::Rejected(findings) => {
            print_findings(&findings);
            if let Err(error) = log_validation_report(Path::new(ERRORS_LOG_FILE), &findings) {
                tracing::warn!(%error, "could not write validation report");
            }
            eprintln!("❌ {}", ImportError::Rejected(findings));
            eprintln!("❌ Check {ERRORS_LOG_FILE} for details.");
        }
        other => eprintln!("❌ Import failed with error: {other}"),
    }
    std::process::exit(1);
}
