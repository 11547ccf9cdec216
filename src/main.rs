//! Command-line entry point: generate event approval letters and lab records.

use academic_forms_pdf::{
    generate_approval_letter, generate_lab_record, AppError, ApprovalLetter, GeneratedPdf,
    ImageAsset, Institution, LabRecordSource, RenderContext, RenderWarning,
};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Generate event approval letters and lab records as PDF")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Institution profile (JSON) overriding the built-in header texts
    #[arg(long, global = true)]
    institution: Option<PathBuf>,

    /// Logo image to display in the header's logo cell
    #[arg(long, global = true)]
    logo: Option<PathBuf>,

    /// Output filename (defaults to a name derived from the document)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Event approval letter with budget table
    Approval {
        /// Letter fields as JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Text file with a table pasted from a spreadsheet or document
        #[arg(long)]
        table_file: Option<PathBuf>,
    },
    /// Lab record with program and output screenshots
    LabRecord {
        /// Record fields as JSON; image paths are relative to this file
        #[arg(short, long)]
        input: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let args = Args::parse();

    let institution = match &args.institution {
        Some(path) => Institution::load(path)?,
        None => Institution::default(),
    };
    let mut ctx = RenderContext::new(institution);
    if let Some(path) = &args.logo {
        ctx = match ImageAsset::open(path) {
            Ok(logo) => ctx.with_logo(Some(logo)),
            Err(e) => ctx.with_warning(RenderWarning::LogoUnavailable(e.to_string())),
        };
    }

    let pdf = match &args.command {
        Command::Approval { input, table_file } => {
            let mut letter = ApprovalLetter::from_json(&read_input(input)?)?;
            if let Some(path) = table_file {
                let pasted = read_input(path)?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                letter.attach_pasted_table(name, &pasted);
            }
            generate_approval_letter(&letter, &ctx)?
        }
        Command::LabRecord { input } => {
            let source = LabRecordSource::from_json(&read_input(input)?)?;
            let base_dir = input.parent().unwrap_or_else(|| Path::new("."));
            let record = source.load(base_dir)?;
            generate_lab_record(&record, &ctx)?
        }
    };

    let output_file = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&pdf.file_name));
    save_pdf(&pdf, &output_file)?;

    println!("✓ Generated: {}", output_file.display());
    println!("  Pages: {}", pdf.report.pages);
    if let Some(total) = pdf.report.budget_total {
        println!("  Budget total: {:.2}", total);
    }
    for warning in &pdf.report.warnings {
        println!("  Warning: {}", warning);
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn read_input(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path)
        .map_err(|e| AppError::InputError(format!("{}: {}", path.display(), e)))
}

fn save_pdf(pdf: &GeneratedPdf, output_path: &Path) -> Result<(), AppError> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&pdf.bytes)?;
    writer.flush()?;
    Ok(())
}
