//! inkport CLI - ink document export tool

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use inkport::catalog::LABEL_PDF;
use inkport::{
    spawn_export, Background, Document, ExportHost, ExportOptions, ExportStatus, FailurePolicy,
    FormatCatalog, PageRange,
};

#[derive(Parser)]
#[command(name = "inkport")]
#[command(author = "inkport contributors")]
#[command(version)]
#[command(about = "Export ink documents to PDF, PNG and journal archives", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a document
    Export {
        /// Input document (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file; the format's extension is applied
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Export format label (see `inkport formats`)
        #[arg(short, long, default_value = LABEL_PDF)]
        format: String,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Raster resolution in dots per inch
        #[arg(long, default_value = "300", env = "INKPORT_DPI")]
        dpi: f32,

        /// Stop at the first page that fails
        #[arg(long)]
        fail_fast: bool,
    },

    /// List the available export formats
    Formats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show document information
    Info {
        /// Input document (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Export {
            input,
            output,
            format,
            pages,
            dpi,
            fail_fast,
        }) => cmd_export(
            &input,
            output.as_deref(),
            &format,
            pages.as_deref(),
            dpi,
            fail_fast,
        ),
        Some(Commands::Formats { json }) => cmd_formats(json),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: inkport export <FILE> [-o OUTPUT]".yellow());
            println!("       inkport --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Drives an indicatif progress bar from export callbacks.
struct ProgressHost {
    bar: ProgressBar,
}

impl ProgressHost {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        bar.set_message("Exporting...");
        Ok(Self { bar })
    }

    /// Mark the export as done.
    fn complete(&self) {
        self.bar.finish_with_message("Done!");
    }
}

impl ExportHost for ProgressHost {
    fn set_maximum(&self, maximum: usize) {
        self.bar.set_length(maximum as u64);
    }

    fn set_current(&self, current: usize) {
        self.bar.set_position(current as u64);
    }

    fn report_failure(&self, message: &str) {
        log::debug!("Export failed: {}", message);
        self.bar.abandon_with_message("Failed");
    }
}

fn cmd_export(
    input: &Path,
    output: Option<&Path>,
    format: &str,
    pages: Option<&str>,
    dpi: f32,
    fail_fast: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::load(input)?;
    let total = doc.page_count();

    let mut options = ExportOptions::new().with_dpi(dpi);
    if let Some(p) = pages {
        options = options.with_range(PageRange::parse_with_total(p, total)?);
    }
    if fail_fast {
        options = options.with_failure_policy(FailurePolicy::FailFast);
    }

    let output = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| input.with_extension(""));

    let host = Arc::new(ProgressHost::new()?);
    let task = spawn_export(&doc.into_shared(), output, format, options, host.clone())?;
    let job = task.finish()?;

    if let Some(message) = job.last_error() {
        return Err(message.to_string().into());
    }
    host.complete();

    let report = job.report();
    if report.status == ExportStatus::NothingSelected {
        println!("{}", "No pages selected, nothing exported".yellow());
        return Ok(());
    }

    println!("\n{}", "Output files:".green().bold());
    let last = report.files.len().saturating_sub(1);
    for (i, file) in report.files.iter().enumerate() {
        let branch = if i == last { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), file.display());
    }

    Ok(())
}

fn cmd_formats(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = FormatCatalog::with_defaults();

    if json {
        let formats: Vec<_> = catalog
            .iter()
            .map(|(label, descriptor)| {
                serde_json::json!({
                    "label": label,
                    "extension": descriptor.extension(),
                    "suppress_background": descriptor.suppress_background(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&formats)?);
        return Ok(());
    }

    println!("{}", "Export Formats".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (label, descriptor) in catalog.iter() {
        let background = if descriptor.suppress_background() {
            " (no background)".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "{:<34} {}{}",
            label.bold(),
            descriptor.extension(),
            background
        );
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::load(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), doc.page_count());

    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref created) = doc.metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = doc.metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }
    if let Some(source) = doc.reference.as_ref().and_then(|r| r.source.as_ref()) {
        println!("{}: {}", "Background".bold(), source.display());
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let strokes: usize = doc.pages.iter().map(|p| p.element_count()).sum();
    let referenced = doc
        .pages
        .iter()
        .filter(|p| matches!(p.background, Background::Reference { .. }))
        .count();

    println!("{}: {}", "Strokes".bold(), strokes);
    println!("{}: {}", "Pages on reference".bold(), referenced);

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "inkport".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Ink document export tool");
    println!();
    println!("License: MIT");
}
