//! Batch command - extract line items from many OCR output files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use otchet_core::{ExtractionError, InputFormat, OcrDocument, Statement, StatementExtractor, StatementParser};

use super::extract::{render, OutputFormat};
use super::{build_parser, load_config, InputFormatArg};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching OCR output files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Input layout (default: from config, usually auto)
    #[arg(long, value_enum)]
    input_format: Option<InputFormatArg>,

    /// Reference list of valid codes, one per line
    #[arg(long)]
    codes: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileOutcome {
    path: PathBuf,
    /// Outer error: the file could not be read. Inner: extraction failed.
    outcome: anyhow::Result<Result<Statement, ExtractionError>>,
}

impl FileOutcome {
    fn error_message(&self) -> Option<String> {
        match &self.outcome {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(e.to_string()),
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let format: InputFormat = args
        .input_format
        .map(Into::into)
        .unwrap_or(config.input.format);

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // The parser is immutable; workers share one instance.
    let parser = Arc::new(build_parser(&config, args.codes.as_deref())?);
    let workers = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let permit = Arc::clone(&workers).acquire_owned().await?;
        let parser = Arc::clone(&parser);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let outcome = extract_file(&path, &parser, format);
            (index, FileOutcome { path, outcome })
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        progress.inc(1);

        if let Some(message) = result.error_message() {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), message);
            } else {
                error!("Failed to process {}: {}", result.path.display(), message);
                tasks.abort_all();
                progress.abandon();
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), message);
            }
        }
        results.push((index, result));
    }

    progress.finish_with_message("Complete");

    results.sort_by_key(|(index, _)| *index);
    let results: Vec<FileOutcome> = results.into_iter().map(|(_, r)| r).collect();

    if let Some(output_dir) = &args.output_dir {
        let names = output_names(results.iter().map(|r| r.path.as_path()), args.format);
        for (result, name) in results.iter().zip(&names) {
            if let Ok(outcome) = &result.outcome {
                write_output(&output_dir.join(name), outcome, args.format)?;
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&FileOutcome> = results
        .iter()
        .filter(|r| r.error_message().is_some())
        .collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error_message().unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn extract_file(
    path: &Path,
    parser: &StatementParser,
    format: InputFormat,
) -> anyhow::Result<Result<Statement, ExtractionError>> {
    let document = OcrDocument::from_file(path, format)?;
    debug!(
        "{}: {} pages, {} fragments",
        path.display(),
        document.page_count(),
        document.fragment_count()
    );
    Ok(parser.extract_document(&document))
}

/// Output file name per input, in input order.
///
/// Inputs sharing a stem (`a/x.json`, `b/x.json`) get `-2`, `-3`, ...
/// suffixes instead of overwriting each other.
fn output_names<'p>(inputs: impl Iterator<Item = &'p Path>, format: OutputFormat) -> Vec<String> {
    let mut used = HashSet::new();
    inputs
        .map(|input| {
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("statement");

            let mut name = format!("{}.{}", stem, format.extension());
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{}-{}.{}", stem, n, format.extension());
                n += 1;
            }
            if n > 2 {
                warn!("Output name for {} collides; writing {}", input.display(), name);
            }
            name
        })
        .collect()
}

fn write_output(
    output_path: &Path,
    outcome: &Result<Statement, ExtractionError>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    fs::write(output_path, render(outcome, format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["filename", "status", "form", "codes", "items", "error"])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &result.outcome {
            Ok(Ok(statement)) => wtr.write_record([
                filename,
                "success",
                &statement.form.to_string(),
                &statement.codes().len().to_string(),
                &statement.items.len().to_string(),
                "",
            ])?,
            Ok(Err(e)) => wtr.write_record([filename, "failed", "", "0", "0", &e.to_string()])?,
            Err(e) => wtr.write_record([filename, "error", "", "", "", &e.to_string()])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
