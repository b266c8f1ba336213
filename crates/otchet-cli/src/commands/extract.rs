//! Extract command - line items from a single OCR output file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use otchet_core::{
    DateSource, ExtractionError, ExtractionResult, OcrDocument, Statement, StatementExtractor,
};

use super::{build_parser, load_config, InputFormatArg};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// OCR output file (JSON pages, quoted fragment dump or plain lines)
    #[arg(required = true)]
    input: PathBuf,

    /// Reference list of valid codes, one per line
    #[arg(long)]
    codes: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Input layout (default: from config, usually auto)
    #[arg(long, value_enum)]
    input_format: Option<InputFormatArg>,

    /// Show resolved column dates and where they came from
    #[arg(long)]
    show_dates: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON result record
    Json,
    /// CSV rows: date,code,sum
    Csv,
    /// Plain text table
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let format = args
        .input_format
        .map(Into::into)
        .unwrap_or(config.input.format);
    info!("Reading {} ({:?})", args.input.display(), format);

    let document = OcrDocument::from_file(&args.input, format)?;
    debug!(
        "{} pages, {} fragments",
        document.page_count(),
        document.fragment_count()
    );

    let parser = build_parser(&config, args.codes.as_deref())?;
    let outcome = parser.extract_document(&document);

    if args.show_dates {
        if let Ok(statement) = &outcome {
            print_dates(statement);
        }
    }

    let output = render(&outcome, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    match outcome {
        Ok(statement) => {
            for warning in &statement.warnings {
                info!("{}", warning);
            }
            Ok(())
        }
        Err(e) => anyhow::bail!("Extraction failed: {}", e),
    }
}

fn print_dates(statement: &Statement) {
    eprintln!(
        "{} Form: {} (via {})",
        style("ℹ").blue(),
        statement.form,
        statement.form_strategy
    );
    for (index, column) in statement.columns.iter().enumerate() {
        let source = match column.source {
            DateSource::Resolved => style("found").green(),
            DateSource::Defaulted => style("default").yellow(),
            DateSource::Synthesized => style("synthesized").red(),
        };
        eprintln!("  column {}: {} ({})", index + 1, column.date, source);
    }
}

/// Render an extraction outcome in the requested format.
pub fn render(
    outcome: &Result<Statement, ExtractionError>,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let result = ExtractionResult::from(outcome.clone());
            Ok(serde_json::to_string_pretty(&result)?)
        }
        OutputFormat::Csv => format_csv(outcome),
        OutputFormat::Text => Ok(format_text(outcome)),
    }
}

fn format_csv(outcome: &Result<Statement, ExtractionError>) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["date", "code", "sum"])?;

    if let Ok(statement) = outcome {
        for item in &statement.items {
            wtr.write_record([
                item.date.to_string(),
                item.code.clone(),
                item.sum.to_string(),
            ])?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(outcome: &Result<Statement, ExtractionError>) -> String {
    let statement = match outcome {
        Ok(statement) => statement,
        Err(e) => {
            let mut output = format!("Error: {}\n", e);
            if !e.diagnostics().is_empty() {
                output.push_str("\nFirst tokens:\n");
                for token in e.diagnostics() {
                    output.push_str(&format!("  {}\n", token));
                }
            }
            return output;
        }
    };

    let mut output = String::new();

    output.push_str(&format!("Form: {}\n", statement.form));
    output.push('\n');

    output.push_str(&format!("{:<8}", "Code"));
    for column in &statement.columns {
        output.push_str(&format!(" {:>14}", column.date.to_string()));
    }
    output.push('\n');

    // Items are emitted one full row of columns per code group.
    for row in statement.items.chunks(statement.column_count().max(1)) {
        if let Some(first) = row.first() {
            output.push_str(&format!("{:<8}", first.code));
        }
        for item in row {
            output.push_str(&format!(" {:>14}", item.sum));
        }
        output.push('\n');
    }

    if !statement.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &statement.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
