//! Subcommands and the configuration plumbing they share.

pub mod batch;
pub mod config;
pub mod extract;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use otchet_core::{CodeList, InputFormat, OtchetConfig, StatementParser};

/// OCR output layout, as accepted on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum InputFormatArg {
    /// Sniff the content
    Auto,
    /// JSON pages or recognizer page objects
    Json,
    /// Single-quoted fragments
    Quoted,
    /// One fragment per line
    Lines,
}

impl From<InputFormatArg> for InputFormat {
    fn from(arg: InputFormatArg) -> Self {
        match arg {
            InputFormatArg::Auto => InputFormat::Auto,
            InputFormatArg::Json => InputFormat::Json,
            InputFormatArg::Quoted => InputFormat::Quoted,
            InputFormatArg::Lines => InputFormat::Lines,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("otchet")
        .join("config.json")
}

/// Config file in effect: `--config`, else the per-user default.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration. An explicit path must exist; the default may not.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<OtchetConfig> {
    let path = config_path(explicit);
    if explicit.is_some() || path.exists() {
        debug!("Loading configuration from {}", path.display());
        Ok(OtchetConfig::from_file(&path)?)
    } else {
        Ok(OtchetConfig::default())
    }
}

/// Build the parser, loading the reference list from `--codes` or the config.
pub fn build_parser(config: &OtchetConfig, codes: Option<&Path>) -> anyhow::Result<StatementParser> {
    let mut parser = StatementParser::new().with_config(config.extraction.clone());

    let codes_path = codes.or(config.extraction.codes_file.as_deref());
    if let Some(path) = codes_path {
        let list = CodeList::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to read code list {}: {}", path.display(), e))?;
        if list.is_empty() {
            anyhow::bail!("Code list {} contains no 4-5 digit codes", path.display());
        }
        debug!("Using {} reference codes from {}", list.len(), path.display());
        parser = parser.with_codes(Arc::new(list));
    }

    Ok(parser)
}
