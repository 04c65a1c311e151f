//! Command-line front end: read text, extract, print.

use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::config::ExtractorConfig;
use crate::pipeline::strategy::ExtractionStrategy;

#[derive(Parser, Debug)]
#[command(name = "action-extract")]
#[command(version, about = "Extract action items from meeting notes", long_about = None)]
pub struct Cli {
    /// Input file; stdin when omitted or "-"
    pub input: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "rules")]
    pub strategy: StrategyArg,

    /// Ollama model for --strategy model (overrides OLLAMA_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Print a JSON array instead of a bullet list
    #[arg(long)]
    pub json: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum StrategyArg {
    #[default]
    Rules,
    #[value(alias = "llm")]
    Model,
}

impl From<StrategyArg> for ExtractionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Rules => ExtractionStrategy::Rules,
            StrategyArg::Model => ExtractionStrategy::Model,
        }
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot read stdin: {0}")]
    Stdin(#[from] std::io::Error),

    #[error("Cannot encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot write output: {0}")]
    Output(std::io::Error),
}

impl Cli {
    /// Environment config with the `--model` override applied.
    pub fn extractor_config(&self) -> ExtractorConfig {
        let config = ExtractorConfig::from_env();
        match &self.model {
            Some(model) if !model.trim().is_empty() => config.with_model(model.trim()),
            _ => config,
        }
    }

    fn reads_stdin(&self) -> bool {
        match &self.input {
            None => true,
            Some(path) => path.as_os_str() == "-",
        }
    }
}

/// Read the whole input: the named file, or `stdin` when the CLI asked for it.
pub fn read_input<R: Read>(cli: &Cli, mut stdin: R) -> Result<String, CliError> {
    match &cli.input {
        Some(path) if !cli.reads_stdin() => read_file(path),
        _ => {
            let mut text = String::new();
            stdin.read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::ReadInput {
        path: path.to_path_buf(),
        source,
    })
}

/// `- item` lines, or a JSON array when `json` is set. Always newline-terminated
/// unless there is nothing to print in list form.
pub fn render(items: &[String], json: bool) -> Result<String, CliError> {
    if json {
        let mut out = serde_json::to_string_pretty(items)?;
        out.push('\n');
        return Ok(out);
    }
    Ok(items.iter().map(|item| format!("- {item}\n")).collect())
}

/// Write rendered output. A reader that went away (`| head`) is not an error.
pub fn write_output<W: Write>(mut out: W, output: &str) -> Result<(), CliError> {
    match out.write_all(output.as_bytes()).and_then(|()| out.flush()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(CliError::Output(e)),
    }
}

/// Extract from already-read text and render it.
pub fn run_on_text(cli: &Cli, text: &str) -> Result<String, CliError> {
    let strategy = ExtractionStrategy::from(cli.strategy);
    let items = strategy.extract_with(&cli.extractor_config(), text);
    tracing::info!(strategy = %strategy, items = items.len(), "extraction finished");
    render(&items, cli.json)
}

/// Read from the file or process stdin, then extract and render.
pub fn run(cli: &Cli) -> Result<String, CliError> {
    let text = read_input(cli, std::io::stdin().lock())?;
    run_on_text(cli, &text)
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
