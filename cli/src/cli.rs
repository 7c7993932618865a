//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use synthesis_infrastructure::FileOutputFormat;

/// Output format for the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Only the final answer
    Answer,
    /// The structured result object
    Json,
    /// Human-readable report with every stage
    Markdown,
}

impl From<OutputFormat> for FileOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Answer => FileOutputFormat::Answer,
            OutputFormat::Json => FileOutputFormat::Json,
            OutputFormat::Markdown => FileOutputFormat::Markdown,
        }
    }
}

/// CLI arguments for synthesis-pipeline
#[derive(Parser, Debug)]
#[command(name = "synthesis-pipeline")]
#[command(author, version, about = "Ask several LLMs and synthesize one answer")]
#[command(long_about = r#"
synthesis-pipeline sends one question to models from several provider
families and consolidates their answers in four stages:

1. Initial Response: every model answers independently
2. Peer Review: each model revises its answer after reading its peers'
3. Meta-Analysis: designated models analyze the revised answers
4. Final Synthesis: one model writes the final answer

Configuration files are loaded from (in priority order):
1. SYNTHESIS_<SECTION>__<KEY>  Environment variables
2. --config <path>             Explicit config file
3. ./synthesis.toml            Project-level config
4. ~/.config/synthesis-pipeline/config.toml   Global config

Example:
  synthesis-pipeline -m gpt-4o -m claude-sonnet-4 -m gemini-2.5-pro "Why is the sky blue?"
  synthesis-pipeline --persist --caller-id team-a --doc notes.md "Summarize the notes"
"#)]
pub struct Cli {
    /// The question to ask (not required with --show-config)
    pub query: Option<String>,

    /// Models to consult (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Write JSON and Markdown artifacts to the output directory
    #[arg(long)]
    pub persist: bool,

    /// Identifier appended to persisted artifact names
    #[arg(long, value_name = "ID")]
    pub caller_id: Option<String>,

    /// Document to include as context (can be specified multiple times)
    #[arg(long = "doc", value_name = "PATH")]
    pub documents: Vec<String>,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Append every progress event to this JSONL file
    #[arg(long, value_name = "PATH")]
    pub events_log: Option<PathBuf>,

    /// Also write diagnostics to a daily-rolling log file in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_invocation() {
        let cli = Cli::try_parse_from([
            "synthesis-pipeline",
            "-m",
            "gpt-4o",
            "--model",
            "claude-sonnet-4",
            "--persist",
            "--caller-id",
            "team-a",
            "--doc",
            "a.md",
            "--doc",
            "b.md",
            "-o",
            "json",
            "-vv",
            "Why is the sky blue?",
        ])
        .unwrap();

        assert_eq!(cli.query.as_deref(), Some("Why is the sky blue?"));
        assert_eq!(cli.model, vec!["gpt-4o", "claude-sonnet-4"]);
        assert!(cli.persist);
        assert_eq!(cli.caller_id.as_deref(), Some("team-a"));
        assert_eq!(cli.documents, vec!["a.md", "b.md"]);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_show_config_needs_no_query() {
        let cli = Cli::try_parse_from(["synthesis-pipeline", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.query.is_none());
    }
}
