//! Output configuration from TOML (`[output]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::validation::ConfigIssue;

/// How the final result is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileOutputFormat {
    /// Only the final answer text
    #[default]
    Answer,
    /// The structured result object
    Json,
    /// The human-readable report
    Markdown,
}

impl FileOutputFormat {
    pub const NAMES: [&'static str; 3] = ["answer", "json", "markdown"];
}

impl std::str::FromStr for FileOutputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "answer" | "text" => Ok(FileOutputFormat::Answer),
            "json" => Ok(FileOutputFormat::Json),
            "markdown" | "md" => Ok(FileOutputFormat::Markdown),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Directory persisted artifacts are written to
    pub dir: PathBuf,
    pub format: String,
    /// Enable colored terminal output
    pub color: bool,
    /// Append every progress event to this JSONL file
    pub events_log: Option<PathBuf>,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("synthesis-output"),
            format: "answer".to_string(),
            color: true,
            events_log: None,
        }
    }
}

impl FileOutputConfig {
    pub fn parse_format(&self) -> (FileOutputFormat, Vec<ConfigIssue>) {
        match self.format.parse() {
            Ok(format) => (format, Vec::new()),
            Err(()) => (
                FileOutputFormat::default(),
                vec![ConfigIssue::invalid_enum(
                    "output.format",
                    &self.format,
                    &FileOutputFormat::NAMES,
                )],
            ),
        }
    }
}
