//! Configuration file loading for synthesis-pipeline
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `SYNTHESIS_` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./synthesis.toml` or `./.synthesis.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/synthesis-pipeline/config.toml`
//! 5. Default values

mod file_config;
mod loader;
mod settings;

pub use file_config::{
    ConfigIssue, ConfigIssueCode, FileBreakerConfig, FileConfig, FileGatingConfig,
    FileModelsConfig, FileOutputConfig, FileOutputFormat, FilePipelineConfig,
    FileProviderConfig, FileProvidersConfig, FileRetryConfig, FileStagesConfig, Severity,
};
pub use loader::ConfigLoader;
pub use settings::{ConfigValidationError, PipelineSettings};
