//! Configuration issues collected while parsing raw TOML values

/// How serious a configuration issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Falls back to a default; reported but not fatal
    Warning,
    /// The configuration cannot be used
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    EmptyModelName {
        field: String,
    },
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    ZeroValue {
        field: String,
    },
    OutOfRange {
        field: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub(crate) fn zero(field: &str) -> Self {
        Self {
            severity: Severity::Error,
            code: ConfigIssueCode::ZeroValue {
                field: field.to_string(),
            },
            message: format!("{}: must be greater than zero", field),
        }
    }

    pub(crate) fn above_max(field: &str, value: u64, max: u64) -> Self {
        Self {
            severity: Severity::Error,
            code: ConfigIssueCode::OutOfRange {
                field: field.to_string(),
            },
            message: format!("{}: {} exceeds the maximum of {}", field, value, max),
        }
    }

    pub(crate) fn empty_model(field: &str) -> Self {
        Self {
            severity: Severity::Error,
            code: ConfigIssueCode::EmptyModelName {
                field: field.to_string(),
            },
            message: format!("{}: model name cannot be empty", field),
        }
    }

    pub(crate) fn invalid_enum(field: &str, value: &str, valid: &[&str]) -> Self {
        Self {
            severity: Severity::Error,
            code: ConfigIssueCode::InvalidEnumValue {
                field: field.to_string(),
                value: value.to_string(),
                valid_values: valid.iter().map(|v| v.to_string()).collect(),
            },
            message: format!(
                "{}: unknown value '{}' (expected one of: {})",
                field,
                value,
                valid.join(", ")
            ),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Upper bound for every `*_timeout_secs` value (one day)
pub(crate) const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Upper bound for `pipeline.max_concurrent_calls`
pub(crate) const MAX_CONCURRENT_CALLS: usize = 1024;

/// Names accepted wherever a provider family is configured
pub(crate) const FAMILY_NAMES: [&str; 8] = [
    "openai",
    "anthropic",
    "google",
    "meta",
    "mistral",
    "xai",
    "deepseek",
    "other",
];
