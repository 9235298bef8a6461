use std::path::PathBuf;
use thiserror::Error;

/// Main error type for userconf
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for '{element}': {reason}")]
    InvalidData { element: String, reason: String },

    #[error("Missing required value for '{element}'\n\nTroubleshooting:\n- Set it in the user or global configuration file\n- Or pass it on the command line\n- Run with --generate-config to print a documented template")]
    MissingData { element: String },

    #[error("Configuration tree not supported by the {backend} backend: {reason}")]
    InvalidConfigTree { backend: String, reason: String },

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Parse error in {}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("{0}")]
    Cli(#[from] clap::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Schema definition errors, detected before any configuration is loaded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("application not set, please provide an application name")]
    MissingApplication,

    #[error("author not set, please provide an application author")]
    MissingAuthor,

    #[error("'{0}' is not a valid name (use letters, digits, '_' and '-')")]
    InvalidName(String),

    #[error("'{0}' is declared more than once in the same section")]
    DuplicateName(String),

    #[error("'{0}' is not a valid short flag (expected a single character)")]
    InvalidShortFlag(String),

    #[error("flag '{0}' is reserved")]
    ReservedFlag(String),

    #[error("flag '{flag}' is used by both '{first}' and '{second}'")]
    DuplicateFlag {
        flag: String,
        first: String,
        second: String,
    },

    #[error("no backend registered for file type '{name}'{}", .suggestion.as_ref().map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
    UnknownBackend {
        name: String,
        suggestion: Option<String>,
    },
}

impl ConfigError {
    /// Shorthand for an `InvalidData` error
    pub fn invalid(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            element: element.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error reports a required value that no layer supplied
    #[must_use]
    pub const fn is_missing_data(&self) -> bool {
        matches!(self, Self::MissingData { .. })
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
