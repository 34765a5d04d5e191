//! Error types for the optimizer.

use std::path::PathBuf;

use styletrim_dom::SelectorError;

/// Result type alias for optimizer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or optimizing stylesheets.
///
/// Local failures inside a pass (an unqueryable selector, a value that does
/// not normalize) are logged and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// CSS parse error.
    #[error("CSS parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: u32,
        column: u32,
    },

    /// Selector parsing error.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// File I/O error.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A snapshot or lookup referenced a stylesheet that was never added.
    #[error("Unknown stylesheet '{key}'")]
    UnknownStylesheet { key: String },

    /// A snapshot id was fed to the pipeline twice.
    #[error("Snapshot {0} was already processed")]
    DuplicateSnapshot(u32),
}

impl Error {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::Parse {
            message: message.into(),
            line,
            column,
        }
    }

    /// Create a selector error.
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an unknown-stylesheet error.
    pub fn unknown_stylesheet(key: impl Into<String>) -> Self {
        Self::UnknownStylesheet { key: key.into() }
    }
}

impl From<SelectorError> for Error {
    fn from(err: SelectorError) -> Self {
        let selector = match &err {
            SelectorError::UnexpectedToken { selector, .. }
            | SelectorError::Unsupported { selector, .. }
            | SelectorError::InvalidNth { selector } => selector.clone(),
            SelectorError::Empty => String::new(),
        };
        Self::invalid_selector(selector, err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
