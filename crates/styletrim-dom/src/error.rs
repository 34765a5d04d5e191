//! Error types for selector parsing and querying.

/// Result type alias for selector operations.
pub type Result<T> = std::result::Result<T, SelectorError>;

/// Errors raised while parsing selector text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector text was empty or contained only whitespace.
    #[error("Empty selector")]
    Empty,

    /// A token appeared where the grammar does not allow it.
    #[error("Unexpected token in '{selector}': {message}")]
    UnexpectedToken { selector: String, message: String },

    /// Syntax the query engine does not implement (namespaces, `:has()`, ...).
    #[error("Unsupported selector syntax in '{selector}': {message}")]
    Unsupported { selector: String, message: String },

    /// Malformed `An+B` argument.
    #[error("Invalid nth expression in '{selector}'")]
    InvalidNth { selector: String },
}

impl SelectorError {
    /// Create an unexpected-token error.
    pub fn unexpected(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Attach the offending selector text.
    pub fn with_selector(self, text: &str) -> Self {
        match self {
            Self::UnexpectedToken { message, .. } => Self::unexpected(text, message),
            Self::Unsupported { message, .. } => Self::unsupported(text, message),
            Self::InvalidNth { .. } => Self::InvalidNth {
                selector: text.to_string(),
            },
            Self::Empty => Self::Empty,
        }
    }

    /// Create an unsupported-syntax error.
    pub fn unsupported(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unsupported {
            selector: selector.into(),
            message: message.into(),
        }
    }
}
