//! Error types for yangkit operations

use thiserror::Error;

/// Main error type for yangkit operations
#[derive(Error, Debug)]
pub enum YangError {
    /// Caller passed inconsistent or unusable inputs
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// A referenced module, feature or identity is absent
    #[error("{kind} \"{name}\" not found{}", context.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    NotFound {
        /// Kind of the missing entity ("module", "feature", ...)
        kind: String,
        /// Name that failed to resolve
        name: String,
        /// Additional context if available
        context: Option<String>,
    },

    /// Module revision collision, duplicate enum value, duplicate import
    #[error("{message}")]
    AlreadyExists {
        /// Error message
        message: String,
    },

    /// Malformed if-feature, range, pattern or regular expression
    #[error("Syntax error: {message}")]
    Syntax {
        /// Error message
        message: String,
        /// Schema path of the offending statement if available
        path: Option<String>,
    },

    /// Status mismatch, narrowing violation, empty enum/bits set, changed value
    #[error("Semantic error: {message}")]
    Semantic {
        /// Error message
        message: String,
        /// Schema path of the offending statement if available
        path: Option<String>,
    },

    /// A name could not be resolved against its scope
    #[error("Reference error: {message}")]
    Reference {
        /// Error message
        message: String,
        /// Schema path of the offending statement if available
        path: Option<String>,
    },

    /// A feature cannot be switched because of if-feature conflicts
    #[error("Denied: {message}")]
    Denied {
        /// Error message
        message: String,
    },

    /// Regular expression rejected by the pattern backend
    #[error("Pattern error: {message}")]
    Pattern {
        /// Error message
        message: String,
        /// The pattern source that failed
        pattern: Option<String>,
    },

    /// Feature not implemented
    #[error("Feature not implemented: {0}")]
    NotImplemented(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invariant violation; always surfaced, never silently recovered
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

/// Result type alias for yangkit operations
pub type Result<T> = std::result::Result<T, YangError>;

impl YangError {
    /// Create a new invalid-argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    #[must_use]
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
            context: None,
        }
    }

    /// Create a new not-found error with extra context
    #[must_use]
    pub fn not_found_in(
        kind: impl Into<String>,
        name: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new already-exists error
    #[must_use]
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Create a new syntax error
    #[must_use]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
            path: None,
        }
    }

    /// Create a new syntax error carrying the schema path
    #[must_use]
    pub fn syntax_at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new semantic error
    #[must_use]
    pub fn semantic(message: impl Into<String>) -> Self {
        Self::Semantic {
            message: message.into(),
            path: None,
        }
    }

    /// Create a new semantic error carrying the schema path
    #[must_use]
    pub fn semantic_at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Semantic {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new reference error
    #[must_use]
    pub fn reference(message: impl Into<String>) -> Self {
        Self::Reference {
            message: message.into(),
            path: None,
        }
    }

    /// Create a new reference error carrying the schema path
    #[must_use]
    pub fn reference_at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Reference {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new denied error
    #[must_use]
    pub fn denied(message: impl Into<String>) -> Self {
        Self::Denied {
            message: message.into(),
        }
    }

    /// Create a new pattern error
    #[must_use]
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern {
            message: message.into(),
            pattern: None,
        }
    }

    /// Create a not-implemented error
    #[must_use]
    pub fn not_implemented(feature: impl Into<String>) -> Self {
        Self::NotImplemented(feature.into())
    }

    /// Create an internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<regex::Error> for YangError {
    fn from(err: regex::Error) -> Self {
        Self::Pattern {
            message: err.to_string(),
            pattern: None,
        }
    }
}

/// One entry of the per-context diagnostic buffer.
///
/// Every validation failure records the schema path of the offending
/// statement (`/mod:container/leaf/type/range`) and a code identifying
/// the violated rule, so callers can report precise positions even when
/// the returned error has been flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Schema path of the offending statement
    pub path: String,
    /// Stable identifier of the violated rule
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic record
    #[must_use]
    pub fn new(path: impl Into<String>, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
        }
    }
}
