//! Unified error types for repo-trust.
//!
//! Only [`TrustError::InvalidInput`] ever escapes the scoring orchestrator;
//! every other variant is absorbed at an evaluator boundary and turned into
//! that metric's default score.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for repo-trust operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TrustError {
    /// Errors talking to the code-hosting API
    #[error("Hosting API request failed: {context}")]
    Hosting {
        context: String,
        #[source]
        source: HostingErrorKind,
    },

    /// Errors decoding payloads (manifests, README, registry documents)
    #[error("Failed to parse {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Rejected caller input (empty owner/repo, unparseable reference)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Specific hosting API error kinds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HostingErrorKind {
    #[error("rate limited (HTTP {0})")]
    RateLimited(u16),

    #[error("resource not found")]
    NotFound,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request cancelled")]
    Cancelled,
}

impl HostingErrorKind {
    /// Classify an HTTP status code.
    ///
    /// 403 and 429 are how the hosting API signals rate limiting.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            403 | 429 => Self::RateLimited(status),
            404 => Self::NotFound,
            other => Self::Status(other),
        }
    }
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(String),

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for repo-trust operations
pub type Result<T> = std::result::Result<T, TrustError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl TrustError {
    /// Create a hosting error with context
    pub fn hosting(context: impl Into<String>, source: HostingErrorKind) -> Self {
        Self::Hosting {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create an input validation error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create the error returned when a cancellation token fires
    pub fn cancelled(context: impl Into<String>) -> Self {
        Self::hosting(context, HostingErrorKind::Cancelled)
    }

    /// The hosting error kind, if this is a hosting error.
    #[must_use]
    pub const fn hosting_kind(&self) -> Option<&HostingErrorKind> {
        match self {
            Self::Hosting { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether the hosting API signalled rate limiting (403/429).
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self.hosting_kind(), Some(HostingErrorKind::RateLimited(_)))
    }

    /// Whether the requested resource is absent (404).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.hosting_kind(), Some(HostingErrorKind::NotFound))
    }

    /// Whether the call was abandoned because a cancellation token fired.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.hosting_kind(), Some(HostingErrorKind::Cancelled))
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for TrustError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for TrustError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse("JSON document", ParseErrorKind::InvalidJson(err.to_string()))
    }
}

impl From<serde_yaml::Error> for TrustError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::parse("YAML document", ParseErrorKind::InvalidYaml(err.to_string()))
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// ```ignore
/// use repo_trust::error::ErrorContext;
///
/// let manifest = client
///     .file_content(&repo, "package.json")
///     .with_context(|| format!("fetching manifest for {repo}"))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error, prepending it to any existing context.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<TrustError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: TrustError, new_ctx: &str) -> TrustError {
    match err {
        TrustError::Hosting {
            context: existing,
            source,
        } => TrustError::Hosting {
            context: chain_context(new_ctx, &existing),
            source,
        },
        TrustError::Parse {
            context: existing,
            source,
        } => TrustError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        TrustError::Io {
            path,
            message,
            source,
        } => TrustError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        TrustError::InvalidInput(msg) => TrustError::InvalidInput(chain_context(new_ctx, &msg)),
        TrustError::Config(msg) => TrustError::Config(chain_context(new_ctx, &msg)),
    }
}

/// Chain two context strings together as "`new`: `existing`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Treat a 404 from the hosting API as absence rather than failure.
pub trait NotFoundExt<T> {
    /// `Ok(Some(v))` on success, `Ok(None)` on NotFound, the error otherwise.
    fn found(self) -> Result<Option<T>>;
}

impl<T> NotFoundExt<T> for Result<T> {
    fn found(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
