//! Error types for registry resolution and trust verification.

use std::fmt;

/// Coarse error classification, stable across message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed version, constraint, digest, key material, or missing field.
    Validation,
    /// No source, plugin, version, or key matched.
    NotFound,
    /// Index published with a schema version this client does not accept.
    Schema,
    /// Non-200 response, oversized body, or network failure.
    Transport,
    /// Cache file exists but could not be decoded.
    CorruptCache,
    /// Filesystem failure unrelated to content.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Schema => "schema",
            Self::Transport => "transport",
            Self::CorruptCache => "corrupt_cache",
            Self::Io => "io",
        };
        f.write_str(s)
    }
}

/// A failure attributed to one registry source during a multi-source operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    /// Display name of the source.
    pub source: String,

    /// Classification of the underlying error.
    pub kind: ErrorKind,

    /// Rendered message of the underlying error.
    pub message: String,
}

impl SourceError {
    pub(crate) fn new(source: &str, err: &RegistryError) -> Self {
        Self {
            source: source.to_string(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source {:?}: {}", self.source, self.message)
    }
}

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Input failed validation.
    #[error("invalid {what}: {message}")]
    Validation { what: &'static str, message: String },

    /// Nothing matched the lookup.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Index schema version is not in the supported set.
    #[error("unsupported schema version {found:?} (supported: {supported:?})")]
    UnsupportedSchema {
        found: String,
        supported: Vec<String>,
    },

    /// HTTP or network failure.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// No cache file exists for the source.
    #[error("no cached index at {path}")]
    CacheMiss { path: String },

    /// Cache file exists but its content is unusable.
    #[error("corrupt cache at {path}: {message}")]
    CorruptCache { path: String, message: String },

    /// Filesystem error.
    #[error("io error: {message}")]
    Io { message: String },

    /// One or more sources failed.
    #[error("{}", join_source_errors(.errors))]
    Sources { errors: Vec<SourceError> },
}

fn join_source_errors(errors: &[SourceError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl RegistryError {
    pub(crate) fn validation(what: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            what,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub(crate) fn io(context: &str, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", context, err),
        }
    }

    /// Classification of this error.
    ///
    /// A cache miss is reported as `NotFound`. An aggregate reports the kind
    /// shared by all of its entries, or `Transport` when they differ.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } | Self::CacheMiss { .. } => ErrorKind::NotFound,
            Self::UnsupportedSchema { .. } => ErrorKind::Schema,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::CorruptCache { .. } => ErrorKind::CorruptCache,
            Self::Io { .. } => ErrorKind::Io,
            Self::Sources { errors } => match errors.first() {
                Some(first) if errors.iter().all(|e| e.kind == first.kind) => first.kind,
                _ => ErrorKind::Transport,
            },
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Validation => 1,
            ErrorKind::NotFound => 1,
            ErrorKind::Schema => 3,
            ErrorKind::Transport => 5,
            ErrorKind::CorruptCache | ErrorKind::Io => 6,
        }
    }

    /// Whether retrying the operation could succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Per-source records, if this is an aggregate.
    pub fn source_errors(&self) -> &[SourceError] {
        match self {
            Self::Sources { errors } => errors,
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
