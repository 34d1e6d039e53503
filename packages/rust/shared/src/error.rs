//! Error types for lessonpress.
//!
//! Library crates use [`LessonPressError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Fatality is positional: `Io` aborts the invoking stage before it writes
//! any output, while `Lookup`, `Submission`, and `Rename` are scoped to a
//! single transcript record and are logged, not propagated, by the deploy
//! loop.

use std::path::PathBuf;

/// Top-level error type for all lessonpress operations.
#[derive(Debug, thiserror::Error)]
pub enum LessonPressError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error (fatal to the invoking stage).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("json error: {message}")]
    Json { message: String },

    /// Network/HTTP transport error outside any one record's scope
    /// (e.g. the client itself could not be built).
    #[error("network error: {0}")]
    Network(String),

    /// Remote slug lookup failed for one record.
    #[error("lookup failed for '{slug}': {message}")]
    Lookup { slug: String, message: String },

    /// Remote transcript submission failed for one record.
    #[error("submission failed for '{slug}': {message}")]
    Submission { slug: String, message: String },

    /// Local file rename failed for one record (best-effort only).
    #[error("rename failed for '{slug}': {message}")]
    Rename { slug: String, message: String },

    /// External document renderer failed.
    #[error("render error: {0}")]
    Render(String),

    /// Data validation error (duplicate slug, missing field, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LessonPressError>;

impl LessonPressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a per-record lookup error.
    pub fn lookup(slug: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Lookup {
            slug: slug.into(),
            message: msg.into(),
        }
    }

    /// Create a per-record submission error.
    pub fn submission(slug: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Submission {
            slug: slug.into(),
            message: msg.into(),
        }
    }

    /// Create a per-record rename error.
    pub fn rename(slug: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Rename {
            slug: slug.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = LessonPressError::config("missing auth token");
        assert_eq!(err.to_string(), "config error: missing auth token");

        let err = LessonPressError::lookup("intro", "HTTP 404");
        assert_eq!(err.to_string(), "lookup failed for 'intro': HTTP 404");

        let err = LessonPressError::validation("duplicate lesson slug 'setup'");
        assert!(err.to_string().contains("duplicate lesson slug"));
    }
}
