// src/error.rs

//! Error types for gopkg
//!
//! Every failure the acquire/resolve/install pipeline can hit is a variant of
//! [`Error`]. Most of them are not propagated up a call chain: the walker and
//! the installer hand them to a [`crate::Diagnostics`] accumulator and carry on
//! with independent work.

use thiserror::Error;

/// Errors produced by gopkg
#[derive(Error, Debug)]
pub enum Error {
    /// Bad flags or arguments, raised before any phase runs
    #[error("{0}")]
    Usage(String),

    /// A dependency cycle found by the traversal stack check
    #[error("import cycle not allowed: {}", .cycle.join(" -> "))]
    ImportCycle { cycle: Vec<String> },

    /// Checkout, update or tag switch failed for a package
    #[error("{path}: {message}")]
    Vcs { path: String, message: String },

    /// Malformed per-package manifest
    #[error("{path}: malformed manifest: {message}")]
    ManifestParse { path: String, message: String },

    /// Package directory missing after materialization
    #[error("cannot find package \"{path}\" in {dir}")]
    PackageNotFound { path: String, dir: String },

    /// Package directory holds no source files
    #[error("no buildable source files in {dir} (package {path})")]
    NoSources { path: String, dir: String },

    /// A source file imports something that is not a valid import path
    #[error("{path}: invalid import path \"{import}\"")]
    BadImport { path: String, import: String },

    /// Build or install failed for one package
    #[error("{path}: install failed: {message}")]
    Install { path: String, message: String },

    /// The package already failed earlier in the same phase
    #[error("{path}: not resolved (failed earlier in this run)")]
    Unresolved { path: String },

    /// Configuration problem
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// True when the error only points back at a failure that was already reported
    pub fn is_repeat(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }

    /// True for errors that must stop the process with the usage status
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::Config(_))
    }
}

/// Result type alias for gopkg operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_every_step() {
        let err = Error::ImportCycle {
            cycle: vec!["pkg/a".into(), "pkg/b".into(), "pkg/a".into()],
        };
        assert_eq!(
            err.to_string(),
            "import cycle not allowed: pkg/a -> pkg/b -> pkg/a"
        );
    }

    #[test]
    fn test_classification() {
        assert!(Error::Usage("x".into()).is_usage());
        assert!(Error::Config("x".into()).is_usage());
        assert!(!Error::Unresolved { path: "p".into() }.is_usage());
        assert!(Error::Unresolved { path: "p".into() }.is_repeat());
        assert!(!Error::NoSources { path: "p".into(), dir: "d".into() }.is_repeat());
    }
}
