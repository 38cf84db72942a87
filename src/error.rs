//! Error types for the command line front end.
//!
//! Pipeline failures keep their [`crate::bundler::Error`] variant so the
//! caller can tell a missing installer identity from a failed DMG.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all CLI operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Errors annotated with context at the command line edge
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Process exit code for this error.
    ///
    /// `2` for invalid input (unknown targets, bad arguments), `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            BundlerError::Cli(CliError::InvalidArguments { .. })
            | BundlerError::Bundler(crate::bundler::Error::InvalidTarget { .. }) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_target_keeps_its_message() {
        let err = BundlerError::from(crate::bundler::Error::InvalidTarget {
            target: "bogus".into(),
        });
        assert_eq!(err.to_string(), "Bundler error: Unknown target: bogus");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn contextual_errors_show_the_whole_chain() {
        let cause = BundlerError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let err = BundlerError::from(
            anyhow::Error::new(cause).context("Failed to load manifest Cargo.toml"),
        );
        assert!(
            err.to_string()
                .starts_with("Failed to load manifest Cargo.toml: IO error: no such file")
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn packaging_failures_exit_with_one() {
        let err = BundlerError::from(crate::bundler::Error::packaging("dmg", "hdiutil failed"));
        assert_eq!(err.exit_code(), 1);
    }
}
