//! Error taxonomy for the packaging pipeline.
//!
//! Every failure the pipeline can surface maps to one variant of [`Error`].
//! Tool invocations are never retried; their failures propagate unchanged.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error as DeriveError;

/// Result type for bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the bundler.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// A requested target is outside the supported vocabulary.
    #[error("Unknown target: {target}")]
    InvalidTarget {
        /// The offending token, as the user wrote it.
        target: String,
    },

    /// Ephemeral keychain creation or certificate import failed.
    #[error("Code signing setup failed: {0}")]
    CredentialSetup(String),

    /// The signing tool rejected the bundle.
    #[error("Code signing failed: {0}")]
    Signing(String),

    /// Mac App Store builds require an installer identity.
    #[error(
        "Signing is required for mas builds but CSC_INSTALLER_LINK or CSC_INSTALLER_NAME are not specified"
    )]
    MissingInstallerIdentity,

    /// Mac App Store builds require an application identity.
    #[error("Signing is required for mas builds but CSC_LINK or CSC_NAME are not specified")]
    MissingSigningIdentity,

    /// DMG, archive or installer construction failed.
    #[error("Packaging {format} failed: {reason}")]
    Packaging {
        /// Artifact format being produced.
        format: String,
        /// What went wrong.
        reason: String,
    },

    /// I/O error with the path it happened on.
    #[error("{context} {path}: {error}")]
    Fs {
        /// What was being done.
        context: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying error.
        error: io::Error,
    },

    /// Plain I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Directory traversal error.
    #[error("{0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Shorthand for a [`Error::Packaging`] error.
    pub fn packaging(format: impl Display, reason: impl Display) -> Self {
        Self::Packaging {
            format: format.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Convenient error helpers.
pub trait ErrorExt<T> {
    /// Add a context and the offending path to an I/O error.
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Attach a message to `None` values and errors.
pub trait Context<T> {
    /// Replace the failure with a [`Error::GenericError`] carrying `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Like [`Context::context`], but the message is built lazily.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

/// Return early with a [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}

/// Convert a path to `&str`, failing on non-UTF8 paths.
pub fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        Error::GenericError(format!(
            "Path contains non-UTF8 characters: {}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_target_names_the_token() {
        let err = Error::InvalidTarget {
            target: "pkg".into(),
        };
        assert_eq!(err.to_string(), "Unknown target: pkg");
    }

    #[test]
    fn fs_context_keeps_the_path() {
        let res: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = res.fs_context("reading", "/tmp/x").unwrap_err();
        assert!(matches!(err, Error::Fs { ref path, .. } if path == Path::new("/tmp/x")));
    }

    #[test]
    fn option_context_becomes_generic_error() {
        let err = None::<u8>.context("missing value").unwrap_err();
        assert_eq!(err.to_string(), "missing value");
    }
}
