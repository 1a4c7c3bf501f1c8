use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Unified error type for ruby-builder operations
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Invalid ruby version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Unknown architecture: {0}")]
    UnknownArchitecture(String),

    #[error("Error running `arch`: {0}")]
    ArchProbeFailed(String),

    #[error("Cannot build Ruby {version} on {stack}: {reason}")]
    IncompatibleStack {
        stack: String,
        version: String,
        reason: String,
    },

    #[error("Failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Failed to extract {}: {reason}", .tar_file.display())]
    ExtractFailed { tar_file: PathBuf, reason: String },

    #[error("Configure failed: {0}")]
    ConfigureFailed(StageFailure),

    #[error("Make failed: {0}")]
    MakeFailed(StageFailure),

    #[error("Make install failed: {0}")]
    InstallFailed(StageFailure),

    #[error("Failed to write archive {}: {reason}", .destination.display())]
    ArchiveFailed { destination: PathBuf, reason: String },

    #[error("Build interrupted during {0}")]
    Interrupted(String),

    #[error("Artifact check failed: {0}")]
    CheckFailed(StageFailure),

    #[error("Invalid inventory {}: {reason}", .path.display())]
    Inventory { path: PathBuf, reason: String },

    #[error("Inventory already lists {url} with checksum {existing}, not {checksum}")]
    InventoryConflict {
        url: String,
        existing: String,
        checksum: String,
    },

    #[error("Invalid JOBS value '{0}': expected a positive integer")]
    InvalidJobs(String),

    #[error("Missing required environment variable {0}")]
    MissingEnv(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in ruby-builder
pub type Result<T> = std::result::Result<T, BuilderError>;

/// A shell stage that ran to completion with a non-zero exit, or never started
#[derive(Debug)]
pub struct StageFailure {
    pub command: String,
    pub status: Option<ExitStatus>,
    pub reason: Option<String>,
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}`", self.command)?;
        if let Some(status) = self.status {
            write!(f, " exited with {}", status)?;
        }
        if let Some(reason) = &self.reason {
            write!(f, " ({})", reason)?;
        }
        Ok(())
    }
}

impl BuilderError {
    /// Create a version error with context
    pub fn invalid_version(version: impl Into<String>, reason: impl Into<String>) -> Self {
        BuilderError::InvalidVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        BuilderError::Config(msg.into())
    }

    /// Create a download error with context
    pub fn download(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        BuilderError::DownloadFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an extraction error with context
    pub fn extract(tar_file: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        BuilderError::ExtractFailed {
            tar_file: tar_file.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an inventory error with context
    pub fn inventory(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        BuilderError::Inventory {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an archive error with context
    pub fn archive(destination: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        BuilderError::ArchiveFailed {
            destination: destination.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BuilderError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BuilderError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_invalid_version_names_input() {
        let err = BuilderError::invalid_version("3.1", "missing patch");
        let msg = err.to_string();
        assert!(msg.contains("'3.1'"));
        assert!(msg.contains("missing patch"));
    }

    #[test]
    fn test_stage_failure_display() {
        let failure = StageFailure {
            command: "make -j4".to_string(),
            status: None,
            reason: Some("No such file or directory".to_string()),
        };
        let err = BuilderError::MakeFailed(failure);
        assert_eq!(
            err.to_string(),
            "Make failed: `make -j4` (No such file or directory)"
        );
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (BuilderError::config("x"), "Configuration error"),
            (BuilderError::invalid_version("x", "y"), "Invalid ruby version"),
            (BuilderError::download("http://x", "404"), "Failed to download"),
            (BuilderError::extract("x.tgz", "bad"), "Failed to extract"),
            (BuilderError::archive("x.tgz", "bad"), "Failed to write archive"),
            (BuilderError::InvalidJobs("x".to_string()), "Invalid JOBS"),
            (BuilderError::MissingEnv("STACK".to_string()), "Missing required"),
            (BuilderError::Interrupted("make".to_string()), "Build interrupted"),
            (BuilderError::inventory("inv.toml", "bad"), "Invalid inventory"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
