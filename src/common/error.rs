//! Error types for the aloe test engine
//!
//! Errors fall into three groups: fatal load/registration errors that abort a
//! run before any suite is scheduled, step errors that fail a single leaf, and
//! cleanup errors that fail the leaf whose completion triggered the cleaner.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the test engine
#[derive(Error, Debug)]
pub enum Error {
    // === Load/Registration Errors ===
    #[error("Failed to load test data from '{path}': {message}")]
    Load { path: String, message: String },

    #[error("Can't register {kind} '{name}': already exists")]
    AlreadyRegistered { kind: &'static str, name: String },

    // === Context Construction Errors ===
    #[error("Presetter '{0}' is not registered")]
    UnknownPresetter(String),

    #[error("Presetter '{name}' failed: {message}")]
    Preset { name: String, message: String },

    #[error("Group '{0}' has already drained all of its leaves")]
    GroupDrained(String),

    // === Step Errors ===
    #[error("Invalid response expectation: {0}")]
    MatcherBuild(String),

    #[error("Template expansion failed: {0}")]
    Template(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Response mismatch: {0}")]
    Mismatch(String),

    #[error("Response did not match within {timeout:?} ({attempts} attempts): {last}")]
    EventuallyTimeout {
        timeout: Duration,
        attempts: usize,
        last: String,
    },

    #[error("Failed to extract variable '{name}': {message}")]
    VariableExtraction { name: String, message: String },

    // === Cleanup Errors ===
    #[error("Cleaner '{name}' failed: {message}")]
    Cleanup { name: String, message: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),
}

impl Error {
    /// Create a load error for a data path
    pub fn load<P: AsRef<std::path::Path>>(path: P, message: impl ToString) -> Self {
        Self::Load {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a duplicate registration error
    pub fn already_registered(kind: &'static str, name: &str) -> Self {
        Self::AlreadyRegistered {
            kind,
            name: name.to_string(),
        }
    }

    /// Create a variable extraction error
    pub fn variable_extraction(name: &str, message: impl ToString) -> Self {
        Self::VariableExtraction {
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a cleanup error attributed to a cleaner
    pub fn cleanup(name: &str, message: impl ToString) -> Self {
        Self::Cleanup {
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether this error aborts the whole run rather than a single leaf
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Load { .. }
                | Error::AlreadyRegistered { .. }
                | Error::Config(_)
                | Error::ConfigParse(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}
