/*!
 * Error types for the purger
 */

use std::fmt;
use thiserror::Error;

use crate::core::ledger::LedgerError;

pub type Result<T> = std::result::Result<T, PurgerError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug, Error)]
pub enum PurgerError {
    /// Login against the homeserver failed
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Credentials file missing or malformed
    #[error("Invalid credentials file: {0}")]
    Credentials(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ledger could not be read or written
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl PurgerError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            EXIT_FATAL
        } else {
            EXIT_PARTIAL
        }
    }

    /// Fatal errors mean no pass could run at all
    pub fn is_fatal(&self) -> bool {
        match self {
            PurgerError::Authentication(_)
            | PurgerError::Credentials(_)
            | PurgerError::Config(_) => true,

            // A pass may have run; only recording it failed
            PurgerError::Ledger(_) => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            PurgerError::Authentication(_) | PurgerError::Credentials(_) => ErrorCategory::Security,
            PurgerError::Config(_) => ErrorCategory::Configuration,
            PurgerError::Ledger(_) => ErrorCategory::StateIntegrity,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Login and credential errors
    Security,
    /// Configuration errors
    Configuration,
    /// Ledger file unreadable, malformed or unwritable
    StateIntegrity,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Security => write!(f, "security"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::StateIntegrity => write!(f, "state-integrity"),
        }
    }
}

impl From<toml::de::Error> for PurgerError {
    fn from(err: toml::de::Error) -> Self {
        PurgerError::Config(format!("TOML parse error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(PurgerError::Authentication("bad password".to_string()).is_fatal());
        assert!(PurgerError::Credentials("missing username".to_string()).is_fatal());
        assert!(PurgerError::Config("bad url".to_string()).is_fatal());
    }

    #[test]
    fn test_non_fatal_errors() {
        let err = PurgerError::Ledger(LedgerError::CorruptState("truncated".to_string()));
        assert!(!err.is_fatal());
        assert_eq!(err.exit_code(), EXIT_PARTIAL);

        let err = PurgerError::from(LedgerError::Io(std::io::Error::other("disk full")));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            PurgerError::Authentication("x".to_string()).exit_code(),
            EXIT_FATAL
        );
        assert_eq!(
            PurgerError::Config("x".to_string()).exit_code(),
            EXIT_FATAL
        );
        assert_eq!(
            PurgerError::from(LedgerError::NotFound("/config/old.json".into())).exit_code(),
            EXIT_PARTIAL
        );
    }

    #[test]
    fn test_error_display() {
        let err = PurgerError::Authentication("M_FORBIDDEN".to_string());
        assert_eq!(err.to_string(), "Authentication error: M_FORBIDDEN");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            PurgerError::Credentials("x".to_string()).category(),
            ErrorCategory::Security
        );
        assert_eq!(
            PurgerError::Ledger(LedgerError::CorruptState("x".to_string())).category(),
            ErrorCategory::StateIntegrity
        );
        assert_eq!(
            PurgerError::Config("x".to_string()).category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::StateIntegrity.to_string(), "state-integrity");
        assert_eq!(ErrorCategory::Security.to_string(), "security");
    }
}
