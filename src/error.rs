//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout Closetly.
//! Every error maps to a stable error code and to a user-facing message.
//!
//! # Error Categories
//! - `Connection`: Database session could not be opened (fatal)
//! - `Authentication`: Wrong password or unknown role mapping (session ends)
//! - `InvalidInput`: Over-length or malformed prompt input (re-prompted)
//! - `QueryFailed`: A statement was rejected or failed on the server
//! - `Config`: Configuration file or credential secret errors
//! - `Terminal`: Prompt I/O failed

use std::fmt;

use thiserror::Error;

/// Message shown for connection failures when debug output is off
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred, please contact the administrator.";

/// Distinct causes of a failed connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// The database account or its secret was rejected
    AccessDenied,
    /// The configured database does not exist on the server
    UnknownDatabase,
    /// The host could not be reached or the socket failed
    Unreachable,
    /// Any other driver failure
    Other,
}

impl ConnectionErrorKind {
    /// Detailed, debug-only description of the failure cause
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::AccessDenied => "Incorrect username or password when connecting to DB.",
            Self::UnknownDatabase => "Database does not exist.",
            Self::Unreachable => "Database host could not be reached.",
            Self::Other => "Database connection failed.",
        }
    }
}

impl fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AccessDenied => "access denied",
            Self::UnknownDatabase => "unknown database",
            Self::Unreachable => "unreachable",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Main error type for Closetly operations
#[derive(Error, Debug)]
pub enum ClosetlyError {
    /// Database session could not be opened or was lost
    #[error("Connection failed ({kind}): {detail}")]
    Connection { kind: ConnectionErrorKind, detail: String },

    /// Login rejected or role could not be mapped
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Invalid prompt input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Statement execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Configuration error (file not found, invalid JSON, missing secret)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal prompt I/O failed
    #[error("Terminal error: {0}")]
    Terminal(String),
}

impl ClosetlyError {
    /// Convert error to a stable error code string
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "CONNECTION_FAILED",
            Self::Authentication(_) => "AUTHENTICATION_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Terminal(_) => "TERMINAL_ERROR",
        }
    }

    /// Process exit status for an error that ends the session
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Authentication(_) => 2,
            _ => 1,
        }
    }

    /// Whether the menu loop can keep going after this error
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::QueryFailed(_) | Self::InvalidInput(_))
    }

    /// Message suitable for the terminal
    ///
    /// Connection failures only reveal their cause when `debug` is set.
    /// Credentials are never part of any message.
    #[must_use]
    pub fn user_message(&self, debug: bool) -> String {
        match self {
            Self::Connection { kind, detail } if debug => {
                format!("{} ({detail})", kind.describe())
            }
            Self::Connection { .. } => GENERIC_FAILURE_MESSAGE.to_string(),
            Self::Authentication(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Create a connection error
    pub fn connection(kind: ConnectionErrorKind, detail: impl Into<String>) -> Self {
        Self::Connection { kind, detail: detail.into() }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a terminal error
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal(message.into())
    }
}

/// Result type alias for Closetly operations
pub type Result<T> = std::result::Result<T, ClosetlyError>;
