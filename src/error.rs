//! Error types for persona-digest
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI
//!
//! Most failures in the pipeline are recovered close to where they happen
//! (one persona call, one record file). Only configuration errors and an
//! unreadable input root or unwritable output root end a run.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for persona-digest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Transport errors (3xx)
    TransportFailed = 300,
    TransportTimeout = 301,
    ApiStatus = 302,

    // Parse errors (4xx)
    ResponseMalformed = 400,
    PersonaParse = 401,
    RecordParse = 402,
    Serialization = 403,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10,
            200..=299 => 20,
            300..=399 => 30,
            400..=499 => 40,
            900..=999 => 90,
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File or directory read error
    #[error("Failed to read: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File or directory write error
    #[error("Failed to write: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Transport Errors (text-generation API)
    // ─────────────────────────────────────────────────────────────

    /// Request could not be completed
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Request timed out
    #[error("Request to {url} timed out after {timeout_secs}s")]
    TransportTimeout { url: String, timeout_secs: u64 },

    /// API answered with a non-success status
    #[error("API returned status {status}: {body}")]
    ApiStatus { status: u16, body: String },

    // ─────────────────────────────────────────────────────────────
    // Parse Errors
    // ─────────────────────────────────────────────────────────────

    /// Reply did not have the expected shape
    #[error("Malformed API response: {message}")]
    ResponseMalformed { message: String },

    /// Generated persona text could not be decoded
    #[error("Could not parse persona: {message}")]
    PersonaParse { message: String },

    /// Summary record on disk could not be decoded
    #[error("Invalid summary record {path}: {source}")]
    RecordParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },

            Error::Transport { .. } => ErrorCode::TransportFailed,
            Error::TransportTimeout { .. } => ErrorCode::TransportTimeout,
            Error::ApiStatus { .. } => ErrorCode::ApiStatus,

            Error::ResponseMalformed { .. } => ErrorCode::ResponseMalformed,
            Error::PersonaParse { .. } => ErrorCode::PersonaParse,
            Error::RecordParse { .. } => ErrorCode::RecordParse,
            Error::Json(_) | Error::Toml(_) => ErrorCode::Serialization,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if a repeated attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { .. } | Error::TransportTimeout { .. } => true,
            Error::ApiStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'persona-digest config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'persona-digest config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),
            Error::IoRead { .. } => Some(
                "Check that the path exists and is readable. Input roots are set with 'generation.input_dir'."
            ),
            Error::IoWrite { .. } => Some(
                "Check that the output directory is writable."
            ),
            Error::Transport { .. } | Error::TransportTimeout { .. } => Some(
                "Check your network connection and the 'llm.base_url' setting."
            ),
            Error::ApiStatus { status: 401, .. } | Error::ApiStatus { status: 403, .. } => Some(
                "The API rejected the credentials. Set 'llm.api_key' or PERSONA_DIGEST_API_KEY."
            ),
            Error::RecordParse { .. } => Some(
                "The summary file is not a valid record. Delete it or regenerate it with 'persona-digest generate'."
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", self.code().as_str(), self);

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoRead {
            path: path.into(),
            source,
        }
    }

    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a transport error
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::ResponseMalformed {
            message: message.into(),
        }
    }

    /// Create a persona parse error
    pub fn persona_parse(message: impl Into<String>) -> Self {
        Error::PersonaParse {
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E100");
        assert_eq!(ErrorCode::TransportFailed.as_str(), "E300");
        assert_eq!(ErrorCode::PersonaParse.as_str(), "E401");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::TransportTimeout.exit_code(), 30);
        assert_eq!(ErrorCode::RecordParse.exit_code(), 40);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_error_display() {
        let err = Error::config_not_found("/path/to/config.toml");
        assert!(err.to_string().contains("/path/to/config.toml"));

        let err = Error::ApiStatus { status: 503, body: "overloaded".into() };
        assert_eq!(err.to_string(), "API returned status 503: overloaded");
    }

    #[test]
    fn test_error_retryable() {
        assert!(Error::transport("http://api", "reset").is_retryable());
        assert!(Error::TransportTimeout { url: "u".into(), timeout_secs: 30 }.is_retryable());
        assert!(Error::ApiStatus { status: 429, body: String::new() }.is_retryable());
        assert!(Error::ApiStatus { status: 502, body: String::new() }.is_retryable());
        assert!(!Error::ApiStatus { status: 400, body: String::new() }.is_retryable());
        assert!(!Error::persona_parse("no braces").is_retryable());
    }

    #[test]
    fn test_error_suggestions() {
        let err = Error::config_not_found("/test");
        assert!(err.suggestion().unwrap().contains("config init"));

        let err = Error::ApiStatus { status: 401, body: String::new() };
        assert!(err.suggestion().unwrap().contains("api_key"));

        assert!(Error::malformed("x").suggestion().is_none());
    }

    #[test]
    fn test_format_for_terminal() {
        let formatted = Error::config_not_found("/test/config.toml").format_for_terminal();
        assert!(formatted.contains("E100"));
        assert!(formatted.contains("\x1b[31m"));
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let formatted = Error::config_not_found("/test/config.toml").format_for_log();
        assert!(formatted.contains("[E100]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.code(), ErrorCode::Serialization);
        assert_eq!(err.exit_code(), 40);
    }
}
