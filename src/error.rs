use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(daybook::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(daybook::config))]
    Config(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(daybook::google_calendar))]
    GoogleCalendar(String),

    #[error("Authorization error: {0}")]
    #[diagnostic(
        code(daybook::auth),
        help("Run `get_calendar_token` to authorize daybook again")
    )]
    Auth(String),

    #[error("Cache error: {0}")]
    #[diagnostic(code(daybook::cache))]
    Cache(String),

    #[error(transparent)]
    #[diagnostic(code(daybook::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(daybook::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(daybook::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Cache(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type DaybookResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create authorization errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
