//! Error types for the rfspy tool.

use rfspy_protocol::RfSpyError;
use thiserror::Error;

/// Errors surfaced by the command-line tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The session failed.
    #[error(transparent)]
    Protocol(#[from] RfSpyError),

    /// Opening the port or reading the config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid YAML for [`crate::config::ToolConfig`].
    #[error("invalid config file: {0}")]
    Config(#[from] serde_yaml::Error),

    /// No serial port given on the command line or in the config file.
    #[error("no serial port given; pass --port or set `port` in the config file")]
    MissingPort,

    /// A command-line value could not be parsed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
