//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ToolConfig;
use crate::error::{ToolError, ToolResult};

/// Talk to subg_rfspy radio firmware over a serial port.
#[derive(Debug, Parser)]
#[command(name = "rfspy", version, about)]
pub struct Cli {
    /// Serial device, e.g. /dev/ttyACM0.
    #[arg(short, long, global = true)]
    pub port: Option<String>,

    /// Baud rate.
    #[arg(short, long, global = true)]
    pub baud: Option<u32>,

    /// YAML config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: ToolCommand,
}

/// What to do once the port is open.
#[derive(Debug, Subcommand)]
pub enum ToolCommand {
    /// Run the state/version handshake.
    Sync,

    /// Send one command and print its response.
    Command {
        /// Opcode, decimal or 0x-prefixed hex.
        #[arg(value_parser = parse_opcode)]
        opcode: u8,

        /// Parameters as a hex string.
        #[arg(long, default_value = "")]
        params: String,

        /// Timeout for the write and the response (milliseconds).
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Print responses as they arrive.
    Listen {
        /// Timeout for each response (milliseconds).
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Stop after this many waits; runs until interrupted if omitted.
        #[arg(long)]
        count: Option<usize>,
    },
}

impl Cli {
    /// Load the config file, if any, and apply command-line overrides.
    pub fn tool_config(&self) -> ToolResult<ToolConfig> {
        let mut config = match &self.config {
            Some(path) => ToolConfig::from_file(path)?,
            None => ToolConfig::default(),
        };
        if let Some(port) = &self.port {
            config.port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        Ok(config)
    }
}

/// Parse an opcode given as decimal (`5`) or hex (`0x05`).
pub fn parse_opcode(text: &str) -> Result<u8, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex_digits) => u8::from_str_radix(hex_digits, 16),
        None => text.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid opcode '{}': {}", text, e))
}

/// Decode a hex parameter string; whitespace is ignored.
pub fn parse_params(text: &str) -> ToolResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact)
        .map_err(|e| ToolError::InvalidArgument(format!("params '{}': {}", text, e)))
}
