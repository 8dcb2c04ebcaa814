//! rfspy command-line tool
//!
//! Opens a serial port to subg_rfspy firmware and runs one of:
//!
//! - `rfspy sync`: state/version handshake
//! - `rfspy command <opcode> --params <hex>`: one command and its response
//! - `rfspy listen`: print responses as they arrive

mod cli;
mod config;
mod error;
mod run;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
