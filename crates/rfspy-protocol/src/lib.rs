//! subg_rfspy Serial Protocol
//!
//! This crate provides a framed request/response session for communicating
//! with subg_rfspy radio firmware over a byte-oriented serial link.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → firmware): a single opcode byte followed by the
//!   command parameters. There is no length prefix; the firmware knows how
//!   many parameter bytes each opcode takes.
//! - **Responses** (firmware → host): payload bytes terminated by a single
//!   `0x00` byte.
//! - **Interrupted commands**: a response of at most two bytes starting with
//!   `0xBB` means the previous command was cut short. The session drops it
//!   and keeps waiting for the real response.
//!
//! ```text
//! host → fw   +--------+---------------------+
//!             | opcode | params[0..N]        |
//!             +--------+---------------------+
//! fw → host   +---------------------+------+
//!             | payload[0..N]       | 0x00 |
//!             +---------------------+------+
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rfspy_protocol::{FramedSession, SerialPortStream, SessionConfig, CMD_GET_PACKET};
//! use std::time::Duration;
//!
//! let config = SessionConfig::default();
//! let stream = SerialPortStream::open("/dev/ttyACM0", 19200, config.default_write_timeout)?;
//! let mut session = FramedSession::with_config(stream, config);
//!
//! let identity = session.sync()?;
//! println!("subg_rfspy {}", identity.version_str());
//!
//! let response = session.do_command(CMD_GET_PACKET, &[0x00, 0x00, 0x00, 0x64], Duration::from_secs(1))?;
//! ```

mod commands;
mod config;
mod constants;
mod error;
mod frame;
mod responses;
mod session;
mod stream;
mod tracer;

pub use commands::*;
pub use config::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use responses::*;
pub use session::*;
pub use stream::*;
pub use tracer::*;
