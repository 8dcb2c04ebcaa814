//! Subcommand implementations.
//!
//! These are generic over the stream and the output so they run the same
//! against a serial port and a scripted stream.

use std::io::Write;
use std::time::Duration;

use rfspy_protocol::{
    opcode_name, validate_timeout, ByteStream, FramedSession, Response, SerialPortStream,
    SessionTracer,
};
use tracing::{debug, info};

use crate::cli::{parse_params, Cli, ToolCommand};
use crate::config::ToolConfig;
use crate::error::{ToolError, ToolResult};

/// Open the port described by the arguments and run the subcommand.
pub fn run(cli: Cli) -> ToolResult<()> {
    let config = cli.tool_config()?;
    let session_config = config.session_config()?;
    let port = config.port.as_deref().ok_or(ToolError::MissingPort)?;

    info!(port, baud = config.baud_rate, "opening serial port");
    let stream = SerialPortStream::open(port, config.baud_rate, session_config.default_write_timeout)?;
    let mut session = FramedSession::with_config(stream, session_config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    dispatch(&mut session, &cli.command, &config, &mut out)
}

/// Run one subcommand on an open session.
pub fn dispatch<S, T, W>(
    session: &mut FramedSession<S, T>,
    command: &ToolCommand,
    config: &ToolConfig,
    out: &mut W,
) -> ToolResult<()>
where
    S: ByteStream,
    T: SessionTracer,
    W: Write,
{
    match command {
        ToolCommand::Sync => sync(session, out),
        ToolCommand::Command {
            opcode,
            params,
            timeout_ms,
        } => {
            let params = parse_params(params)?;
            let timeout = response_timeout(config, *timeout_ms)?;
            command_once(session, *opcode, &params, timeout, out)
        }
        ToolCommand::Listen { timeout_ms, count } => {
            let timeout = response_timeout(config, *timeout_ms)?;
            listen(session, timeout, *count, out)
        }
    }
}

fn response_timeout(config: &ToolConfig, override_ms: Option<u64>) -> ToolResult<Duration> {
    match override_ms {
        Some(ms) => Ok(validate_timeout(Duration::from_millis(ms))?),
        None => config.response_timeout(),
    }
}

/// Run the handshake and print what the firmware reported.
pub fn sync<S, T, W>(session: &mut FramedSession<S, T>, out: &mut W) -> ToolResult<()>
where
    S: ByteStream,
    T: SessionTracer,
    W: Write,
{
    let identity = session.sync()?;
    writeln!(out, "status: {}", identity.status_str())?;
    writeln!(out, "version: {}", identity.version_str())?;
    Ok(())
}

/// Send one command and print its response.
pub fn command_once<S, T, W>(
    session: &mut FramedSession<S, T>,
    opcode: u8,
    params: &[u8],
    timeout: Duration,
    out: &mut W,
) -> ToolResult<()>
where
    S: ByteStream,
    T: SessionTracer,
    W: Write,
{
    debug!(
        opcode,
        name = opcode_name(opcode),
        params = %hex::encode(params),
        "sending command"
    );
    let response = session.do_command(opcode, params, timeout)?;
    print_response(&response, out)
}

/// Wait for responses without sending anything.
pub fn listen<S, T, W>(
    session: &mut FramedSession<S, T>,
    timeout: Duration,
    count: Option<usize>,
    out: &mut W,
) -> ToolResult<()>
where
    S: ByteStream,
    T: SessionTracer,
    W: Write,
{
    let mut waits = 0usize;
    while count.map_or(true, |limit| waits < limit) {
        let response = session.get_response(timeout)?;
        print_response(&response, out)?;
        waits += 1;
    }
    Ok(())
}

fn print_response<W: Write>(response: &Response, out: &mut W) -> ToolResult<()> {
    match response.device_status() {
        Some(status) => writeln!(out, "{} [{}]", response, status)?,
        None => writeln!(out, "{}", response)?,
    }
    out.flush()?;
    Ok(())
}
