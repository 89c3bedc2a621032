//! Serial device link.
//!
//! One `DeviceLink` wraps one open serial connection. The reader loop and
//! the feedback writer each own their own link; nothing here is shared.

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

/// Settle delay after opening. The device resets on connect and needs a
/// moment before its output is trustworthy.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Default per-read timeout; also bounds the reader's stop latency.
pub const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Upper bound on bytes buffered while hunting for a newline. Protocol
/// lines are short; a longer run without a newline is noise.
const MAX_LINE_BYTES: usize = 1024;

/// Errors from the serial link.
#[derive(Debug)]
pub enum LinkError {
    /// Opening the port failed
    Connect(String),
    /// Read or write failed mid-session; the handle is no longer trustworthy
    Io(String),
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::Connect(e) => write!(f, "Connection failed: {e}"),
            LinkError::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for LinkError {}

/// Line-oriented read/write capability of a link.
///
/// `DeviceLink` is the real implementation; tests script this trait to
/// drive the reader and writer without hardware.
pub trait LineLink: Send {
    /// Read one complete line, waiting at most `timeout`.
    ///
    /// `Ok(None)` means no complete line arrived in time; that is not an
    /// error.
    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, LinkError>;

    /// Write one line (newline appended) and flush it out.
    fn write_line(&mut self, line: &str) -> Result<(), LinkError>;
}

/// An open serial connection to the pulse device.
pub struct DeviceLink {
    port: Box<dyn SerialPort>,
    buf: Vec<u8>,
    name: String,
}

impl DeviceLink {
    /// Open `port_name` at `baud` (8N1, no flow control) and wait out the
    /// device's reset settle delay.
    ///
    /// The reader loop and the feedback writer each hold their own link to
    /// the same device, so on Unix the exclusive-access flag is cleared
    /// before the link is handed out.
    pub fn open(port_name: &str, baud: u32) -> Result<Self, LinkError> {
        let builder = serialport::new(port_name, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT);

        let port =
            open_shared(builder).map_err(|e| LinkError::Connect(format!("{port_name}: {e}")))?;

        thread::sleep(SETTLE_DELAY);
        tracing::info!("Opened serial port {} at {} baud", port_name, baud);

        Ok(Self {
            port,
            buf: Vec::new(),
            name: port_name.to_string(),
        })
    }

    /// The port this link was opened on.
    pub fn port_name(&self) -> &str {
        &self.name
    }

    /// Release the connection. Dropping the link does the same; this makes
    /// the hand-back explicit at session teardown.
    pub fn close(self) {}
}

/// Open the configured port without OS-level exclusive access.
///
/// serialport sets TIOCEXCL on every Unix open; left in place, the second
/// of the two links on the shared device would fail with a busy error.
#[cfg(unix)]
fn open_shared(builder: serialport::SerialPortBuilder) -> serialport::Result<Box<dyn SerialPort>> {
    let mut port = builder.open_native()?;
    port.set_exclusive(false)?;
    Ok(Box::new(port))
}

/// COM ports are exclusive at the OS level; only the plain open applies.
#[cfg(not(unix))]
fn open_shared(builder: serialport::SerialPortBuilder) -> serialport::Result<Box<dyn SerialPort>> {
    builder.open()
}

impl LineLink for DeviceLink {
    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, LinkError> {
        // A prior read may have buffered more than one line.
        if let Some(line) = take_line(&mut self.buf) {
            return Ok(Some(line));
        }

        self.port
            .set_timeout(timeout)
            .map_err(|e| LinkError::Io(e.to_string()))?;

        let mut chunk = [0u8; 256];
        match self.port.read(&mut chunk) {
            Ok(0) => Ok(None),
            Ok(n) => {
                self.buf.extend_from_slice(&chunk[..n]);
                if self.buf.len() > MAX_LINE_BYTES {
                    self.buf.clear();
                }
                Ok(take_line(&mut self.buf))
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(LinkError::Io(e.to_string())),
        }
    }

    fn write_line(&mut self, line: &str) -> Result<(), LinkError> {
        let framed = format!("{line}\n");
        self.port
            .write_all(framed.as_bytes())
            .map_err(|e| LinkError::Io(e.to_string()))?;
        self.port
            .flush()
            .map_err(|e| LinkError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Split the first complete line off the front of `buf`, stripping CR/LF.
fn take_line(buf: &mut Vec<u8>) -> Option<String> {
    let pos = buf.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = buf.drain(..=pos).collect();
    let text = String::from_utf8_lossy(&line);
    Some(text.trim_end_matches(|c| c == '\r' || c == '\n').to_string())
}
