//! Serial device integration for the NeuroFocus Agent.
//!
//! This module contains:
//! - Port discovery by USB hardware signature
//! - The serial link and its line framing
//! - The wire protocol codec
//! - The background reader and the feedback writer

pub mod discovery;
pub mod link;
pub mod reader;
pub mod wire;
pub mod writer;

// Re-export commonly used types
pub use discovery::{find_device_port, list_ports, PortEntry, KNOWN_DEVICE_SIGNATURES};
pub use link::{DeviceLink, LineLink, LinkError, READ_TIMEOUT, SETTLE_DELAY};
pub use reader::{PulseReader, QUEUE_CAPACITY, RECONNECT_DELAY};
pub use wire::{decode_pulse_line, scale_raw, set_command, BAUD_RATE, RAW_MAX, SAMPLE_MAX};
pub use writer::FeedbackWriter;
