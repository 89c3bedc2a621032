//! Feedback writer: pushes the current classification back to the device.
//!
//! The writer holds its own connection, separate from the reader's. On
//! write failure it goes quiet until the next session start; reopening a
//! port costs the settle delay, which does not belong in the tick path.

use crate::core::Level;
use crate::device::link::{DeviceLink, LineLink, LinkError};
use crate::device::wire::{set_command, BAUD_RATE};

/// Best-effort feedback channel to the device.
pub struct FeedbackWriter<L: LineLink = DeviceLink> {
    link: Option<L>,
}

impl FeedbackWriter {
    /// Open a second, independent connection to the resolved port.
    pub fn connect(port: &str) -> Result<Self, LinkError> {
        let link = DeviceLink::open(port, BAUD_RATE)?;
        Ok(Self { link: Some(link) })
    }
}

impl<L: LineLink> FeedbackWriter<L> {
    /// Wrap an already-open link.
    pub fn with_link(link: L) -> Self {
        Self { link: Some(link) }
    }

    /// Send the level command; a no-op when the writer is unconnected.
    ///
    /// A write failure invalidates the handle: the link is dropped and
    /// later calls do nothing until the session reopens the writer.
    pub fn send(&mut self, level: Level) {
        if let Some(link) = self.link.as_mut() {
            if let Err(e) = link.write_line(&set_command(level)) {
                tracing::warn!("Feedback write failed, disabling writer: {}", e);
                self.link = None;
            }
        }
    }

    /// Whether the writer still holds an open link.
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Drop the connection.
    pub fn close(&mut self) {
        self.link = None;
    }
}
