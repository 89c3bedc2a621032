//! Monitor session: the host-owned object that wires the pipeline.
//!
//! The host creates one session, calls `start`, then drives `tick` at its
//! own cadence and renders the returned readings. All state lives here;
//! nothing in the crate is process-global.

use crate::config::{Config, ConfigError, DEFAULT_SMOOTH_WINDOW};
use crate::core::{DemoSource, DeviceSource, Engine, Sample, SignalSource, TickReading};
use crate::device::discovery::find_device_port;
use crate::device::reader::PulseReader;
use crate::device::writer::FeedbackWriter;
use uuid::Uuid;

/// Errors surfaced by session control.
#[derive(Debug)]
pub enum SessionError {
    /// The configuration failed validation
    Config(ConfigError),
    /// Hardware mode requested but no known device is attached
    NoDeviceFound,
    /// `start` called on a session that is already running
    AlreadyRunning,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Config(e) => write!(f, "{e}"),
            SessionError::NoDeviceFound => {
                write!(f, "No pulse device found on any serial port")
            }
            SessionError::AlreadyRunning => write!(f, "Session is already running"),
        }
    }
}

impl std::error::Error for SessionError {}

/// The active signal source for a running session.
enum SessionSource {
    Demo(DemoSource),
    Device(DeviceSource),
}

impl SignalSource for SessionSource {
    fn next_sample(&mut self) -> Sample {
        match self {
            SessionSource::Demo(source) => source.next_sample(),
            SessionSource::Device(source) => source.next_sample(),
        }
    }
}

/// One monitoring run: source, engine, reader, and writer under host control.
pub struct MonitorSession {
    session_id: Uuid,
    engine: Engine,
    source: SessionSource,
    reader: Option<PulseReader>,
    writer: Option<FeedbackWriter>,
    resolved_port: Option<String>,
    last_reading: Option<TickReading>,
    running: bool,
}

impl MonitorSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            engine: Engine::new(DEFAULT_SMOOTH_WINDOW),
            source: SessionSource::Demo(DemoSource::new()),
            reader: None,
            writer: None,
            resolved_port: None,
            last_reading: None,
            running: false,
        }
    }

    /// Unique id of this session object.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Begin a run with the given configuration.
    ///
    /// In hardware mode this resolves the port (explicit override or
    /// discovery), opens the feedback writer on its own connection, then
    /// spawns the background reader. A failed writer open is logged and
    /// the run continues without feedback. Window and history start clean.
    pub fn start(&mut self, config: &Config) -> Result<(), SessionError> {
        if self.running {
            return Err(SessionError::AlreadyRunning);
        }
        config.validate().map_err(SessionError::Config)?;

        self.engine.reset();
        self.last_reading = None;

        if config.demo_mode {
            self.source = SessionSource::Demo(DemoSource::new());
            self.resolved_port = None;
        } else {
            let port = match config.port.clone().or_else(find_device_port) {
                Some(port) => port,
                None => return Err(SessionError::NoDeviceFound),
            };

            // Writer first: each open of the shared device briefly holds
            // the OS exclusive flag, so the writer's open must finish
            // before the reader thread attempts its own.
            match FeedbackWriter::connect(&port) {
                Ok(writer) => self.writer = Some(writer),
                Err(e) => {
                    tracing::warn!("Feedback writer unavailable: {}", e);
                    self.writer = None;
                }
            }

            let reader = PulseReader::start(port.clone());
            self.source = SessionSource::Device(DeviceSource::new(reader.samples().clone()));
            self.reader = Some(reader);

            self.resolved_port = Some(port);
        }

        self.running = true;
        tracing::info!("Session {} started", self.session_id);
        Ok(())
    }

    /// Run one tick: draw a sample, smooth, classify, and feed the level
    /// back to the device. Configuration values are read fresh on every
    /// call, so live adjustments take effect immediately.
    pub fn tick(&mut self, config: &Config) -> TickReading {
        let sample = self.source.next_sample();
        let reading = self.engine.process(sample, config);

        if let Some(writer) = self.writer.as_mut() {
            writer.send(reading.level);
        }

        self.last_reading = Some(reading.clone());
        reading
    }

    /// End the run: stop and join the reader, close the writer.
    ///
    /// History and the last reading survive so the host can keep showing
    /// the finished run.
    pub fn stop(&mut self) {
        if let Some(mut reader) = self.reader.take() {
            reader.stop();
        }
        if let Some(mut writer) = self.writer.take() {
            writer.close();
        }
        if self.running {
            self.running = false;
            tracing::info!("Session {} stopped", self.session_id);
        }
    }

    /// The display history, oldest first.
    pub fn history(&self) -> Vec<Sample> {
        self.engine.history()
    }

    /// The most recent tick's output, retained across `stop`.
    pub fn last_reading(&self) -> Option<&TickReading> {
        self.last_reading.as_ref()
    }

    /// The serial port the session resolved at start, in hardware mode.
    pub fn resolved_port(&self) -> Option<&str> {
        self.resolved_port.as_deref()
    }

    /// Whether `start` has run without a matching `stop`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the background reader currently holds an open link.
    pub fn reader_connected(&self) -> bool {
        self.reader.as_ref().map(|r| r.is_connected()).unwrap_or(false)
    }

    /// Whether the feedback writer still holds its connection.
    pub fn writer_connected(&self) -> bool {
        self.writer.as_ref().map(|w| w.is_connected()).unwrap_or(false)
    }
}

impl Default for MonitorSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_config() -> Config {
        Config {
            demo_mode: true,
            ..Config::default()
        }
    }

    #[test]
    fn test_demo_session_lifecycle() {
        let mut session = MonitorSession::new();
        assert!(!session.is_running());

        let config = demo_config();
        session.start(&config).unwrap();
        assert!(session.is_running());
        assert!(session.resolved_port().is_none());

        for _ in 0..5 {
            let reading = session.tick(&config);
            assert!(reading.sample <= 100);
            assert!(reading.smoothed <= 100);
        }
        assert_eq!(session.history().len(), 5);

        session.stop();
        assert!(!session.is_running());
        // The finished run stays visible.
        assert_eq!(session.history().len(), 5);
        assert!(session.last_reading().is_some());
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut session = MonitorSession::new();
        session.start(&demo_config()).unwrap();
        assert!(matches!(
            session.start(&demo_config()),
            Err(SessionError::AlreadyRunning)
        ));
        session.stop();
    }

    #[test]
    fn test_restart_clears_history() {
        let mut session = MonitorSession::new();
        let config = demo_config();

        session.start(&config).unwrap();
        for _ in 0..3 {
            session.tick(&config);
        }
        session.stop();

        session.start(&config).unwrap();
        assert!(session.history().is_empty());
        session.stop();
    }

    #[test]
    fn test_invalid_config_rejected_at_start() {
        let mut session = MonitorSession::new();
        let config = Config {
            demo_mode: true,
            thresh_high: 40,
            thresh_med: 70,
            ..Config::default()
        };
        assert!(matches!(
            session.start(&config),
            Err(SessionError::Config(_))
        ));
        assert!(!session.is_running());
    }
}
