//! NeuroFocus Agent - pulse-derived attention and stress monitoring.
//!
//! This library reads a pulse signal from biofeedback hardware on a serial
//! port (or synthesizes one in demo mode), smooths it over a sliding
//! window, classifies the result into a stress level, and feeds the level
//! back to the device as an indicator command.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      NeuroFocus Agent                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Reader    │──▶│  Hand-off   │──▶│   Engine    │       │
//! │  │  (serial)   │   │   queue     │   │(smooth+map) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         ▲                                    │              │
//! │         │ reconnect                          ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │   Device    │◀────────────────────│  Feedback   │       │
//! │  │   (link)    │     SET:<level>     │   writer    │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use neurofocus_agent::config::Config;
//! use neurofocus_agent::session::MonitorSession;
//!
//! let config = Config {
//!     demo_mode: true,
//!     ..Config::default()
//! };
//!
//! let mut session = MonitorSession::new();
//! session.start(&config).expect("demo sessions start without hardware");
//!
//! let reading = session.tick(&config);
//! println!("{} -> {}", reading.smoothed, reading.level);
//!
//! session.stop();
//! ```

pub mod config;
pub mod core;
pub mod device;
pub mod session;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{classify, Engine, Level, Sample, SignalSource, TickReading};
pub use device::{find_device_port, list_ports, FeedbackWriter, LineLink, LinkError, PulseReader};
pub use session::{MonitorSession, SessionError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Plain-language description that can be displayed to users.
pub const ABOUT: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║            NEUROFOCUS AGENT - ATTENTION/STRESS MONITOR           ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  NeuroFocus reads a pulse-derived signal from a serial           ║
║  biofeedback device and turns it into a live stress readout.     ║
║                                                                  ║
║  Each reading is smoothed over a sliding window and mapped       ║
║  to one of three levels:                                         ║
║                                                                  ║
║    • Relaxed - smoothed value at or above the high threshold     ║
║    • Mild    - between the two thresholds                        ║
║    • High    - below the mid threshold                           ║
║                                                                  ║
║  The current level is written back to the device as a SET        ║
║  command so it can drive an onboard indicator.                   ║
║                                                                  ║
║  No hardware handy? Run with a simulated signal:                 ║
║    neurofocus start --demo                                       ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
