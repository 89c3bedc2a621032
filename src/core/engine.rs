//! Smoothing and classification of pulse samples.
//!
//! The engine owns the smoothing window and display history. Each tick it
//! takes one sample, refreshes the window capacity from the configuration,
//! and maps the smoothed value to a stress level.

use crate::config::Config;
use crate::core::window::{SampleHistory, SampleWindow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pulse-derived signal value in [0,100].
pub type Sample = u16;

/// Discrete stress level derived from the smoothed signal.
///
/// The wire ordinal (`SET:<n>`) is Relaxed=0, Mild=1, High=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Relaxed,
    Mild,
    High,
}

impl Level {
    /// Ordinal used in device commands.
    pub fn ordinal(&self) -> u8 {
        match self {
            Level::Relaxed => 0,
            Level::Mild => 1,
            Level::High => 2,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Relaxed => write!(f, "Relaxed"),
            Level::Mild => write!(f, "Mild"),
            Level::High => write!(f, "High"),
        }
    }
}

/// Classify a smoothed value against the two thresholds.
///
/// Requires `med < high` (checked by `Config::validate`); every value then
/// maps to exactly one level. A strong, steady signal reads as relaxed.
pub fn classify(smoothed: Sample, high: u16, med: u16) -> Level {
    if smoothed >= high {
        Level::Relaxed
    } else if smoothed >= med {
        Level::Mild
    } else {
        Level::High
    }
}

/// One tick of output: what the source produced and what it classified to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReading {
    /// When the tick ran
    pub timestamp: DateTime<Utc>,
    /// The raw sample consumed this tick
    pub sample: Sample,
    /// Floored mean over the smoothing window
    pub smoothed: Sample,
    /// Classification of the smoothed value
    pub level: Level,
}

/// Per-session smoothing and classification state.
pub struct Engine {
    window: SampleWindow,
    history: SampleHistory,
}

impl Engine {
    /// Create an engine with the given smoothing window size.
    pub fn new(window_size: usize) -> Self {
        Self {
            window: SampleWindow::new(window_size),
            history: SampleHistory::new(),
        }
    }

    /// Process one sample against the latest configuration.
    ///
    /// Window size and thresholds are taken from `config` on every call so
    /// live adjustments apply without a restart.
    pub fn process(&mut self, sample: Sample, config: &Config) -> TickReading {
        self.window.set_capacity(config.smooth_window);
        self.window.push(sample);
        self.history.push(sample);

        let smoothed = self.window.smoothed().unwrap_or(sample);
        let level = classify(smoothed, config.thresh_high, config.thresh_med);

        TickReading {
            timestamp: Utc::now(),
            sample,
            smoothed,
            level,
        }
    }

    /// The display history, oldest first.
    pub fn history(&self) -> Vec<Sample> {
        self.history.to_vec()
    }

    /// Clear window and history for a fresh run.
    pub fn reset(&mut self) {
        self.window.clear();
        self.history.clear();
    }
}
