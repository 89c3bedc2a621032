//! Core signal pipeline for the NeuroFocus Agent.
//!
//! This module contains:
//! - Signal sources (demo generator and device-backed)
//! - Sample windowing for smoothing and display history
//! - The engine that smooths and classifies each tick

pub mod engine;
pub mod source;
pub mod window;

// Re-export commonly used types
pub use engine::{classify, Engine, Level, Sample, TickReading};
pub use source::{DemoSource, DeviceSource, SignalSource};
pub use window::{SampleHistory, SampleWindow, HISTORY_CAPACITY};
