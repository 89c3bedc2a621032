//! Wire protocol for the pulse device.
//!
//! The device speaks a line protocol over serial: it emits
//! `PULSE_RAW:<0-1023>` readings and accepts `SET:<0|1|2>` level commands.
//! Decoding is lossy on purpose: anything that does not parse is treated
//! as line noise and dropped without touching connection state.

use crate::core::{Level, Sample};

/// Serial baud rate for the pulse device.
pub const BAUD_RATE: u32 = 115_200;

/// Highest raw ADC reading the device can produce.
pub const RAW_MAX: u16 = 1023;

/// Highest scaled sample value.
pub const SAMPLE_MAX: u16 = 100;

/// Prefix of device-to-host pulse readings.
pub const PULSE_PREFIX: &str = "PULSE_RAW:";

/// Prefix of host-to-device level commands.
pub const SET_PREFIX: &str = "SET:";

/// Map a raw ADC reading onto the 0-100 sample scale (floored).
pub fn scale_raw(raw: u16) -> Sample {
    ((u32::from(raw) * u32::from(SAMPLE_MAX)) / u32::from(RAW_MAX)) as Sample
}

/// Decode one line from the device into a scaled sample.
///
/// Returns `None` for anything other than a well-formed, in-range
/// `PULSE_RAW:` reading.
pub fn decode_pulse_line(line: &str) -> Option<Sample> {
    let rest = line.trim().strip_prefix(PULSE_PREFIX)?;
    let raw: u16 = rest.trim().parse().ok()?;
    if raw > RAW_MAX {
        return None;
    }
    Some(scale_raw(raw))
}

/// Format the feedback command for a classification.
pub fn set_command(level: Level) -> String {
    format!("{SET_PREFIX}{}", level.ordinal())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_midpoint() {
        assert_eq!(scale_raw(512), 50);
    }

    #[test]
    fn test_scale_endpoints() {
        assert_eq!(scale_raw(0), 0);
        assert_eq!(scale_raw(RAW_MAX), SAMPLE_MAX);
    }

    #[test]
    fn test_scale_never_exceeds_sample_max() {
        for raw in 0..=RAW_MAX {
            assert!(scale_raw(raw) <= SAMPLE_MAX);
        }
    }

    #[test]
    fn test_decode_valid_lines() {
        assert_eq!(decode_pulse_line("PULSE_RAW:512"), Some(50));
        assert_eq!(decode_pulse_line("PULSE_RAW:0"), Some(0));
        assert_eq!(decode_pulse_line("PULSE_RAW:1023"), Some(100));
    }

    #[test]
    fn test_decode_tolerates_surrounding_whitespace() {
        assert_eq!(decode_pulse_line("  PULSE_RAW:512\r"), Some(50));
        assert_eq!(decode_pulse_line("PULSE_RAW: 512"), Some(50));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode_pulse_line("garbage"), None);
        assert_eq!(decode_pulse_line(""), None);
        assert_eq!(decode_pulse_line("PULSE_RAW:"), None);
        assert_eq!(decode_pulse_line("PULSE_RAW:abc"), None);
        assert_eq!(decode_pulse_line("PULSE_RAW:-5"), None);
        assert_eq!(decode_pulse_line("pulse_raw:512"), None);
    }

    #[test]
    fn test_decode_rejects_out_of_range_raw() {
        assert_eq!(decode_pulse_line("PULSE_RAW:1024"), None);
        assert_eq!(decode_pulse_line("PULSE_RAW:65536"), None);
    }

    #[test]
    fn test_set_command_ordinals() {
        assert_eq!(set_command(Level::Relaxed), "SET:0");
        assert_eq!(set_command(Level::Mild), "SET:1");
        assert_eq!(set_command(Level::High), "SET:2");
    }
}
