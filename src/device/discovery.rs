//! Serial port discovery for the pulse device.
//!
//! The device enumerates as a USB serial bridge; discovery picks the first
//! port whose USB strings mention a known controller or bridge chip.

use serialport::SerialPortType;

/// USB description substrings that identify the pulse hardware.
///
/// Matching is case-sensitive; these are the strings the bridges actually
/// report.
pub const KNOWN_DEVICE_SIGNATURES: &[&str] = &[
    "Arduino",
    "CH340",
    "CP210",
    "FTDI",
    "USB Serial",
    "USB-SERIAL",
];

/// One enumerated serial port.
#[derive(Debug, Clone)]
pub struct PortEntry {
    /// OS port name, e.g. `/dev/ttyUSB0` or `COM7`
    pub name: String,
    /// Human-readable description assembled from USB metadata
    pub description: String,
    /// Whether the description matches a known hardware signature
    pub matches: bool,
}

/// Enumerate every visible serial port.
///
/// Enumeration failure is treated as an empty bus; an absence of ports is
/// a valid outcome, not an error.
pub fn list_ports() -> Vec<PortEntry> {
    let ports = serialport::available_ports().unwrap_or_default();

    ports
        .into_iter()
        .map(|p| {
            let description = describe_port_type(&p.port_type);
            let matches = matches!(p.port_type, SerialPortType::UsbPort(_))
                && matches_signature(&description);
            PortEntry {
                name: p.port_name,
                description,
                matches,
            }
        })
        .collect()
}

/// Find the port the pulse device is attached to.
///
/// Returns the first signature match in enumeration order, or `None` when
/// nothing matches.
pub fn find_device_port() -> Option<String> {
    list_ports().into_iter().find(|p| p.matches).map(|p| p.name)
}

/// Check a description against the known hardware signatures.
fn matches_signature(description: &str) -> bool {
    KNOWN_DEVICE_SIGNATURES
        .iter()
        .any(|sig| description.contains(sig))
}

/// Assemble a display string for a port's type metadata.
fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(info) => {
            describe_usb_strings(info.manufacturer.as_deref(), info.product.as_deref())
        }
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => String::new(),
    }
}

/// Join the USB descriptor strings a bridge reports.
fn describe_usb_strings(manufacturer: Option<&str>, product: Option<&str>) -> String {
    let parts: Vec<&str> = [manufacturer, product].into_iter().flatten().collect();
    if parts.is_empty() {
        "USB serial device".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_matches_known_bridges() {
        assert!(matches_signature("Arduino Uno"));
        assert!(matches_signature("USB2.0-Serial CH340"));
        assert!(matches_signature("Silicon Labs CP210x UART Bridge"));
        assert!(matches_signature("FTDI FT232R"));
    }

    #[test]
    fn test_signature_match_is_case_sensitive() {
        assert!(!matches_signature("arduino uno"));
        assert!(!matches_signature("ch340 converter"));
    }

    #[test]
    fn test_signature_rejects_unrelated_descriptions() {
        assert!(!matches_signature("Bluetooth"));
        assert!(!matches_signature(""));
        assert!(!matches_signature("Internal modem"));
    }

    #[test]
    fn test_describe_usb_strings_joins_what_is_present() {
        assert_eq!(
            describe_usb_strings(Some("Arduino LLC"), Some("Arduino Uno")),
            "Arduino LLC Arduino Uno"
        );
        assert_eq!(describe_usb_strings(None, Some("FT232R")), "FT232R");
        assert_eq!(describe_usb_strings(Some("wch.cn"), None), "wch.cn");
    }

    #[test]
    fn test_describe_usb_strings_without_metadata_never_matches() {
        // The placeholder must not accidentally hit a hardware signature.
        let bare = describe_usb_strings(None, None);
        assert_eq!(bare, "USB serial device");
        assert!(!matches_signature(&bare));
    }

    #[test]
    fn test_describe_non_usb_ports() {
        assert_eq!(
            describe_port_type(&SerialPortType::BluetoothPort),
            "Bluetooth"
        );
        assert!(describe_port_type(&SerialPortType::Unknown).is_empty());
    }
}
