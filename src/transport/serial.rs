//! Serial transport for the target UART (via USB-serial adapter or capture board)
//!
//! The underlying port is opened with a short poll timeout. `read_byte` keeps
//! polling until a byte arrives, so it blocks like the target's `getch()`
//! unless a read timeout is configured.

use super::ByteTransport;
use crate::config::{DeviceConfig, SerialConfig};
use crate::constants::SERIAL_POLL_TIMEOUT_MS;
use crate::error::{Result, SimpleSerialError};
use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Size of the internal receive buffer
const RX_BUFFER_SIZE: usize = 256;

/// Serial transport for UART communication
///
/// # Example
///
/// ```ignore
/// let port = SerialTransport::detect(&DeviceConfig::chipwhisperer())?;
/// let transport = SerialTransport::open(&port, 38_400, None)?;
/// let mut session = Session::new(transport);
/// ```
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    port_name: String,
    read_timeout: Option<Duration>,
    rx_buf: [u8; RX_BUFFER_SIZE],
    rx_pos: usize,
    rx_len: usize,
}

impl SerialTransport {
    /// Detect a USB device matching the given configuration
    ///
    /// Searches available serial ports for a device matching the VID/PID
    /// specified in the config. Falls back to name pattern matching if
    /// VID/PID info is not available.
    ///
    /// # Errors
    ///
    /// - `NoDeviceFound` - No matching device found
    /// - `MultipleDevicesFound` - More than one matching device found
    pub fn detect(config: &DeviceConfig) -> Result<String> {
        let ports = serialport::available_ports().unwrap_or_default();

        let matching: Vec<_> = ports.iter().filter(|p| matches_device(p, config)).collect();

        match matching.len() {
            0 => Err(SimpleSerialError::NoDeviceFound),
            1 => Ok(matching[0].port_name.clone()),
            n => Err(SimpleSerialError::MultipleDevicesFound { count: n }),
        }
    }

    /// Open a serial port
    ///
    /// `read_timeout` of `None` makes `read_byte` block until a byte arrives.
    pub fn open(port_name: &str, baud_rate: u32, read_timeout: Option<Duration>) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(SERIAL_POLL_TIMEOUT_MS))
            .open()
            .map_err(|e| SimpleSerialError::SerialOpen {
                port: port_name.to_string(),
                source: io::Error::other(e.to_string()),
            })?;

        debug!("Opened {} @ {} baud", port_name, baud_rate);

        Ok(Self {
            port,
            port_name: port_name.to_string(),
            read_timeout,
            rx_buf: [0; RX_BUFFER_SIZE],
            rx_pos: 0,
            rx_len: 0,
        })
    }

    /// Open the port described by a serial config section
    ///
    /// An empty port name triggers auto-detection with `device`.
    pub fn from_config(config: &SerialConfig, device: &DeviceConfig) -> Result<Self> {
        let port_name = if config.port.is_empty() {
            Self::detect(device)?
        } else {
            config.port.clone()
        };
        Self::open(&port_name, config.baud_rate, config.read_timeout())
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Drop everything buffered on both sides of the port
    pub fn clear(&mut self) -> Result<()> {
        self.rx_pos = 0;
        self.rx_len = 0;
        self.port
            .clear(serialport::ClearBuffer::All)
            .map_err(|e| SimpleSerialError::Transport(io::Error::other(e.to_string())))
    }

    fn fill(&mut self) -> io::Result<()> {
        let deadline = self.read_timeout.map(|t| Instant::now() + t);

        loop {
            match self.port.read(&mut self.rx_buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "serial port closed",
                    ))
                }
                Ok(n) => {
                    trace!("rx {} bytes", n);
                    self.rx_pos = 0;
                    self.rx_len = n;
                    return Ok(());
                }
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "no data within read timeout",
                        ));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Check if a serial port matches the device configuration
fn matches_device(port: &SerialPortInfo, config: &DeviceConfig) -> bool {
    match &port.port_type {
        SerialPortType::UsbPort(usb) => usb.vid == config.vid && config.pid_list.contains(&usb.pid),
        _ => {
            // Fallback: name pattern matching if available
            config
                .name_hint
                .current()
                .map(|hint| port.port_name.contains(hint))
                .unwrap_or(false)
        }
    }
}

impl ByteTransport for SerialTransport {
    fn read_byte(&mut self) -> io::Result<u8> {
        if self.rx_pos == self.rx_len {
            self.fill()?;
        }
        let byte = self.rx_buf[self.rx_pos];
        self.rx_pos += 1;
        Ok(byte)
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.port.write_all(&[byte])
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformNameHint;
    use serialport::UsbPortInfo;

    fn usb_port(vid: u16, pid: u16) -> SerialPortInfo {
        SerialPortInfo {
            port_name: "/dev/ttyACM0".into(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid,
                pid,
                serial_number: None,
                manufacturer: None,
                product: None,
            }),
        }
    }

    #[test]
    fn test_matches_vid_pid() {
        let config = DeviceConfig::chipwhisperer();
        assert!(matches_device(&usb_port(0x2B3E, 0xACE2), &config));
        assert!(!matches_device(&usb_port(0x2B3E, 0x0001), &config));
        assert!(!matches_device(&usb_port(0x16C0, 0xACE2), &config));
    }

    #[test]
    fn test_name_hint_fallback() {
        let config = DeviceConfig {
            name_hint: PlatformNameHint {
                windows: Some("COM".into()),
                macos: Some("usbmodem".into()),
                linux: Some("ttyACM".into()),
            },
            ..DeviceConfig::chipwhisperer()
        };
        let port = SerialPortInfo {
            port_name: if cfg!(windows) {
                "COM7".into()
            } else if cfg!(target_os = "macos") {
                "/dev/cu.usbmodem1".into()
            } else {
                "/dev/ttyACM3".into()
            },
            port_type: SerialPortType::Unknown,
        };
        assert!(matches_device(&port, &config));
    }

    #[test]
    fn test_open_missing_port_fails() {
        let result = SerialTransport::open("/dev/does-not-exist-ss", 38_400, None);
        assert!(matches!(
            result,
            Err(SimpleSerialError::SerialOpen { .. })
        ));
    }
}
