//! Configuration management
//!
//! Config file defaults to `simpleserial.toml` in the working directory and
//! can be overridden with `--config`. Every section is optional; missing
//! fields take their defaults.

use crate::constants::{
    CHIPWHISPERER_PIDS, CHIPWHISPERER_VID, DEFAULT_BAUD_RATE, DEFAULT_CHUNK_SIZE,
    DEFAULT_DATA_COMMAND, DEFAULT_END_COMMAND,
};
use crate::error::{Result, SimpleSerialError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "simpleserial.toml";

// =============================================================================
// Device Configuration
// =============================================================================

/// USB device detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Display name for the device
    pub name: String,
    /// USB Vendor ID
    pub vid: u16,
    /// List of accepted USB Product IDs
    pub pid_list: Vec<u16>,
    /// Platform-specific port name hints (optional)
    #[serde(default)]
    pub name_hint: PlatformNameHint,
}

impl DeviceConfig {
    /// ChipWhisperer capture boards (target UART bridged over USB)
    pub fn chipwhisperer() -> Self {
        Self {
            name: "ChipWhisperer".to_string(),
            vid: CHIPWHISPERER_VID,
            pid_list: CHIPWHISPERER_PIDS.to_vec(),
            name_hint: PlatformNameHint::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::chipwhisperer()
    }
}

/// Platform-specific port name hints for device detection fallback
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformNameHint {
    /// Windows port name pattern (e.g., "COM")
    pub windows: Option<String>,
    /// macOS port name pattern (e.g., "usbmodem")
    pub macos: Option<String>,
    /// Linux port name pattern (e.g., "ttyACM")
    pub linux: Option<String>,
}

impl PlatformNameHint {
    /// Returns the hint for the current platform
    pub fn current(&self) -> Option<&str> {
        #[cfg(windows)]
        {
            self.windows.as_deref()
        }
        #[cfg(target_os = "macos")]
        {
            self.macos.as_deref()
        }
        #[cfg(target_os = "linux")]
        {
            self.linux.as_deref()
        }
        #[cfg(not(any(windows, target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub device: DeviceConfig,
    pub protocol: ProtocolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port name (empty = auto-detect using `[device]`)
    pub port: String,
    /// UART baud rate
    pub baud_rate: u32,
    /// Give up on a read after this many milliseconds (0 = block forever)
    pub read_timeout_ms: u64,
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Abort a receive after this many bytes without a terminator
    /// (unset = unbounded, like the target firmware)
    pub max_frame_len: Option<usize>,
    /// Payload bytes per packet in multi-packet transfers
    pub chunk_size: usize,
    /// Command byte of data chunks
    pub data_command: u8,
    /// ACK command that ends a multi-packet transfer
    pub end_command: u8,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_frame_len: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            data_command: DEFAULT_DATA_COMMAND,
            end_command: DEFAULT_END_COMMAND,
        }
    }
}

impl ProtocolConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SimpleSerialError::ConfigValidation {
                field: "chunk_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.chunk_size > u16::MAX as usize {
            return Err(SimpleSerialError::ConfigValidation {
                field: "chunk_size",
                reason: format!("must not exceed {}", u16::MAX),
            });
        }
        if let Some(limit) = self.max_frame_len {
            // Smallest frame is [command, delimiter]
            if limit < 2 {
                return Err(SimpleSerialError::ConfigValidation {
                    field: "max_frame_len",
                    reason: format!("{} cannot hold a bare command frame", limit),
                });
            }
        }
        if self.data_command == self.end_command {
            return Err(SimpleSerialError::ConfigValidation {
                field: "end_command",
                reason: "must differ from data_command".into(),
            });
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(SimpleSerialError::ConfigValidation {
                field: "baud_rate",
                reason: "must be non-zero".into(),
            });
        }
        self.protocol.validate()
    }
}

/// Default config file path
pub fn default_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Parse config from a TOML string
pub fn parse(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).map_err(|e| SimpleSerialError::ConfigValidation {
        field: "config",
        reason: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Load config from file, falling back to defaults if it does not exist
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        warn!("Config {:?} not found, using defaults", path);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).map_err(|e| SimpleSerialError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse(&content)
}

/// Save config to file
pub fn save(config: &Config, path: &Path) -> Result<()> {
    let content =
        toml::to_string_pretty(config).map_err(|e| SimpleSerialError::ConfigValidation {
            field: "config",
            reason: e.to_string(),
        })?;
    fs::write(path, content).map_err(|e| SimpleSerialError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.serial.port, "");
        assert_eq!(config.serial.baud_rate, 38_400);
        assert_eq!(config.serial.read_timeout(), None);
        assert_eq!(config.device.vid, 0x2B3E);
        assert_eq!(config.protocol.max_frame_len, None);
        assert_eq!(config.protocol.chunk_size, 190);
        assert_eq!(config.protocol.data_command, b'd');
        assert_eq!(config.protocol.end_command, b'e');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_empty_file() {
        let config = parse("").unwrap();
        assert_eq!(config.protocol.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.serial.baud_rate, DEFAULT_BAUD_RATE);
    }

    #[test]
    fn test_config_partial_sections() {
        let config = parse(
            r#"
[serial]
port = "/dev/ttyUSB0"
read_timeout_ms = 500

[protocol]
max_frame_len = 1024
"#,
        )
        .unwrap();

        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.read_timeout(), Some(Duration::from_millis(500)));
        assert_eq!(config.serial.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.protocol.max_frame_len, Some(1024));
        assert_eq!(config.protocol.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_config_custom_device() {
        let config = parse(
            r#"
[device]
name = "FTDI"
vid = 0x0403
pid_list = [0x6001, 0x6015]

[device.name_hint]
linux = "ttyUSB"
"#,
        )
        .unwrap();

        assert_eq!(config.device.vid, 0x0403);
        assert_eq!(config.device.pid_list, vec![0x6001, 0x6015]);
        assert_eq!(config.device.name_hint.linux.as_deref(), Some("ttyUSB"));
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let err = parse("[protocol]\nchunk_size = 0\n").unwrap_err();
        assert!(matches!(
            err,
            SimpleSerialError::ConfigValidation {
                field: "chunk_size",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_tiny_frame_limit() {
        let err = parse("[protocol]\nmax_frame_len = 1\n").unwrap_err();
        assert!(matches!(
            err,
            SimpleSerialError::ConfigValidation {
                field: "max_frame_len",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_same_data_and_end_command() {
        let err = parse("[protocol]\ndata_command = 100\nend_command = 100\n").unwrap_err();
        assert!(matches!(
            err,
            SimpleSerialError::ConfigValidation {
                field: "end_command",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_toml_reports_validation_error() {
        let err = parse("[serial\nport = 3").unwrap_err();
        assert!(matches!(
            err,
            SimpleSerialError::ConfigValidation { field: "config", .. }
        ));
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let mut config = Config::default();
        config.serial.port = "COM4".into();
        config.protocol.max_frame_len = Some(4096);
        config.protocol.chunk_size = 64;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let restored = parse(&toml_str).unwrap();

        assert_eq!(restored.serial.port, "COM4");
        assert_eq!(restored.protocol.max_frame_len, Some(4096));
        assert_eq!(restored.protocol.chunk_size, 64);
        assert_eq!(restored.device.pid_list, config.device.pid_list);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("simpleserial-missing-config-test.toml");
        let _ = fs::remove_file(&path);
        let config = load(&path).unwrap();
        assert_eq!(config.protocol.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!(
            "simpleserial-config-test-{}.toml",
            std::process::id()
        ));
        let mut config = Config::default();
        config.serial.baud_rate = 115_200;

        save(&config, &path).unwrap();
        let loaded = load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.serial.baud_rate, 115_200);
    }
}
