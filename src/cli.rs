//! Command-line interface definition using clap
//!
//! Provides structured argument parsing with automatic help generation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// =============================================================================
// CLI Definition
// =============================================================================

/// Host tool for SimpleSerial targets
#[derive(Parser, Debug)]
#[command(name = "ss-host")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ./simpleserial.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Serial port to use (overrides config)
    #[arg(long, value_name = "PORT", global = true)]
    pub port: Option<String>,

    /// Baud rate (overrides config)
    #[arg(long, value_name = "BAUD", global = true)]
    pub baud: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available serial ports
    Ports,

    /// Print the wire frame for a packet (no port needed)
    Encode {
        /// Command byte: ASCII character or 0x-prefixed hex
        #[arg(value_parser = parse_command)]
        cmd: u8,
        /// Payload as hex
        hex: Option<String>,
    },

    /// Send one packet
    Send {
        /// Command byte: ASCII character or 0x-prefixed hex
        #[arg(value_parser = parse_command)]
        cmd: u8,
        /// Payload as hex
        hex: Option<String>,
        /// Wait for the target to acknowledge `cmd`
        #[arg(long)]
        wait_ack: bool,
    },

    /// Send an ACK for a command
    Ack {
        #[arg(value_parser = parse_command)]
        cmd: u8,
    },

    /// Send the reset sequence
    Reset {
        /// Also wait for the target to echo the reset sequence
        #[arg(long)]
        wait: bool,
    },

    /// Print decoded packets until interrupted
    Listen {
        /// Stop after this many packets
        #[arg(long, value_name = "N")]
        count: Option<usize>,
    },

    /// Receive a chunked transfer and print it as hex
    Receive {
        /// Send this command first to start the transfer
        #[arg(long, value_parser = parse_command, value_name = "CMD")]
        start: Option<u8>,
    },
}

/// Parse a command byte given as `d`, `0x64` or `100`
pub fn parse_command(s: &str) -> Result<u8, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u8::from_str_radix(hex, 16).map_err(|e| format!("invalid hex byte '{}': {}", s, e));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && !c.is_ascii_digit() => Ok(c as u8),
        _ => s
            .parse::<u8>()
            .map_err(|_| format!("'{}' is neither a character nor a byte value", s)),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_forms() {
        assert_eq!(parse_command("d"), Ok(b'd'));
        assert_eq!(parse_command("0x64"), Ok(0x64));
        assert_eq!(parse_command("0XFF"), Ok(0xFF));
        assert_eq!(parse_command("100"), Ok(100));
        assert_eq!(parse_command("7"), Ok(7));
        assert!(parse_command("0x100").is_err());
        assert!(parse_command("dd").is_err());
        assert!(parse_command("é").is_err());
    }

    #[test]
    fn test_cli_parse_send() {
        let cli = Cli::parse_from(["ss-host", "--port", "COM3", "send", "p", "00ff", "--wait-ack"]);
        assert_eq!(cli.port, Some("COM3".to_string()));
        match cli.command {
            Command::Send { cmd, hex, wait_ack } => {
                assert_eq!(cmd, b'p');
                assert_eq!(hex.as_deref(), Some("00ff"));
                assert!(wait_ack);
            }
            _ => panic!("Expected Send command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["ss-host", "listen", "-v", "--baud", "115200"]);
        assert!(cli.verbose);
        assert_eq!(cli.baud, Some(115_200));
        assert!(matches!(cli.command, Command::Listen { count: None }));
    }

    #[test]
    fn test_cli_parse_receive_start() {
        let cli = Cli::parse_from(["ss-host", "receive", "--start", "0x73"]);
        assert!(matches!(
            cli.command,
            Command::Receive { start: Some(0x73) }
        ));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["ss-host"]).is_err());
    }
}
