//! ss-host - drive a SimpleSerial target from the command line
//!
//! Usage:
//!   ss-host ports                      List serial ports
//!   ss-host encode <CMD> [HEX]         Print a wire frame
//!   ss-host send <CMD> [HEX]           Send a packet
//!   ss-host ack <CMD>                  Send an ACK
//!   ss-host reset [--wait]             Send the reset sequence
//!   ss-host listen [--count N]         Print incoming packets
//!   ss-host receive [--start CMD]      Receive a chunked transfer

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use simpleserial::config::{self, Config};
use simpleserial::{logging, packet, Packet, SerialTransport, Session};
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(config::default_path);
    let mut cfg = config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(port) = &cli.port {
        cfg.serial.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        cfg.serial.baud_rate = baud;
    }
    cfg.validate()?;

    match cli.command {
        Command::Ports => list_ports(),
        Command::Encode { cmd, hex } => {
            let payload = parse_payload(hex.as_deref())?;
            println!("{}", hex::encode(packet::encode_to_vec(cmd, &payload)));
            Ok(())
        }
        Command::Send { cmd, hex, wait_ack } => {
            let payload = parse_payload(hex.as_deref())?;
            let mut session = open_session(&cfg)?;
            session.send_packet(cmd, &payload)?;
            if wait_ack {
                session.wait_ack(cmd)?;
                println!("ACK {}", display_command(cmd));
            }
            Ok(())
        }
        Command::Ack { cmd } => {
            open_session(&cfg)?.send_ack(cmd)?;
            Ok(())
        }
        Command::Reset { wait } => {
            let mut session = open_session(&cfg)?;
            session.send_reset_sequence()?;
            if wait {
                let skipped = session.wait_for_reset()?;
                info!("Target resynchronized after {} bytes", skipped.len());
            }
            Ok(())
        }
        Command::Listen { count } => listen(&cfg, count),
        Command::Receive { start } => {
            let mut session = open_session(&cfg)?;
            if let Some(cmd) = start {
                session.send_packet(cmd, &[])?;
            }
            let data = session.receive_transfer()?;
            println!("{}", hex::encode(&data));
            Ok(())
        }
    }
}

fn open_session(cfg: &Config) -> Result<Session<SerialTransport>> {
    let transport = SerialTransport::from_config(&cfg.serial, &cfg.device)?;
    info!(
        "Connected to {} @ {} baud",
        transport.port_name(),
        cfg.serial.baud_rate
    );
    Ok(Session::with_config(transport, cfg.protocol.clone())?)
}

fn parse_payload(hex: Option<&str>) -> Result<Vec<u8>> {
    let Some(text) = hex else {
        return Ok(Vec::new());
    };
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&cleaned)
        .map_err(simpleserial::SimpleSerialError::from)
        .with_context(|| format!("payload '{}'", text))
}

fn display_command(cmd: u8) -> String {
    if cmd.is_ascii_graphic() {
        format!("'{}'", cmd as char)
    } else {
        format!("0x{:02X}", cmd)
    }
}

fn list_ports() -> Result<()> {
    let ports = serialport::available_ports().context("enumerating serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        match port.port_type {
            serialport::SerialPortType::UsbPort(usb) => println!(
                "{}  USB {:04X}:{:04X} {}",
                port.port_name,
                usb.vid,
                usb.pid,
                usb.product.unwrap_or_default()
            ),
            _ => println!("{}", port.port_name),
        }
    }
    Ok(())
}

fn listen(cfg: &Config, count: Option<usize>) -> Result<()> {
    let mut session = open_session(cfg)?;
    let mut seen = 0;

    while count.map_or(true, |n| seen < n) {
        match session.read_packet() {
            Ok(Packet { command, payload }) => {
                println!(
                    "{} [{}] {}",
                    display_command(command),
                    payload.len(),
                    hex::encode(&payload)
                );
                seen += 1;
            }
            // A dropped frame is already logged; keep listening
            Err(e) if is_frame_error(&e) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn is_frame_error(e: &simpleserial::SimpleSerialError) -> bool {
    use simpleserial::SimpleSerialError::*;
    matches!(
        e,
        InvalidEncoding(_) | EmptyFrame | EmptyPayload | CrcMismatch { .. } | FrameTooLarge { .. }
    )
}
