// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

// Reliable file transfer over a serial line
mod frame;
mod link;
mod packet;
mod protocol;
mod receiver;
mod recognizer;
mod sender;
mod serial;
mod stuffing;
mod transfer;

use clap::{Parser, Subcommand};
use serialport::{DataBits, Parity, StopBits};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use link::{Link, LinkConfig, Receiver, Transmitter};
use serial::RealSerialPort;
use transfer::TransferError;

#[derive(Parser)]
#[command(name = "serlink")]
#[command(about = "Stop-and-wait file transfer over an RS-232 link", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Serial port to use (e.g., /dev/ttyUSB0 or COM1)
    #[arg(short, long)]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "9600")]
    baud: u32,

    /// Data bits (5, 6, 7, or 8)
    #[arg(long, default_value = "8", value_name="BITS")]
    data_bits: u8,

    /// Parity (none, odd, or even)
    #[arg(long, default_value = "none")]
    parity: String,

    /// Stop bits (1 or 2)
    #[arg(long, default_value = "1", value_name="BITS")]
    stop_bits: u8,

    /// Retransmissions allowed before an exchange is abandoned
    #[arg(short, long, default_value = "3")]
    retries: u32,

    /// Seconds to wait for each byte before retrying
    #[arg(short, long, default_value = "4", value_name = "SECS")]
    timeout: u64,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a file
    Send {
        /// File to send
        file: PathBuf,
    },
    /// Receive a file
    Receive {
        /// Directory to save the received file
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn parse_data_bits(bits: u8) -> Result<DataBits, String> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        _ => Err(format!("Invalid data bits: {}. Must be 5, 6, 7, or 8", bits)),
    }
}

fn parse_parity(parity: &str) -> Result<Parity, String> {
    match parity.to_lowercase().as_str() {
        "none" => Ok(Parity::None),
        "odd" => Ok(Parity::Odd),
        "even" => Ok(Parity::Even),
        _ => Err(format!("Invalid parity: {}. Must be 'none', 'odd', or 'even'", parity)),
    }
}

fn parse_stop_bits(bits: u8) -> Result<StopBits, String> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        _ => Err(format!("Invalid stop bits: {}. Must be 1 or 2", bits)),
    }
}

fn init_logging(debug: bool) {
    // RUST_LOG wins over --debug
    let default = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let serial_settings = parse_data_bits(cli.data_bits).and_then(|data_bits| {
        Ok((data_bits, parse_parity(&cli.parity)?, parse_stop_bits(cli.stop_bits)?))
    });
    let (data_bits, parity, stop_bits) = match serial_settings {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!("Opening serial port: {}", cli.port);
    info!("Settings: {} baud, {:?}, {:?}, {:?}", cli.baud, data_bits, parity, stop_bits);

    let serial_port = match RealSerialPort::open(&cli.port, cli.baud, data_bits, parity, stop_bits) {
        Ok(port) => port,
        Err(e) => {
            error!("Failed to open serial port: {}", e);
            std::process::exit(1);
        }
    };

    let config = LinkConfig {
        retries: cli.retries,
        timeout: Duration::from_secs(cli.timeout),
    };

    match cli.command {
        Commands::Send { file } => {
            info!("Sending file: {}", file.display());
            if let Err(e) = send(serial_port, config, file) {
                error!("Send failed: {}", e);
                std::process::exit(1);
            }
            info!("File sent successfully!");
        }
        Commands::Receive { output_dir } => {
            info!("Receiving into: {}", output_dir.display());
            match receive(serial_port, config, output_dir) {
                Ok(path) => info!("File received successfully: {}", path.display()),
                Err(e) => {
                    error!("Receive failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn send(serial_port: RealSerialPort, config: LinkConfig, file: PathBuf) -> Result<(), TransferError> {
    if !file.is_file() {
        return Err(TransferError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", file.display()),
        )));
    }

    let mut link = Link::<Transmitter>::open(Box::new(serial_port), config)?;
    transfer::send_file(&mut link, &file)?;
    link.close(true)?;
    Ok(())
}

fn receive(serial_port: RealSerialPort, config: LinkConfig, output_dir: PathBuf) -> Result<PathBuf, TransferError> {
    if !output_dir.is_dir() {
        return Err(TransferError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Output directory not found: {}", output_dir.display()),
        )));
    }

    let mut link = Link::<Receiver>::open(Box::new(serial_port), config)?;
    let path = transfer::receive_file(&mut link, &output_dir)?;
    link.close(true)?;
    Ok(path)
}
