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

//! File transfer on top of an open link
//!
//! The transmitter announces the file with a start packet, streams it in data
//! packets numbered from 1 (wrapping at 256) and closes with an end packet.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use crate::link::{Link, LinkError, Receiver, Transmitter};
use crate::packet::{Packet, PacketError};

/// Largest file chunk carried by one data packet
pub const CHUNK_SIZE: usize = 400;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("link failure: {0}")]
    Link(#[from] LinkError),

    #[error("bad packet: {0}")]
    Packet(#[from] PacketError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid file name: {0}")]
    InvalidFilename(String),

    #[error("expected {expected} packet, got {got}")]
    UnexpectedPacket { expected: &'static str, got: &'static str },

    #[error("data packet {got} out of order, expected {expected}")]
    OutOfOrder { expected: u8, got: u8 },

    #[error("received {received} bytes, sender announced {announced}")]
    SizeMismatch { announced: u64, received: u64 },
}

/// Sends the file at `path`, returning the number of file bytes transferred.
pub fn send_file(link: &mut Link<Transmitter>, path: &Path) -> Result<u64, TransferError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| TransferError::InvalidFilename(path.display().to_string()))?
        .to_string();

    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();

    info!("Sending {} ({} bytes)", filename, file_size);
    link.write(&Packet::Start { filename: filename.clone(), file_size }.encode()?)?;

    let mut buffer = [0u8; CHUNK_SIZE];
    let mut sequence: u8 = 1;
    let mut sent: u64 = 0;

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }

        let packet = Packet::Data { sequence, payload: buffer[..bytes_read].to_vec() };
        link.write(&packet.encode()?)?;
        debug!("Sent data packet {} ({} bytes)", sequence, bytes_read);

        sequence = sequence.wrapping_add(1);
        sent += bytes_read as u64;
    }

    link.write(&Packet::End { filename, file_size }.encode()?)?;
    info!("Sent {} bytes", sent);
    Ok(sent)
}

/// Receives one file into `output_dir` and returns the path it was written to.
pub fn receive_file(link: &mut Link<Receiver>, output_dir: &Path) -> Result<PathBuf, TransferError> {
    let (filename, announced) = match Packet::decode(&link.read()?)? {
        Packet::Start { filename, file_size } => (filename, file_size),
        other => {
            return Err(TransferError::UnexpectedPacket { expected: "start", got: other.kind() });
        }
    };

    let path = output_dir.join(received_name(&filename)?);
    info!("Receiving {} ({} bytes) into {}", filename, announced, path.display());

    let mut file = File::create(&path)?;
    let mut expected: u8 = 1;
    let mut received: u64 = 0;

    loop {
        match Packet::decode(&link.read()?)? {
            Packet::Data { sequence, payload } => {
                if sequence != expected {
                    return Err(TransferError::OutOfOrder { expected, got: sequence });
                }
                file.write_all(&payload)?;
                debug!("Received data packet {} ({} bytes)", sequence, payload.len());

                expected = expected.wrapping_add(1);
                received += payload.len() as u64;
            }
            Packet::End { .. } => break,
            other => {
                return Err(TransferError::UnexpectedPacket { expected: "data or end", got: other.kind() });
            }
        }
    }

    file.flush()?;

    if received != announced {
        return Err(TransferError::SizeMismatch { announced, received });
    }

    info!("Received {} bytes", received);
    Ok(path)
}

/// `notes.txt` becomes `notes-received.txt`.
///
/// Only the final path component of the announced name is used, so a sender
/// cannot write outside the output directory.
fn received_name(announced: &str) -> Result<String, TransferError> {
    let base = Path::new(announced)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| TransferError::InvalidFilename(announced.to_string()))?;

    Ok(match base.split_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-received.{}", stem, ext),
        _ => format!("{}-received", base),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::frame::{Control, Sequence, information, supervisory};
    use crate::link::LinkConfig;
    use crate::protocol::*;
    use crate::serial::{MockSerialPort, script};

    fn config() -> LinkConfig {
        LinkConfig { retries: 0, timeout: Duration::from_millis(10) }
    }

    /// Information frames for `packets`, plus the RR that answers each one.
    fn exchange(packets: &[Packet]) -> (Vec<u8>, Vec<u8>) {
        let mut frames = Vec::new();
        let mut acks = Vec::new();
        let mut seq = Sequence::Zero;

        for packet in packets {
            frames.extend(information(ADDRESS_COMMAND, seq, &packet.encode().unwrap()));
            seq.toggle();
            acks.extend(supervisory(ADDRESS_RESPONSE, Control::Rr(seq)));
        }

        (frames, acks)
    }

    #[test]
    fn test_received_name() {
        assert_eq!(received_name("penguin.gif").unwrap(), "penguin-received.gif");
        assert_eq!(received_name("archive.tar.gz").unwrap(), "archive-received.tar.gz");
        assert_eq!(received_name("README").unwrap(), "README-received");
        assert_eq!(received_name(".profile").unwrap(), ".profile-received");
        assert_eq!(received_name("../../etc/passwd").unwrap(), "passwd-received");
        assert!(received_name("..").is_err());
    }

    #[test]
    fn test_send_file() {
        let test_file = std::env::temp_dir().join("serlink_send_test.bin");
        let content: Vec<u8> = (0..450u32).map(|i| (i % 256) as u8).collect();
        std::fs::write(&test_file, &content).unwrap();

        let packets = vec![
            Packet::Start { filename: "serlink_send_test.bin".to_string(), file_size: 450 },
            Packet::Data { sequence: 1, payload: content[..400].to_vec() },
            Packet::Data { sequence: 2, payload: content[400..].to_vec() },
            Packet::End { filename: "serlink_send_test.bin".to_string(), file_size: 450 },
        ];
        let (frames, acks) = exchange(&packets);

        let mock = MockSerialPort::new(script(&[&acks]), frames);
        let mut link = Link::<Transmitter>::new(Box::new(mock), config());

        assert_eq!(send_file(&mut link, &test_file).unwrap(), 450);
        assert_eq!(link.statistics().packets_sent, 4);

        std::fs::remove_file(&test_file).ok();
    }

    #[test]
    fn test_send_missing_file() {
        let mock = MockSerialPort::new(vec![], vec![]);
        let mut link = Link::<Transmitter>::new(Box::new(mock), config());

        let missing = std::env::temp_dir().join("serlink_does_not_exist.bin");
        assert!(matches!(send_file(&mut link, &missing), Err(TransferError::Io(_))));
    }

    #[test]
    fn test_receive_file() {
        let output_dir = std::env::temp_dir().join("serlink_receive_test");
        std::fs::create_dir_all(&output_dir).unwrap();

        let packets = vec![
            Packet::Start { filename: "notes.txt".to_string(), file_size: 11 },
            Packet::Data { sequence: 1, payload: b"hello ".to_vec() },
            Packet::Data { sequence: 2, payload: b"world".to_vec() },
            Packet::End { filename: "notes.txt".to_string(), file_size: 11 },
        ];
        let (frames, acks) = exchange(&packets);

        let mock = MockSerialPort::new(script(&[&frames]), acks);
        let mut link = Link::<Receiver>::new(Box::new(mock), config());

        let path = receive_file(&mut link, &output_dir).unwrap();
        assert_eq!(path, output_dir.join("notes-received.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
        assert_eq!(link.statistics().packets_read, 4);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_receive_reserved_bytes() {
        let output_dir = std::env::temp_dir().join("serlink_receive_reserved");
        std::fs::create_dir_all(&output_dir).unwrap();

        let content = vec![FLAG, ESCAPE, 0x00, FLAG, FLAG, ESCAPE];
        let packets = vec![
            Packet::Start { filename: "raw.bin".to_string(), file_size: 6 },
            Packet::Data { sequence: 1, payload: content.clone() },
            Packet::End { filename: "raw.bin".to_string(), file_size: 6 },
        ];
        let (frames, acks) = exchange(&packets);

        let mock = MockSerialPort::new(script(&[&frames]), acks);
        let mut link = Link::<Receiver>::new(Box::new(mock), config());

        let path = receive_file(&mut link, &output_dir).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), content);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_receive_out_of_order() {
        let output_dir = std::env::temp_dir().join("serlink_receive_order");
        std::fs::create_dir_all(&output_dir).unwrap();

        let packets = vec![
            Packet::Start { filename: "gap.txt".to_string(), file_size: 4 },
            Packet::Data { sequence: 2, payload: b"oops".to_vec() },
        ];
        let (frames, acks) = exchange(&packets);

        let mock = MockSerialPort::new(script(&[&frames]), acks);
        let mut link = Link::<Receiver>::new(Box::new(mock), config());

        match receive_file(&mut link, &output_dir) {
            Err(TransferError::OutOfOrder { expected: 1, got: 2 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        std::fs::remove_file(output_dir.join("gap-received.txt")).ok();
    }

    #[test]
    fn test_receive_requires_start() {
        let packets = vec![Packet::Data { sequence: 1, payload: b"early".to_vec() }];
        let (frames, acks) = exchange(&packets);

        let mock = MockSerialPort::new(script(&[&frames]), acks);
        let mut link = Link::<Receiver>::new(Box::new(mock), config());

        match receive_file(&mut link, &std::env::temp_dir()) {
            Err(TransferError::UnexpectedPacket { expected: "start", got: "data" }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_receive_size_mismatch() {
        let output_dir = std::env::temp_dir().join("serlink_receive_short");
        std::fs::create_dir_all(&output_dir).unwrap();

        let packets = vec![
            Packet::Start { filename: "short.txt".to_string(), file_size: 10 },
            Packet::Data { sequence: 1, payload: b"abc".to_vec() },
            Packet::End { filename: "short.txt".to_string(), file_size: 10 },
        ];
        let (frames, acks) = exchange(&packets);

        let mock = MockSerialPort::new(script(&[&frames]), acks);
        let mut link = Link::<Receiver>::new(Box::new(mock), config());

        assert!(matches!(
            receive_file(&mut link, &output_dir),
            Err(TransferError::SizeMismatch { announced: 10, received: 3 })
        ));

        std::fs::remove_file(output_dir.join("short-received.txt")).ok();
    }
}
