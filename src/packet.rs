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

//! Application packets carried as link payloads
//!
//! ```text
//! start/end: [type][FILENAME][len][name...][SIZE][8][size as u64 big-endian]
//! data:      [type][seq][len_hi][len_lo][bytes...]
//! ```

use thiserror::Error;

/// Packet type - a chunk of file contents
pub const DATA: u8 = 1;

/// Packet type - announces the file about to be sent
pub const START: u8 = 2;

/// Packet type - closes the file, repeats the start fields
pub const END: u8 = 3;

/// TLV field - file size
pub const FIELD_SIZE: u8 = 0;

/// TLV field - file name
pub const FIELD_FILENAME: u8 = 1;

const FILE_SIZE_LEN: usize = 8;
const DATA_HEADER_LEN: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("empty packet")]
    Empty,

    #[error("unknown packet type: 0x{0:02X}")]
    UnknownType(u8),

    #[error("unknown field type: 0x{0:02X}")]
    UnknownField(u8),

    #[error("packet truncated: need {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error("file size field is {0} bytes, expected 8")]
    BadSizeLength(usize),

    #[error("file name is not valid UTF-8")]
    InvalidFilename,

    #[error("file name too long: {0} bytes")]
    FilenameTooLong(usize),

    #[error("data payload too long: {0} bytes")]
    PayloadTooLong(usize),

    #[error("data length field says {declared} bytes, packet carries {available}")]
    LengthMismatch { declared: usize, available: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Start { filename: String, file_size: u64 },
    Data { sequence: u8, payload: Vec<u8> },
    End { filename: String, file_size: u64 },
}

impl Packet {
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Start { .. } => "start",
            Packet::Data { .. } => "data",
            Packet::End { .. } => "end",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        match self {
            Packet::Start { filename, file_size } => encode_control(START, filename, *file_size),
            Packet::End { filename, file_size } => encode_control(END, filename, *file_size),
            Packet::Data { sequence, payload } => {
                let len = u16::try_from(payload.len())
                    .map_err(|_| PacketError::PayloadTooLong(payload.len()))?;

                let mut out = Vec::with_capacity(DATA_HEADER_LEN + payload.len());
                out.push(DATA);
                out.push(*sequence);
                out.extend_from_slice(&len.to_be_bytes());
                out.extend_from_slice(payload);
                Ok(out)
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Packet, PacketError> {
        match bytes.first() {
            None => Err(PacketError::Empty),
            Some(&DATA) => decode_data(bytes),
            Some(&START) => {
                let (filename, file_size) = decode_control(bytes)?;
                Ok(Packet::Start { filename, file_size })
            }
            Some(&END) => {
                let (filename, file_size) = decode_control(bytes)?;
                Ok(Packet::End { filename, file_size })
            }
            Some(&other) => Err(PacketError::UnknownType(other)),
        }
    }
}

fn encode_control(kind: u8, filename: &str, file_size: u64) -> Result<Vec<u8>, PacketError> {
    let name = filename.as_bytes();
    let name_len = u8::try_from(name.len()).map_err(|_| PacketError::FilenameTooLong(name.len()))?;

    let mut out = Vec::with_capacity(5 + name.len() + FILE_SIZE_LEN);
    out.extend_from_slice(&[kind, FIELD_FILENAME, name_len]);
    out.extend_from_slice(name);
    out.extend_from_slice(&[FIELD_SIZE, FILE_SIZE_LEN as u8]);
    out.extend_from_slice(&file_size.to_be_bytes());
    Ok(out)
}

fn decode_control(bytes: &[u8]) -> Result<(String, u64), PacketError> {
    let mut filename = None;
    let mut file_size = None;
    let mut pos = 1;

    while pos < bytes.len() {
        if pos + 2 > bytes.len() {
            return Err(PacketError::Truncated { needed: pos + 2, available: bytes.len() });
        }

        let field = bytes[pos];
        let len = bytes[pos + 1] as usize;
        let start = pos + 2;
        let value = bytes.get(start..start + len).ok_or(PacketError::Truncated {
            needed: start + len,
            available: bytes.len(),
        })?;

        match field {
            FIELD_FILENAME => {
                let name = std::str::from_utf8(value).map_err(|_| PacketError::InvalidFilename)?;
                filename = Some(name.to_string());
            }
            FIELD_SIZE => {
                let raw: [u8; FILE_SIZE_LEN] =
                    value.try_into().map_err(|_| PacketError::BadSizeLength(len))?;
                file_size = Some(u64::from_be_bytes(raw));
            }
            other => return Err(PacketError::UnknownField(other)),
        }

        pos = start + len;
    }

    Ok((
        filename.ok_or(PacketError::MissingField("file name"))?,
        file_size.ok_or(PacketError::MissingField("file size"))?,
    ))
}

fn decode_data(bytes: &[u8]) -> Result<Packet, PacketError> {
    if bytes.len() < DATA_HEADER_LEN {
        return Err(PacketError::Truncated { needed: DATA_HEADER_LEN, available: bytes.len() });
    }

    let declared = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
    let payload = &bytes[DATA_HEADER_LEN..];
    if declared != payload.len() {
        return Err(PacketError::LengthMismatch { declared, available: payload.len() });
    }

    Ok(Packet::Data { sequence: bytes[1], payload: payload.to_vec() })
}

// ============================================================================
// Tests
// ============================================================================
