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

//! Link layer protocol constants

/// Frame delimiter, never appears inside a frame body
pub const FLAG: u8 = 0x7E;

/// Escape byte - the next byte is a reserved value XORed with `STUFF_MASK`
pub const ESCAPE: u8 = 0x7D;

/// Mask applied to a reserved byte after an escape
pub const STUFF_MASK: u8 = 0x20;

/// Stuffed replacement for `FLAG`
pub const ESCAPED_FLAG: u8 = FLAG ^ STUFF_MASK;

/// Stuffed replacement for `ESCAPE`
pub const ESCAPED_ESCAPE: u8 = ESCAPE ^ STUFF_MASK;

/// Address of frames sent by the transmitter (commands)
pub const ADDRESS_COMMAND: u8 = 0x03;

/// Address of frames sent by the receiver (responses)
pub const ADDRESS_RESPONSE: u8 = 0x01;

/// Set up - transmitter asks to open the connection
pub const SET: u8 = 0x03;

/// Unnumbered acknowledgment - answers SET and the final DISC
pub const UA: u8 = 0x07;

/// Disconnect - either side tearing the connection down
pub const DISC: u8 = 0x11;

/// Receiver ready - frame accepted, bit 7 carries the next expected sequence
pub const RR: u8 = 0x05;

/// Reject - frame failed its checksum, bit 7 as for `RR`
pub const REJ: u8 = 0x01;

/// Information frame control code, bit 6 carries the sequence
pub const INFO: u8 = 0x00;

/// Sequence bit position in an information frame control byte
pub const INFO_SEQUENCE_BIT: u8 = 1 << 6;

/// Sequence bit position in an RR/REJ control byte
pub const RESPONSE_SEQUENCE_BIT: u8 = 1 << 7;

/// Length of every supervisory frame
pub const SUPERVISORY_LEN: usize = 5;
