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

//! Frame construction
//!
//! Supervisory frames are `FLAG, A, C, A^C, FLAG`. Information frames wrap the
//! stuffed payload and its XOR checksum between the same header and a closing
//! flag. Parsing lives in `recognizer`, one byte at a time.

use std::fmt;
use crate::protocol::*;
use crate::stuffing::stuff;

// ============================================================================
// Sequence Bit
// ============================================================================

/// Alternating sequence bit of the stop-and-wait protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sequence {
    #[default]
    Zero,
    One,
}

impl Sequence {
    pub fn next(self) -> Sequence {
        match self {
            Sequence::Zero => Sequence::One,
            Sequence::One => Sequence::Zero,
        }
    }

    pub fn toggle(&mut self) {
        *self = self.next();
    }

    fn is_set(self) -> bool {
        self == Sequence::One
    }

    fn from_bit(set: bool) -> Sequence {
        if set { Sequence::One } else { Sequence::Zero }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sequence::Zero => write!(f, "0"),
            Sequence::One => write!(f, "1"),
        }
    }
}

// ============================================================================
// Control Field
// ============================================================================

/// Decoded control byte
///
/// `Rr` and `Rej` carry the sequence the receiver expects next, `Info` the
/// sequence of the frame itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Set,
    Ua,
    Disc,
    Rr(Sequence),
    Rej(Sequence),
    Info(Sequence),
}

impl Control {
    pub fn to_byte(self) -> u8 {
        let bit = |seq: Sequence, mask: u8| if seq.is_set() { mask } else { 0 };

        match self {
            Control::Set => SET,
            Control::Ua => UA,
            Control::Disc => DISC,
            Control::Rr(seq) => RR | bit(seq, RESPONSE_SEQUENCE_BIT),
            Control::Rej(seq) => REJ | bit(seq, RESPONSE_SEQUENCE_BIT),
            Control::Info(seq) => INFO | bit(seq, INFO_SEQUENCE_BIT),
        }
    }

    pub fn from_byte(byte: u8) -> Option<Control> {
        let response_seq = Sequence::from_bit(byte & RESPONSE_SEQUENCE_BIT != 0);

        match byte {
            SET => Some(Control::Set),
            UA => Some(Control::Ua),
            DISC => Some(Control::Disc),
            b if b & !RESPONSE_SEQUENCE_BIT == RR => Some(Control::Rr(response_seq)),
            b if b & !RESPONSE_SEQUENCE_BIT == REJ => Some(Control::Rej(response_seq)),
            b if b & !INFO_SEQUENCE_BIT == INFO => {
                Some(Control::Info(Sequence::from_bit(b & INFO_SEQUENCE_BIT != 0)))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Control::Set => write!(f, "SET"),
            Control::Ua => write!(f, "UA"),
            Control::Disc => write!(f, "DISC"),
            Control::Rr(seq) => write!(f, "RR({})", seq),
            Control::Rej(seq) => write!(f, "REJ({})", seq),
            Control::Info(seq) => write!(f, "I({})", seq),
        }
    }
}

// ============================================================================
// Builders
// ============================================================================

/// XOR of all payload bytes, 0 for an empty payload
pub fn bcc2(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc ^ b)
}

pub fn supervisory(address: u8, control: Control) -> [u8; SUPERVISORY_LEN] {
    let c = control.to_byte();
    [FLAG, address, c, address ^ c, FLAG]
}

/// Builds a complete information frame ready for the wire.
pub fn information(address: u8, sequence: Sequence, payload: &[u8]) -> Vec<u8> {
    let c = Control::Info(sequence).to_byte();

    let mut body = Vec::with_capacity(payload.len() + 1);
    body.extend_from_slice(payload);
    body.push(bcc2(payload));
    let body = stuff(&body);

    let mut frame = Vec::with_capacity(body.len() + SUPERVISORY_LEN);
    frame.extend_from_slice(&[FLAG, address, c, address ^ c]);
    frame.extend_from_slice(&body);
    frame.push(FLAG);
    frame
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_codes() {
        assert_eq!(Control::Set.to_byte(), 0x03);
        assert_eq!(Control::Ua.to_byte(), 0x07);
        assert_eq!(Control::Disc.to_byte(), 0x11);
        assert_eq!(Control::Rr(Sequence::Zero).to_byte(), 0x05);
        assert_eq!(Control::Rr(Sequence::One).to_byte(), 0x85);
        assert_eq!(Control::Rej(Sequence::Zero).to_byte(), 0x01);
        assert_eq!(Control::Rej(Sequence::One).to_byte(), 0x81);
        assert_eq!(Control::Info(Sequence::Zero).to_byte(), 0x00);
        assert_eq!(Control::Info(Sequence::One).to_byte(), 0x40);
    }

    #[test]
    fn test_control_decode() {
        let all = [
            Control::Set,
            Control::Ua,
            Control::Disc,
            Control::Rr(Sequence::Zero),
            Control::Rr(Sequence::One),
            Control::Rej(Sequence::Zero),
            Control::Rej(Sequence::One),
            Control::Info(Sequence::Zero),
            Control::Info(Sequence::One),
        ];

        for control in all {
            assert_eq!(Control::from_byte(control.to_byte()), Some(control));
        }

        assert_eq!(Control::from_byte(0x7E), None);
        assert_eq!(Control::from_byte(0xC0), None);
    }

    #[test]
    fn test_sequence_toggle() {
        let mut seq = Sequence::default();
        assert_eq!(seq, Sequence::Zero);
        seq.toggle();
        assert_eq!(seq, Sequence::One);
        seq.toggle();
        assert_eq!(seq, Sequence::Zero);
    }

    #[test]
    fn test_supervisory() {
        assert_eq!(supervisory(ADDRESS_COMMAND, Control::Set), [0x7E, 0x03, 0x03, 0x00, 0x7E]);
        assert_eq!(supervisory(ADDRESS_RESPONSE, Control::Ua), [0x7E, 0x01, 0x07, 0x06, 0x7E]);
        assert_eq!(
            supervisory(ADDRESS_RESPONSE, Control::Rr(Sequence::One)),
            [0x7E, 0x01, 0x85, 0x84, 0x7E]
        );
    }

    #[test]
    fn test_information() {
        let frame = information(ADDRESS_COMMAND, Sequence::Zero, &[0x01, 0x02, 0x03]);
        assert_eq!(frame, vec![0x7E, 0x03, 0x00, 0x03, 0x01, 0x02, 0x03, 0x00, 0x7E]);

        let frame = information(ADDRESS_COMMAND, Sequence::One, &[0x7E, 0x11]);
        assert_eq!(frame, vec![0x7E, 0x03, 0x40, 0x43, 0x7D, 0x5E, 0x11, 0x6F, 0x7E]);
    }

    #[test]
    fn test_information_stuffs_checksum() {
        // 0x7C ^ 0x02 == 0x7E, so the checksum itself needs escaping
        let frame = information(ADDRESS_COMMAND, Sequence::Zero, &[0x7C, 0x02]);
        assert_eq!(frame, vec![0x7E, 0x03, 0x00, 0x03, 0x7C, 0x02, 0x7D, 0x5E, 0x7E]);
    }

    #[test]
    fn test_bcc2() {
        assert_eq!(bcc2(&[]), 0);
        assert_eq!(bcc2(&[0x01, 0x02, 0x03]), 0x00);
        assert_eq!(bcc2(&[0xFF, 0x0F]), 0xF0);
    }
}
