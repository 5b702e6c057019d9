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

//! Byte stuffing for frame bodies
//!
//! `FLAG` and `ESCAPE` inside a frame body are sent as `ESCAPE, byte ^ STUFF_MASK`
//! so that a flag on the wire always marks a frame boundary.

use crate::protocol::*;

/// Escapes every reserved byte in `payload`.
pub fn stuff(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + payload.len() / 8 + 2);

    for &byte in payload {
        match byte {
            FLAG => out.extend_from_slice(&[ESCAPE, ESCAPED_FLAG]),
            ESCAPE => out.extend_from_slice(&[ESCAPE, ESCAPED_ESCAPE]),
            _ => out.push(byte),
        }
    }

    out
}

/// Restores the byte that followed an `ESCAPE`.
///
/// Returns `None` when `byte` is not one of the two escaped codes, which the
/// caller treats as a framing error.
pub fn destuff(byte: u8) -> Option<u8> {
    match byte {
        ESCAPED_FLAG => Some(FLAG),
        ESCAPED_ESCAPE => Some(ESCAPE),
        _ => None,
    }
}

/// Inverse of [`stuff`] over a whole buffer.
#[cfg_attr(not(test), allow(dead_code))]
pub fn destuff_all(stuffed: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(stuffed.len());
    let mut bytes = stuffed.iter();

    while let Some(&byte) = bytes.next() {
        if byte == ESCAPE {
            out.push(destuff(*bytes.next()?)?);
        } else {
            out.push(byte);
        }
    }

    Some(out)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stuff_reserved_bytes() {
        assert_eq!(stuff(&[0x01, FLAG, 0x02]), vec![0x01, ESCAPE, 0x5E, 0x02]);
        assert_eq!(stuff(&[ESCAPE]), vec![ESCAPE, 0x5D]);
        assert_eq!(stuff(&[FLAG, ESCAPE]), vec![ESCAPE, 0x5E, ESCAPE, 0x5D]);
        assert_eq!(stuff(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_stuffed_body_has_no_flag() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let stuffed = stuff(&payload);
        assert!(!stuffed.contains(&FLAG));
        assert_eq!(stuffed.len(), payload.len() + 2);
    }

    #[test]
    fn test_destuff() {
        assert_eq!(destuff(0x5E), Some(FLAG));
        assert_eq!(destuff(0x5D), Some(ESCAPE));
        assert_eq!(destuff(0x00), None);
        assert_eq!(destuff(FLAG), None);
    }

    #[test]
    fn test_round_trip() {
        let cases: Vec<Vec<u8>> = vec![
            vec![],
            (0..=255u8).collect(),
            vec![FLAG; 16],
            vec![ESCAPE; 16],
            vec![ESCAPE, ESCAPED_FLAG, FLAG, ESCAPED_ESCAPE],
            b"plain text without reserved bytes".to_vec(),
        ];

        for payload in cases {
            assert_eq!(destuff_all(&stuff(&payload)), Some(payload));
        }
    }

    #[test]
    fn test_destuff_all_malformed() {
        assert_eq!(destuff_all(&[0x01, ESCAPE, 0x01]), None);
        assert_eq!(destuff_all(&[0x01, ESCAPE]), None);
    }
}
