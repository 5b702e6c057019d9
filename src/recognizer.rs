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

//! Byte-at-a-time frame recognizers
//!
//! Both recognizers are pure: they are fed one received byte per call and never
//! touch the channel, so the retry and timeout policy stays with the caller.
//! Any byte that does not fit the current position drops the partial frame; a
//! flag always restarts recognition at `FlagRcv` so a frame that begins right
//! after garbage is not lost.

use std::mem;
use crate::frame::{Control, Sequence, bcc2};
use crate::protocol::*;
use crate::stuffing::destuff;

// ============================================================================
// Supervisory Frames
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Start,
    FlagRcv,
    AddressRcv,
    ControlRcv,
    ChecksumOk,
    Stop,
}

/// Recognizes a 5 byte supervisory frame from `address` whose control field is
/// one of `accepted`.
#[derive(Debug)]
pub struct SupervisoryRecognizer {
    address: u8,
    accepted: Vec<Control>,
    state: FrameState,
    control: Option<Control>,
}

impl SupervisoryRecognizer {
    pub fn new(address: u8, accepted: &[Control]) -> Self {
        SupervisoryRecognizer {
            address,
            accepted: accepted.to_vec(),
            state: FrameState::Start,
            control: None,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = FrameState::Start;
        self.control = None;
    }

    /// Advances by one byte, returning the control field once the closing flag
    /// of an accepted frame arrives.
    pub fn feed(&mut self, byte: u8) -> Option<Control> {
        use FrameState::*;

        let state = self.state;
        self.state = match state {
            Start if byte == FLAG => FlagRcv,
            Start => Start,

            FlagRcv if byte == self.address => AddressRcv,
            FlagRcv if byte == FLAG => FlagRcv,
            FlagRcv => Start,

            AddressRcv => match self.accepted.iter().find(|c| c.to_byte() == byte) {
                Some(&control) => {
                    self.control = Some(control);
                    ControlRcv
                }
                None if byte == FLAG => FlagRcv,
                None => Start,
            },

            ControlRcv => match self.control {
                Some(control) if byte == self.address ^ control.to_byte() => ChecksumOk,
                _ if byte == FLAG => FlagRcv,
                _ => Start,
            },

            ChecksumOk if byte == FLAG => Stop,
            ChecksumOk => Start,

            Stop => Stop,
        };

        match self.state {
            Stop if state != Stop => self.control,
            Start | FlagRcv => {
                self.control = None;
                None
            }
            _ => None,
        }
    }
}

// ============================================================================
// Information Frames
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoState {
    Start,
    FlagRcv,
    AddressRcv,
    ControlRcv,
    Checksum1Ok,
    ReadData,
    Escape,
    Stop,
}

/// A complete information frame as it came off the wire, checksum unchecked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformationFrame {
    pub sequence: Sequence,
    pub payload: Vec<u8>,
    pub bcc2: u8,
}

impl InformationFrame {
    pub fn is_intact(&self) -> bool {
        bcc2(&self.payload) == self.bcc2
    }
}

/// Recognizes an information frame from `address` carrying either sequence.
///
/// The last destuffed byte is held back until the next one arrives: when the
/// closing flag comes instead, the held byte is the trailing BCC2 and is kept
/// out of the payload.
#[derive(Debug)]
pub struct InformationRecognizer {
    address: u8,
    state: InfoState,
    sequence: Sequence,
    payload: Vec<u8>,
    held: Option<u8>,
}

impl InformationRecognizer {
    pub fn new(address: u8) -> Self {
        InformationRecognizer {
            address,
            state: InfoState::Start,
            sequence: Sequence::Zero,
            payload: Vec::new(),
            held: None,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn state(&self) -> InfoState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = InfoState::Start;
        self.drop_partial();
    }

    fn drop_partial(&mut self) {
        self.payload.clear();
        self.held = None;
    }

    fn push_held(&mut self, byte: u8) {
        if let Some(prev) = self.held.replace(byte) {
            self.payload.push(prev);
        }
    }

    pub fn feed(&mut self, byte: u8) -> Option<InformationFrame> {
        use InfoState::*;

        let state = self.state;
        self.state = match state {
            Start if byte == FLAG => FlagRcv,
            Start => Start,

            FlagRcv if byte == self.address => AddressRcv,
            FlagRcv if byte == FLAG => FlagRcv,
            FlagRcv => Start,

            AddressRcv => match Control::from_byte(byte) {
                Some(Control::Info(sequence)) => {
                    self.sequence = sequence;
                    ControlRcv
                }
                _ if byte == FLAG => FlagRcv,
                _ => Start,
            },

            ControlRcv if byte == self.address ^ Control::Info(self.sequence).to_byte() => {
                Checksum1Ok
            }
            ControlRcv if byte == FLAG => FlagRcv,
            ControlRcv => Start,

            // A flag straight after the header is a frame with no body, not even BCC2
            Checksum1Ok if byte == FLAG => FlagRcv,
            Checksum1Ok if byte == ESCAPE => Escape,
            Checksum1Ok => {
                self.held = Some(byte);
                ReadData
            }

            ReadData if byte == ESCAPE => Escape,
            ReadData if byte == FLAG => match self.held.take() {
                Some(trailer) => {
                    self.state = Stop;
                    return Some(InformationFrame {
                        sequence: self.sequence,
                        payload: mem::take(&mut self.payload),
                        bcc2: trailer,
                    });
                }
                None => FlagRcv,
            },
            ReadData => {
                self.push_held(byte);
                ReadData
            }

            Escape => match destuff(byte) {
                Some(original) => {
                    self.push_held(original);
                    ReadData
                }
                None if byte == FLAG => FlagRcv,
                None => Start,
            },

            Stop => Stop,
        };

        if matches!(self.state, Start | FlagRcv) {
            self.drop_partial();
        }

        None
    }
}

// ============================================================================
// Tests
// ============================================================================
