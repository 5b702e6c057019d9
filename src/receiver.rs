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

//! Receiver side of the link: SET/UA open, checked reads with RR/REJ, DISC close

use tracing::{debug, info, warn};
use crate::frame::{Control, supervisory};
use crate::link::{Link, LinkConfig, LinkError, LinkStatistics, Receiver, RetryBudget};
use crate::protocol::*;
use crate::recognizer::{InformationFrame, InformationRecognizer, SupervisoryRecognizer};
use crate::serial::SerialPort;

impl Link<Receiver> {
    /// Waits for SET and answers it with UA.
    pub fn open(serial: Box<dyn SerialPort>, config: LinkConfig) -> Result<Self, LinkError> {
        let mut link = Link::new(serial, config);
        debug!("Waiting for SET");

        let mut budget = link.budget("SET");
        link.await_supervisory(&[Control::Set], &mut budget, None)?;
        link.send_supervisory(Control::Ua)?;

        info!("Connection established (receiver)");
        Ok(link)
    }

    /// Returns the payload of the next in-sequence, checksum-valid information frame.
    pub fn read(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut frames = InformationRecognizer::new(ADDRESS_COMMAND);
        let mut setup = SupervisoryRecognizer::new(ADDRESS_COMMAND, &[Control::Set]);
        let mut budget = self.budget("information frame");

        loop {
            let byte = self.next_byte(&mut budget, None)?;

            if setup.feed(byte).is_some() {
                warn!("SET received again, the UA must have been lost");
                self.send_supervisory(Control::Ua)?;
                setup.reset();
            }

            let Some(frame) = frames.feed(byte) else {
                continue;
            };
            frames.reset();

            if frame.sequence != self.sequence {
                self.acknowledge_duplicate(&frame)?;
                continue;
            }

            let next = self.sequence.next();

            if !frame.is_intact() {
                warn!("Checksum mismatch on I({}), rejecting", frame.sequence);
                self.send_supervisory(Control::Rej(next))?;
                continue;
            }

            debug!("Received: I({}) with {} byte payload", frame.sequence, frame.payload.len());
            self.send_supervisory(Control::Rr(next))?;
            self.sequence.toggle();
            self.packets_read += 1;
            return Ok(frame.payload);
        }
    }

    /// Waits for DISC, echoes it and waits for the closing UA.
    pub fn close(mut self, show_statistics: bool) -> Result<Option<LinkStatistics>, LinkError> {
        let mut budget = self.budget("DISC");
        self.await_disc(&mut budget)?;

        let disc = supervisory(ADDRESS_RESPONSE, Control::Disc);
        self.send(&disc)?;
        debug!("Sent: DISC, waiting for UA");

        let mut budget = self.budget("UA");
        self.await_supervisory(&[Control::Ua], &mut budget, Some(&disc))?;

        Ok(self.finish(show_statistics))
    }

    /// Like `await_supervisory`, but keeps acknowledging repeats of the last
    /// information frame, whose RR may have been lost.
    fn await_disc(&mut self, budget: &mut RetryBudget) -> Result<(), LinkError> {
        let mut disc = SupervisoryRecognizer::new(ADDRESS_COMMAND, &[Control::Disc]);
        let mut frames = InformationRecognizer::new(ADDRESS_COMMAND);

        loop {
            let byte = self.next_byte(budget, None)?;

            if disc.feed(byte).is_some() {
                debug!("Received: DISC");
                return Ok(());
            }

            if let Some(frame) = frames.feed(byte) {
                frames.reset();
                if frame.sequence != self.sequence {
                    self.acknowledge_duplicate(&frame)?;
                }
            }
        }
    }

    /// A frame carrying the previous sequence was already delivered; repeat the
    /// RR so the transmitter can move on.
    fn acknowledge_duplicate(&mut self, frame: &InformationFrame) -> Result<(), LinkError> {
        if !frame.is_intact() {
            debug!("Dropping damaged duplicate I({})", frame.sequence);
            return Ok(());
        }

        warn!("Duplicate I({}) discarded, acknowledging again", frame.sequence);
        self.send_supervisory(Control::Rr(self.sequence))
    }
}

// ============================================================================
// Tests
// ============================================================================
