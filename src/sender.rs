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

//! Transmitter side of the link: SET/UA open, stop-and-wait writes, DISC close

use tracing::{debug, info, warn};
use crate::frame::{Control, information, supervisory};
use crate::link::{Link, LinkConfig, LinkError, LinkStatistics, Transmitter};
use crate::protocol::*;
use crate::serial::SerialPort;

impl Link<Transmitter> {
    /// Sends SET until the receiver answers with UA.
    pub fn open(serial: Box<dyn SerialPort>, config: LinkConfig) -> Result<Self, LinkError> {
        let mut link = Link::new(serial, config);

        let set = supervisory(ADDRESS_COMMAND, Control::Set);
        link.send(&set)?;
        debug!("Sent: SET, waiting for UA");

        let mut budget = link.budget("UA");
        link.await_supervisory(&[Control::Ua], &mut budget, Some(&set))?;

        info!("Connection established (transmitter)");
        Ok(link)
    }

    /// Sends `payload` as one information frame and waits for it to be acknowledged.
    ///
    /// Returns the number of bytes the frame took on the wire.
    pub fn write(&mut self, payload: &[u8]) -> Result<usize, LinkError> {
        let frame = information(ADDRESS_COMMAND, self.sequence, payload);
        let next = self.sequence.next();

        self.send(&frame)?;
        debug!("Sent: I({}) with {} byte payload", self.sequence, payload.len());

        let accepted = [Control::Rr(next), Control::Rej(next)];
        let mut budget = self.budget("RR");

        while let Control::Rej(_) = self.await_supervisory(&accepted, &mut budget, Some(&frame))? {
            budget.spend()?;
            warn!("Frame I({}) rejected, retransmitting", self.sequence);
            self.send(&frame)?;
        }

        self.sequence.toggle();
        self.packets_sent += 1;
        Ok(frame.len())
    }

    /// Sends DISC until the receiver echoes it, then confirms with UA.
    pub fn close(mut self, show_statistics: bool) -> Result<Option<LinkStatistics>, LinkError> {
        let disc = supervisory(ADDRESS_COMMAND, Control::Disc);
        self.send(&disc)?;
        debug!("Sent: DISC, waiting for DISC");

        let mut budget = self.budget("DISC");
        self.await_supervisory(&[Control::Disc], &mut budget, Some(&disc))?;

        self.send_supervisory(Control::Ua)?;
        Ok(self.finish(show_statistics))
    }
}

// ============================================================================
// Tests
// ============================================================================
