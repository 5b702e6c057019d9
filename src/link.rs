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

//! Link session shared by both roles
//!
//! A [`Link`] is typed by its role: only `Link<Transmitter>` can `write` and
//! only `Link<Receiver>` can `read`. Role specific open/write/read/close live
//! in `sender` and `receiver`; this module holds the session state and the
//! timeout/retry policy both of them use.

use std::io;
use std::marker::PhantomData;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use crate::frame::{Control, Sequence, supervisory};
use crate::protocol::*;
use crate::recognizer::SupervisoryRecognizer;
use crate::serial::{ReadAttempt, SerialPort, read_attempt};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no {awaiting} received after {retries} retries")]
    RetriesExhausted { awaiting: &'static str, retries: u32 },
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Retransmissions (or extra waits) allowed per exchange
    pub retries: u32,
    /// How long a single byte read may block
    pub timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            retries: 3,
            timeout: Duration::from_secs(4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkStatistics {
    pub packets_sent: u32,
    pub packets_read: u32,
}

// ============================================================================
// Roles
// ============================================================================

pub trait Role {
    const NAME: &'static str;
    /// Address this role puts on the frames it sends
    const LOCAL_ADDRESS: u8;
    /// Address carried by frames the peer sends
    const PEER_ADDRESS: u8;
}

pub struct Transmitter;
pub struct Receiver;

impl Role for Transmitter {
    const NAME: &'static str = "transmitter";
    const LOCAL_ADDRESS: u8 = ADDRESS_COMMAND;
    const PEER_ADDRESS: u8 = ADDRESS_RESPONSE;
}

impl Role for Receiver {
    const NAME: &'static str = "receiver";
    const LOCAL_ADDRESS: u8 = ADDRESS_RESPONSE;
    const PEER_ADDRESS: u8 = ADDRESS_COMMAND;
}

// ============================================================================
// Retry Budget
// ============================================================================

/// Counts the retries spent on one exchange.
#[derive(Debug)]
pub struct RetryBudget {
    awaiting: &'static str,
    limit: u32,
    spent: u32,
}

impl RetryBudget {
    pub fn new(awaiting: &'static str, limit: u32) -> Self {
        RetryBudget { awaiting, limit, spent: 0 }
    }

    /// Takes one retry, failing once `limit` have already been used.
    pub fn spend(&mut self) -> Result<(), LinkError> {
        if self.spent >= self.limit {
            return Err(LinkError::RetriesExhausted {
                awaiting: self.awaiting,
                retries: self.limit,
            });
        }
        self.spent += 1;
        Ok(())
    }

    pub fn spent(&self) -> u32 {
        self.spent
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct Link<R: Role> {
    role: PhantomData<R>,
    serial: Box<dyn SerialPort>,
    config: LinkConfig,
    pub(crate) sequence: Sequence,
    pub(crate) packets_sent: u32,
    pub(crate) packets_read: u32,
}

impl<R: Role> Link<R> {
    pub(crate) fn new(serial: Box<dyn SerialPort>, config: LinkConfig) -> Self {
        Link {
            role: PhantomData,
            serial,
            config,
            sequence: Sequence::Zero,
            packets_sent: 0,
            packets_read: 0,
        }
    }

    /// Sequence of the next information frame to send or accept
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn statistics(&self) -> LinkStatistics {
        LinkStatistics {
            packets_sent: self.packets_sent,
            packets_read: self.packets_read,
        }
    }

    pub(crate) fn budget(&self, awaiting: &'static str) -> RetryBudget {
        RetryBudget::new(awaiting, self.config.retries)
    }

    pub(crate) fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.serial.write_all(bytes)?;
        Ok(())
    }

    pub(crate) fn send_supervisory(&mut self, control: Control) -> Result<(), LinkError> {
        self.send(&supervisory(R::LOCAL_ADDRESS, control))?;
        debug!("Sent: {}", control);
        Ok(())
    }

    /// Blocks until a byte arrives.
    ///
    /// Every empty read spends one retry from `budget` and, when `resend` is
    /// given, puts that frame on the wire again.
    pub(crate) fn next_byte(
        &mut self,
        budget: &mut RetryBudget,
        resend: Option<&[u8]>,
    ) -> Result<u8, LinkError> {
        loop {
            match read_attempt(self.serial.as_mut(), self.config.timeout) {
                ReadAttempt::Byte(byte) => return Ok(byte),
                ReadAttempt::WouldBlock => {
                    budget.spend()?;
                    warn!(
                        "Timed out waiting for {} ({}), retry {}/{}",
                        budget.awaiting, R::NAME, budget.spent(), budget.limit
                    );
                    if let Some(frame) = resend {
                        self.send(frame)?;
                    }
                }
                ReadAttempt::Fatal(e) => return Err(e.into()),
            }
        }
    }

    /// Reads until one of the `accepted` supervisory frames arrives from the peer.
    pub(crate) fn await_supervisory(
        &mut self,
        accepted: &[Control],
        budget: &mut RetryBudget,
        resend: Option<&[u8]>,
    ) -> Result<Control, LinkError> {
        let mut recognizer = SupervisoryRecognizer::new(R::PEER_ADDRESS, accepted);

        loop {
            let byte = self.next_byte(budget, resend)?;
            if let Some(control) = recognizer.feed(byte) {
                debug!("Received: {}", control);
                return Ok(control);
            }
        }
    }

    /// Ends the session, reporting the counters when asked to.
    pub(crate) fn finish(self, show_statistics: bool) -> Option<LinkStatistics> {
        info!("Connection closed ({})", R::NAME);

        if !show_statistics {
            return None;
        }

        let stats = self.statistics();
        info!(
            packets_sent = stats.packets_sent,
            packets_read = stats.packets_read,
            "Link statistics"
        );
        Some(stats)
    }
}

// ============================================================================
// Tests
// ============================================================================
