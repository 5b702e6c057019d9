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

use std::io;
use std::time::Duration;
use serialport::{SerialPort as SerialPortTrait, DataBits, Parity, StopBits};

// ============================================================================
// SerialPort Trait
// ============================================================================

/// Byte channel the link layer runs over
pub trait SerialPort: Send {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;
}

/// Outcome of waiting for a single byte
#[derive(Debug)]
pub enum ReadAttempt {
    Byte(u8),
    /// Nothing arrived within the timeout
    WouldBlock,
    Fatal(io::Error),
}

/// Waits up to `timeout` for one byte.
///
/// Empty reads and timeouts are not errors here, the caller decides how many
/// of them it tolerates.
pub fn read_attempt(port: &mut dyn SerialPort, timeout: Duration) -> ReadAttempt {
    let mut buf = [0u8; 1];
    match port.read_timeout(&mut buf, timeout) {
        Ok(0) => ReadAttempt::WouldBlock,
        Ok(_) => ReadAttempt::Byte(buf[0]),
        Err(e) if matches!(
            e.kind(),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
        ) => ReadAttempt::WouldBlock,
        Err(e) => ReadAttempt::Fatal(e),
    }
}

// ============================================================================
// Real Serial Port Implementation
// ============================================================================

/// Real serial port implementation that wraps the serialport crate
pub struct RealSerialPort {
    port: Box<dyn SerialPortTrait>,
}

impl RealSerialPort {
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        data_bits: DataBits,
        parity: Parity,
        stop_bits: StopBits,
    ) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .timeout(Duration::from_millis(100))
            .open()?;

        // Stale bytes from a previous session would only confuse the recognizers
        port.clear(serialport::ClearBuffer::All)?;

        Ok(RealSerialPort { port })
    }
}

impl SerialPort for RealSerialPort {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.port.write_all(buf)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        self.port.set_timeout(timeout).map_err(io::Error::other)?;
        self.port.read(buf)
    }
}

// ============================================================================
// Mock Serial Port for Testing
// ============================================================================

#[cfg(test)]
pub struct MockSerialPort {
    // Data to return on reads (None = timeout)
    read_buffer: Vec<Option<u8>>,
    read_pos: usize,
    // Track what was written
    write_log: Vec<u8>,
    // Expected writes for verification
    expected_writes: Vec<u8>,
}

#[cfg(test)]
impl MockSerialPort {
    pub fn new(responses: Vec<Option<u8>>, expected_writes: Vec<u8>) -> Self {
        MockSerialPort {
            read_buffer: responses,
            read_pos: 0,
            write_log: Vec::new(),
            expected_writes,
        }
    }
}

#[cfg(test)]
impl SerialPort for MockSerialPort {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_log.extend_from_slice(buf);
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        // Out of responses = timeout
        if self.read_pos >= self.read_buffer.len() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "Mock timeout"));
        }

        // If current response is None = timeout
        if self.read_buffer[self.read_pos].is_none() {
            self.read_pos += 1;
            return Err(io::Error::new(io::ErrorKind::TimedOut, "Mock timeout"));
        }

        let mut bytes_read = 0;
        while bytes_read < buf.len() && self.read_pos < self.read_buffer.len() {
            match self.read_buffer[self.read_pos] {
                Some(byte) => {
                    buf[bytes_read] = byte;
                    bytes_read += 1;
                    self.read_pos += 1;
                }
                None => break,  // Stop at timeout marker
            }
        }

        Ok(bytes_read)
    }
}

#[cfg(test)]
impl Drop for MockSerialPort {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }

        assert_eq!(
            self.read_pos,
            self.read_buffer.len(),
            "MockSerialPort dropped with {} unconsumed responses (read {} of {} bytes)",
            self.read_buffer.len() - self.read_pos,
            self.read_pos,
            self.read_buffer.len()
        );

        assert_eq!(
            &self.write_log,
            &self.expected_writes,
            "MockSerialPort write log mismatch!\nExpected {} bytes:\n{:02X?}\nGot {} bytes:\n{:02X?}",
            self.expected_writes.len(),
            self.expected_writes,
            self.write_log.len(),
            self.write_log
        );
    }
}

/// Turns whole frames into a mock read script.
#[cfg(test)]
pub fn script(chunks: &[&[u8]]) -> Vec<Option<u8>> {
    chunks.iter().flat_map(|chunk| chunk.iter().map(|&b| Some(b))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_attempt() {
        let mut port = MockSerialPort::new(vec![Some(0x7E), None, Some(0x01)], vec![]);

        assert!(matches!(read_attempt(&mut port, Duration::ZERO), ReadAttempt::Byte(0x7E)));
        assert!(matches!(read_attempt(&mut port, Duration::ZERO), ReadAttempt::WouldBlock));
        assert!(matches!(read_attempt(&mut port, Duration::ZERO), ReadAttempt::Byte(0x01)));
        assert!(matches!(read_attempt(&mut port, Duration::ZERO), ReadAttempt::WouldBlock));
    }

    struct BrokenPort;

    impl SerialPort for BrokenPort {
        fn write_all(&mut self, _buf: &[u8]) -> io::Result<()> {
            Ok(())
        }

        fn read_timeout(&mut self, _buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }
    }

    #[test]
    fn test_read_attempt_fatal() {
        let mut port = BrokenPort;
        match read_attempt(&mut port, Duration::ZERO) {
            ReadAttempt::Fatal(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected fatal error, got {:?}", other),
        }
    }
}
