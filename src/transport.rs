//! Transport abstraction — any byte-oriented channel a serial worker
//! can write frames to.
//!
//! Concrete implementations:
//! - a real serial port, via the `serialport` crate
//! - a null transport that discards everything, used by worker tests
//!   that exercise the Open/Loop/Close lifecycle without real hardware
//!
//! The serial worker is generic over `Transport`, so it never imports
//! `serialport` types directly outside of [`SerialTransport`] itself.

use std::io;
use std::time::Duration;

/// Byte-oriented transport channel.
pub trait Transport {
    /// Write `data` in full, returning an error if the underlying
    /// channel stalls or closes.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush any buffered output.
    fn flush(&mut self) -> io::Result<()>;

    /// Read up to `buf.len()` bytes, returning the count read. `0`
    /// means end of stream (the WLED probe treats this as "no data").
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Wraps a boxed [`serialport::SerialPort`].
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    pub fn new(port: Box<dyn serialport::SerialPort>) -> Self {
        Self { port }
    }

    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> crate::error::Result<Self> {
        let port = serialport::new(port_name, baud_rate).timeout(timeout).open()?;
        Ok(Self::new(port))
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }
}

/// A null transport that discards all writes and never reads. Used by
/// worker tests to exercise the Open/Loop/Close lifecycle without a
/// real serial port present.
#[derive(Default)]
pub struct NullTransport {
    pub written: Vec<Vec<u8>>,
}

impl Transport for NullTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.written.push(data.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_transport_records_writes() {
        let mut t = NullTransport::default();
        t.write_all(&[1, 2, 3]).unwrap();
        t.write_all(&[4, 5]).unwrap();
        assert_eq!(t.written, vec![vec![1, 2, 3], vec![4, 5]]);
    }

    #[test]
    fn null_transport_read_is_always_empty() {
        let mut t = NullTransport::default();
        let mut buf = [0u8; 8];
        assert_eq!(t.read(&mut buf).unwrap(), 0);
    }
}
