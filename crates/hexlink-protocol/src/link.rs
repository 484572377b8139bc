/// Serial transport seam and the session that owns it.
///
/// The protocol only needs four things from the link: write bytes, ask how
/// many inbound bytes are pending without blocking, read one byte, close.

use std::io;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::error::TransferError;

/// Byte-level serial transport.
pub trait SerialLink {
    /// Write every byte, in order.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Number of inbound bytes that can be read without blocking.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read one inbound byte. Only called after `bytes_available` reported data.
    fn read_byte(&mut self) -> io::Result<u8>;

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<L: SerialLink + ?Sized> SerialLink for &mut L {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        (**self).read_byte()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl SerialLink for Box<dyn SerialPort> {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        io::Write::write_all(self.as_mut(), bytes)?;
        io::Write::flush(self.as_mut())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        let pending = self.bytes_to_read().map_err(io::Error::from)?;
        Ok(pending as usize)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        io::Read::read_exact(self.as_mut(), &mut buf)?;
        Ok(buf[0])
    }

    fn close(&mut self) -> io::Result<()> {
        io::Write::flush(self.as_mut())
    }
}

/// Open a serial device and wrap it in a session.
///
/// `read_timeout` only bounds a single byte read after data was reported
/// available; handshake timing is enforced by the protocol itself.
pub fn open_serial(
    path: &str,
    baud_rate: u32,
    read_timeout: Duration,
) -> Result<Session<Box<dyn SerialPort>>, TransferError> {
    let port = serialport::new(path, baud_rate)
        .timeout(read_timeout)
        .open()
        .map_err(io::Error::from)?;
    info!("Opened serial port {} at {} baud", path, baud_rate);
    Ok(Session::open(port, path, baud_rate))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// An open serial channel, owned by one transfer for its whole lifetime.
pub struct Session<L> {
    link: L,
    endpoint: String,
    baud_rate: u32,
    state: SessionState,
}

impl<L: SerialLink> Session<L> {
    /// Wrap an already opened link.
    pub fn open(link: L, endpoint: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            link,
            endpoint: endpoint.into(),
            baud_rate,
            state: SessionState::Open,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Borrow the link for I/O. Fails once the session is closed.
    pub fn link(&mut self) -> Result<&mut L, TransferError> {
        match self.state {
            SessionState::Open => Ok(&mut self.link),
            SessionState::Closed => Err(TransferError::SessionClosed),
        }
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransferError> {
        self.link()?.write_all(bytes)?;
        Ok(())
    }

    /// Close the link. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), TransferError> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        debug!("Closing session on {}", self.endpoint);
        self.link.close()?;
        Ok(())
    }

    pub fn into_inner(self) -> L {
        self.link
    }
}
