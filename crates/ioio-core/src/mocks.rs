//! In-memory duplex [`Transport`] for tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-util"))]` the way the
//! platform crate's mock devices are gated behind `std`; this one backs a
//! fake board with a byte pipe in each direction instead of a hardware bus.

use std::io::{self, Read, Write};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

use crate::transport::Transport;

/// One end of an in-memory duplex link. Construct a connected pair with
/// [`mock_transport_pair`].
pub struct MockTransport {
    rx: Arc<Mutex<Receiver<Vec<u8>>>>,
    tx: Sender<Vec<u8>>,
    pending: Vec<u8>,
    connected: Arc<Mutex<bool>>,
}

/// Builds a connected pair: bytes written to one side arrive readable on the
/// other, in both directions. The first element is conventionally the "host"
/// side the session under test owns; the second is the "board" side a test
/// drives directly to script firmware responses.
#[must_use]
pub fn mock_transport_pair() -> (MockTransport, MockTransport) {
    let (host_tx, board_rx) = std::sync::mpsc::channel();
    let (board_tx, host_rx) = std::sync::mpsc::channel();
    let connected = Arc::new(Mutex::new(true));
    let host = MockTransport {
        rx: Arc::new(Mutex::new(host_rx)),
        tx: host_tx,
        pending: Vec::new(),
        connected: Arc::clone(&connected),
    };
    let board = MockTransport {
        rx: Arc::new(Mutex::new(board_rx)),
        tx: board_tx,
        pending: Vec::new(),
        connected,
    };
    (host, board)
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            if !*self.connected.lock().unwrap_or_else(|e| e.into_inner()) {
                return Ok(0);
            }
            let rx = self.rx.lock().unwrap_or_else(|e| e.into_inner());
            match rx.recv() {
                Ok(chunk) => self.pending = chunk,
                Err(_) => return Ok(0),
            }
        }
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !*self.connected.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "disconnected"));
        }
        self.tx
            .send(buf.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MockTransport {
    fn wait_for_connect(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn try_clone(&self) -> io::Result<Self> {
        Ok(MockTransport {
            rx: Arc::clone(&self.rx),
            tx: self.tx.clone(),
            pending: Vec::new(),
            connected: Arc::clone(&self.connected),
        })
    }

    fn can_close(&self) -> bool {
        true
    }

    fn disconnect(&mut self) {
        if let Ok(mut connected) = self.connected.lock() {
            *connected = false;
        }
        // Unblock a reader parked in `rx.recv()` by draining any remaining
        // messages; a `try_recv` loop here would busy-spin for no benefit, so
        // a real session instead relies on its own reader thread noticing
        // `read` returning `Ok(0)` and tearing down from there.
        let _ = self.rx.lock().map(|rx| while rx.try_recv().is_ok() {});
    }
}

impl MockTransport {
    /// Non-blocking check for whether more bytes are queued to read. Used by
    /// board-side test helpers that need to assert "nothing was sent" rather
    /// than block forever on an empty channel.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        if !self.pending.is_empty() {
            return true;
        }
        match self.rx.lock() {
            Ok(rx) => !matches!(rx.try_recv(), Err(TryRecvError::Empty)),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pair_relays_bytes_in_both_directions() {
        let (mut host, mut board) = mock_transport_pair();
        host.write_all(&[1, 2, 3]).unwrap();
        let mut buf = [0u8; 3];
        board.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);

        board.write_all(&[9]).unwrap();
        let mut one = [0u8; 1];
        host.read_exact(&mut one).unwrap();
        assert_eq!(one, [9]);
    }

    #[test]
    fn disconnect_makes_writes_fail() {
        let (mut host, mut board) = mock_transport_pair();
        board.disconnect();
        assert!(host.write_all(&[1]).is_err() || board.write_all(&[1]).is_err());
    }
}
