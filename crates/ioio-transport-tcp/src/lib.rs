//! [`Transport`] over `std::net::TcpStream`, for the IOIO-over-TCP debug
//! bridge: a board (real or emulated) listens on a TCP port and the host
//! dials out to it, in place of the USB accessory or Bluetooth RFCOMM link a
//! production host would use.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use tracing::{debug, warn};

use ioio_core::Transport;

/// A TCP connection to an IOIO-over-TCP bridge. Constructed unconnected;
/// [`Transport::wait_for_connect`] performs the actual dial.
pub struct TcpTransport {
    addr: SocketAddr,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Resolves `addr` (any `ToSocketAddrs`, e.g. `"192.168.1.50:4545"`) and
    /// returns an unconnected transport. Call [`Transport::wait_for_connect`]
    /// before handing it to [`ioio_core::IoioSession::connect`].
    pub fn new(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no address resolved"))?;
        Ok(TcpTransport { addr, stream: None })
    }

    fn stream_mut(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not connected"))
    }
}

impl Read for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream_mut()?.read(buf)
    }
}

impl Write for TcpTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream_mut()?.flush()
    }
}

impl Transport for TcpTransport {
    fn wait_for_connect(&mut self) -> io::Result<()> {
        debug!(addr = %self.addr, "dialing IOIO-over-TCP bridge");
        let stream = TcpStream::connect(self.addr)?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn try_clone(&self) -> io::Result<Self> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not connected"))?
            .try_clone()?;
        Ok(TcpTransport {
            addr: self.addr,
            stream: Some(stream),
        })
    }

    fn can_close(&self) -> bool {
        true
    }

    fn disconnect(&mut self) {
        if let Some(stream) = &self.stream {
            if let Err(err) = stream.shutdown(Shutdown::Both) {
                warn!(%err, "error shutting down TCP transport");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn connect_then_exchange_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4];
            conn.read_exact(&mut buf).unwrap();
            conn.write_all(&buf).unwrap();
        });

        let mut transport = TcpTransport::new(addr).unwrap();
        transport.wait_for_connect().unwrap();
        transport.write_all(&[1, 2, 3, 4]).unwrap();
        let mut echo = [0u8; 4];
        transport.read_exact(&mut echo).unwrap();
        assert_eq!(echo, [1, 2, 3, 4]);

        server.join().unwrap();
    }

    #[test]
    fn try_clone_before_connect_fails() {
        let transport = TcpTransport::new("127.0.0.1:1").unwrap();
        assert!(transport.try_clone().is_err());
    }
}
