//! The transport contract (§6): what a physical-link collaborator must
//! provide. USB accessory, Bluetooth RFCOMM, and TCP adapters all implement
//! this trait; none of their framing or discovery logic is in scope here —
//! only the duplex byte stream and the teardown contract the session needs.

use std::io::{self, Read, Write};

/// A duplex, byte-oriented link to a board, plus the teardown policy the
/// session needs to know about.
///
/// Modelled after `std::net::TcpStream`: a single handle that is both
/// [`Read`] and [`Write`], cheaply cloneable into independent handles that
/// share the same underlying link (so the incoming dispatcher (C3) can hold
/// one clone exclusively for reading while the outgoing channel (C2) holds
/// another exclusively for writing, and the session keeps a third purely to
/// call [`disconnect`](Self::disconnect) on).
pub trait Transport: Read + Write + Send + 'static {
    /// Establishes the underlying link (opens the USB accessory, connects
    /// the RFCOMM socket, dials the TCP host). Blocks until the link is
    /// ready or has definitively failed.
    fn wait_for_connect(&mut self) -> std::io::Result<()>;

    /// Returns an independent handle to the same underlying link. Read and
    /// write traffic on the two handles must not corrupt each other — they
    /// are used concurrently by different threads for different halves of
    /// the duplex stream.
    fn try_clone(&self) -> std::io::Result<Self>
    where
        Self: Sized;

    /// Whether the host may tear this transport down directly.
    ///
    /// When `false`, the core never calls [`disconnect`](Self::disconnect)
    /// on it: instead it sends `SOFT_CLOSE` on the wire and lets the device
    /// end of the link close its side, per §6 ("The core will not call
    /// `disconnect` on transports that report `can_close == false`").
    fn can_close(&self) -> bool;

    /// Tears the transport down from the host side. Only called when
    /// [`can_close`](Self::can_close) is `true`.
    fn disconnect(&mut self);
}

/// Object-safe subset of [`Transport`] used internally by [`BoxedTransport`]
/// so it can clone itself without naming the wrapped concrete type.
trait ErasedTransport: Read + Write + Send {
    fn wait_for_connect(&mut self) -> io::Result<()>;
    fn try_clone_boxed(&self) -> io::Result<Box<dyn ErasedTransport>>;
    fn can_close(&self) -> bool;
    fn disconnect(&mut self);
}

impl<T: Transport> ErasedTransport for T {
    fn wait_for_connect(&mut self) -> io::Result<()> {
        Transport::wait_for_connect(self)
    }

    fn try_clone_boxed(&self) -> io::Result<Box<dyn ErasedTransport>> {
        Ok(Box::new(Transport::try_clone(self)?))
    }

    fn can_close(&self) -> bool {
        Transport::can_close(self)
    }

    fn disconnect(&mut self) {
        Transport::disconnect(self)
    }
}

/// A type-erased [`Transport`]. Lets a facade crate hand out a single
/// non-generic handle type (`Board`, `DigitalOutput`, ...) regardless of
/// which concrete transport backs the connection, at the cost of one extra
/// indirection per read/write.
pub struct BoxedTransport(Box<dyn ErasedTransport>);

impl BoxedTransport {
    /// Erases `transport`'s concrete type.
    pub fn new<T: Transport>(transport: T) -> Self {
        BoxedTransport(Box::new(transport))
    }
}

impl Read for BoxedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for BoxedTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl Transport for BoxedTransport {
    fn wait_for_connect(&mut self) -> io::Result<()> {
        self.0.wait_for_connect()
    }

    fn try_clone(&self) -> io::Result<Self> {
        Ok(BoxedTransport(self.0.try_clone_boxed()?))
    }

    fn can_close(&self) -> bool {
        self.0.can_close()
    }

    fn disconnect(&mut self) {
        self.0.disconnect()
    }
}
