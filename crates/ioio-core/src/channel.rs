//! Outgoing batching channel (C2).
//!
//! Every facade call that needs to send a command goes through
//! [`OutgoingChannel::send`]. Calls nest: [`OutgoingChannel::batch`] bumps a
//! depth counter on entry and flushes the queued commands only when the
//! outermost batch exits, so a facade method that issues several commands
//! (configure a peripheral, then immediately use it) can still coalesce them
//! into one write — and so can the caller's caller.
//!
//! Lock order (§5): session → resource-state → outgoing-channel. Nothing in
//! this module ever waits on a resource-state condvar while holding the
//! internal mutex.

use std::io::Write;
use std::sync::Mutex;

use crate::codec::CommandBuf;
use crate::error::{IoioError, Result};

struct Inner<W> {
    depth: u32,
    queue: Vec<CommandBuf>,
    writer: W,
}

/// Serializes writes to the transport's outgoing stream, with nested
/// batching support.
///
/// The writer lives inside the same mutex as the batch depth and the queue
/// (§5: "the outgoing channel and its batch counter are guarded by one
/// mutex"). That is what makes "holding the channel lock blocks all senders"
/// true in this implementation rather than just documented intent — a
/// design that passed the transport in as a borrowed `&mut` on every call
/// could never be shared across the facade threads that need it.
pub struct OutgoingChannel<W> {
    inner: Mutex<Inner<W>>,
}

impl<W: Write> OutgoingChannel<W> {
    /// Creates an empty, unbatched channel writing to `writer`.
    pub fn new(writer: W) -> Self {
        OutgoingChannel {
            inner: Mutex::new(Inner {
                depth: 0,
                queue: Vec::new(),
                writer,
            }),
        }
    }

    /// Queues `command`. If no batch is open, writes it (and anything still
    /// queued from a prior batch that failed to flush) immediately.
    pub fn send(&self, command: CommandBuf) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        inner.queue.push(command);
        if inner.depth == 0 {
            Self::flush_locked(&mut inner)?;
        }
        Ok(())
    }

    /// Runs `body`, deferring any flush triggered by [`send`](Self::send)
    /// inside it until the outermost call to `batch` returns. Nested calls
    /// share one flush at the end of the outermost batch.
    pub fn batch<T>(&self, body: impl FnOnce() -> Result<T>) -> Result<T> {
        {
            let mut inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
            inner.depth = inner
                .depth
                .checked_add(1)
                .ok_or(IoioError::IllegalState)?;
        }
        let result = body();
        let mut inner = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        inner.depth = inner.depth.saturating_sub(1);
        let flush_result = if inner.depth == 0 {
            Self::flush_locked(&mut inner)
        } else {
            Ok(())
        };
        drop(inner);
        match (result, flush_result) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    fn flush_locked(inner: &mut Inner<W>) -> Result<()> {
        for command in inner.queue.drain(..) {
            inner
                .writer
                .write_all(&command)
                .map_err(|_| IoioError::ConnectionLost)?;
        }
        inner.writer.flush().map_err(|_| IoioError::ConnectionLost)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cmd(byte: u8) -> CommandBuf {
        let mut buf = CommandBuf::new();
        buf.push(byte).expect("fits");
        buf
    }

    #[test]
    fn unbatched_send_flushes_immediately() {
        let channel = OutgoingChannel::new(Vec::new());
        channel.send(cmd(0x23)).unwrap();
        assert_eq!(channel.inner.lock().unwrap().writer, vec![0x23]);
    }

    #[test]
    fn batch_defers_flush_until_outermost_exit() {
        let channel = OutgoingChannel::new(Vec::new());
        channel
            .batch(|| -> Result<()> {
                channel.send(cmd(0x01))?;
                channel.batch(|| channel.send(cmd(0x02)))?;
                // Nothing has reached the writer yet: the inner batch's
                // flush was deferred to the outer one, which hasn't exited.
                assert!(channel.inner.lock().unwrap().writer.is_empty());
                Ok(())
            })
            .unwrap();
        assert_eq!(channel.inner.lock().unwrap().writer, vec![0x01, 0x02]);
    }

    #[test]
    fn reentrant_send_from_two_threads_interleaves_at_command_boundaries() {
        use std::sync::Arc;
        use std::thread;

        let channel = Arc::new(OutgoingChannel::new(Vec::new()));
        let a = Arc::clone(&channel);
        let b = Arc::clone(&channel);
        let t1 = thread::spawn(move || {
            for _ in 0..50 {
                a.send(cmd(0xAA)).unwrap();
            }
        });
        let t2 = thread::spawn(move || {
            for _ in 0..50 {
                b.send(cmd(0xBB)).unwrap();
            }
        });
        t1.join().unwrap();
        t2.join().unwrap();
        let written = channel.inner.lock().unwrap().writer.clone();
        assert_eq!(written.len(), 100);
        assert_eq!(written.iter().filter(|&&b| b == 0xAA).count(), 50);
        assert_eq!(written.iter().filter(|&&b| b == 0xBB).count(), 50);
    }
}
