//! Connection state machine (C5, §4.5): `INIT -> (CONNECTED | INCOMPATIBLE |
//! DEAD)`.
//!
//! The transitions themselves are driven by [`crate::session::IoioSession`]
//! (they need the transport, the outgoing channel, and the registry all at
//! once); this module owns just the state value and the legality checks, so
//! every call site asks the same question the same way instead of matching
//! on the enum ad hoc.

use std::sync::{Condvar, Mutex};

use crate::capability::CapabilityTable;
use crate::error::{IoioError, Result};

/// The session's connection lifecycle state (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, not yet connected.
    Init,
    /// Handshake complete; the capability table is attached and operations
    /// are live.
    Connected,
    /// The board rejected the required interface id. Terminal.
    Incompatible,
    /// The transport is down, or [`crate::session::IoioSession::disconnect`]
    /// has completed. Terminal.
    Dead,
}

/// Thread-safe holder for the current [`ConnectionState`], guarded by the
/// session mutex per the lock order in §5 ("session -> resource-state ->
/// outgoing-channel").
pub struct StateMachine {
    inner: Mutex<ConnectionState>,
    condvar: Condvar,
}

impl StateMachine {
    /// Creates a state machine in [`ConnectionState::Init`].
    #[must_use]
    pub fn new() -> Self {
        StateMachine {
            inner: Mutex::new(ConnectionState::Init),
            condvar: Condvar::new(),
        }
    }

    /// Blocks until the state leaves [`ConnectionState::Init`], then returns
    /// the resulting state. Used by `IoioSession::wait_for_connect`.
    pub fn wait_until_settled(&self) -> Result<ConnectionState> {
        let guard = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        let guard = self
            .condvar
            .wait_while(guard, |s| *s == ConnectionState::Init)
            .map_err(|_| IoioError::ConnectionLost)?;
        Ok(*guard)
    }

    /// The current state.
    #[must_use]
    pub fn current(&self) -> ConnectionState {
        self.inner
            .lock()
            .map(|s| *s)
            .unwrap_or(ConnectionState::Dead)
    }

    /// Transitions to CONNECTED. Only legal from INIT.
    pub fn mark_connected(&self) -> Result<()> {
        let mut state = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        if *state != ConnectionState::Init {
            return Err(IoioError::IllegalState);
        }
        *state = ConnectionState::Connected;
        drop(state);
        self.condvar.notify_all();
        Ok(())
    }

    /// Transitions to INCOMPATIBLE. Only legal from INIT.
    pub fn mark_incompatible(&self) -> Result<()> {
        let mut state = self.inner.lock().map_err(|_| IoioError::ConnectionLost)?;
        if *state != ConnectionState::Init {
            return Err(IoioError::IllegalState);
        }
        *state = ConnectionState::Incompatible;
        drop(state);
        self.condvar.notify_all();
        Ok(())
    }

    /// Transitions to DEAD unconditionally. Legal from any state (`disconnect`
    /// is idempotent; a transport failure during INIT also lands here).
    pub fn mark_dead(&self) {
        if let Ok(mut state) = self.inner.lock() {
            *state = ConnectionState::Dead;
        }
        self.condvar.notify_all();
    }

    /// Fails fast for any operation that requires an established,
    /// still-live connection (everything except `wait_for_connect`,
    /// `disconnect`, and `wait_for_disconnect`).
    pub fn require_connected(&self) -> Result<()> {
        match self.current() {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Dead => Err(IoioError::ConnectionLost),
            ConnectionState::Incompatible | ConnectionState::Init => Err(IoioError::IllegalState),
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Handshake metadata captured from `ESTABLISH_CONNECTION` (§4.3), held
/// alongside the attached [`CapabilityTable`] once the board model is known.
pub struct BoardIdentity {
    /// Hardware revision id, 8 ASCII bytes.
    pub hardware_id: [u8; 8],
    /// Bootloader version id, 8 ASCII bytes.
    pub bootloader_id: [u8; 8],
    /// Firmware version id, 8 ASCII bytes.
    pub firmware_id: [u8; 8],
    /// The capability table resolved from `hardware_id`.
    pub capabilities: CapabilityTable,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn init_to_connected_then_require_connected_succeeds() {
        let sm = StateMachine::new();
        sm.mark_connected().unwrap();
        assert_eq!(sm.current(), ConnectionState::Connected);
        sm.require_connected().unwrap();
    }

    #[test]
    fn connecting_twice_is_illegal() {
        let sm = StateMachine::new();
        sm.mark_connected().unwrap();
        assert!(matches!(sm.mark_connected(), Err(IoioError::IllegalState)));
    }

    #[test]
    fn incompatible_is_terminal_and_illegal_not_connection_lost() {
        let sm = StateMachine::new();
        sm.mark_incompatible().unwrap();
        assert!(matches!(
            sm.require_connected(),
            Err(IoioError::IllegalState)
        ));
    }

    #[test]
    fn wait_until_settled_unblocks_on_connect() {
        use std::sync::Arc;
        use std::thread;
        use std::time::Duration;

        let sm = Arc::new(StateMachine::new());
        let waiter = Arc::clone(&sm);
        let handle = thread::spawn(move || waiter.wait_until_settled());
        thread::sleep(Duration::from_millis(20));
        sm.mark_connected().unwrap();
        let settled = handle.join().unwrap().unwrap();
        assert_eq!(settled, ConnectionState::Connected);
    }

    #[test]
    fn dead_is_connection_lost() {
        let sm = StateMachine::new();
        sm.mark_connected().unwrap();
        sm.mark_dead();
        assert!(matches!(
            sm.require_connected(),
            Err(IoioError::ConnectionLost)
        ));
    }
}
