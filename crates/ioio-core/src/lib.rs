//! Protocol engine for talking to an IOIO board over any duplex byte stream.
//!
//! This crate owns the wire codec, the connection lifecycle, and the
//! blocking per-resource state machinery (components C1-C7). It does not
//! know about USB, Bluetooth, or TCP specifically — see
//! [`Transport`](transport::Transport) — and it does not expose a
//! user-facing API shaped like a single pin or peripheral; that is the
//! `ioio` crate's job. [`session::IoioSession`] is the one type most callers
//! of this crate need.

pub mod capability;
pub mod channel;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod opcode;
pub mod registry;
pub mod resource_state;
pub mod resources;
pub mod session;
pub mod state_machine;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod mocks;

pub use error::{IoioError, Result};
pub use session::IoioSession;
pub use transport::Transport;
