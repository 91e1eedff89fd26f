//! Crate-wide error type.
//!
//! Mirrors the seven error kinds from the protocol design: local validation
//! failures surface immediately without wire traffic; stream I/O failures
//! become [`IoioError::ConnectionLost`] from the offending call site.

use thiserror_no_std::Error;

/// Errors produced by the protocol engine and the facades built on it.
#[derive(Debug, Error)]
pub enum IoioError {
    /// The transport is down, or the session has already torn down.
    /// Every blocked waiter observes this; the session becomes terminal.
    #[error("connection lost")]
    ConnectionLost,

    /// The board reported an interface id the host does not support.
    #[error("incompatible firmware interface")]
    Incompatible,

    /// A pin or peripheral-instance pool was exhausted, or the requested pin
    /// is already owned. Nothing was allocated.
    #[error("out of resources")]
    OutOfResource,

    /// The operation is not legal in the session's current state (e.g.
    /// issued before `wait_for_connect`, or after `disconnect`).
    #[error("illegal state")]
    IllegalState,

    /// An argument violates a hardware or wire-format constraint (pin lacks
    /// the needed capability, buffer too large, frequency out of range).
    #[error("illegal argument: {0}")]
    IllegalArgument(&'static str),

    /// A blocked waiter was cancelled via [`crate::resource_state::Cancellable::interrupt`].
    #[error("interrupted")]
    Interrupted,

    /// An unrecognised opcode or a magic-string mismatch was observed on the
    /// wire. Always escalated to [`IoioError::ConnectionLost`] by the
    /// dispatcher after being logged.
    #[error("protocol error: {0}")]
    Protocol(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, IoioError>;
