//! Central event-bus registry (§9 design note: "Re-architect as a central
//! event bus keyed by `(kind, id)`; facades register/unregister
//! subscriptions; no back-references are retained by the dispatcher").
//!
//! The dispatcher looks resources up here by [`ResourceKey`] to deliver
//! events; facades insert on open and remove on close. Every entry is a
//! plain `Arc<...State>` data object from [`crate::resource_state`] — never
//! a trait object pointing back at a facade — so there is no cycle to leak
//! or to reason about across threads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::resource_state::{
    IcspState, IncapState, PinInputState, SampledInputState, SequencerState, SpiState, StreamState,
    TwiState,
};
use crate::resources::ResourceKey;

/// The live per-resource state object registered for one open resource.
#[derive(Clone)]
pub enum ResourceState {
    /// A pin opened as digital input.
    PinInput(Arc<PinInputState>),
    /// A pin opened for analog sampling.
    AnalogInput(Arc<SampledInputState>),
    /// A pin opened for capacitive-sense sampling.
    CapSense(Arc<SampledInputState>),
    /// A UART module.
    Uart(Arc<StreamState>),
    /// An SPI module.
    Spi(Arc<SpiState>),
    /// A TWI/I2C module.
    Twi(Arc<TwiState>),
    /// The ICSP master.
    Icsp(Arc<IcspState>),
    /// An input-capture channel (single or double).
    Incap(Arc<IncapState>),
    /// The cue sequencer.
    Sequencer(Arc<SequencerState>),
}

impl ResourceState {
    /// Wakes every waiter on this resource with [`crate::error::IoioError::ConnectionLost`].
    /// Used when the whole session tears down.
    pub fn mark_disconnected(&self) {
        self.cancellable().mark_disconnected();
    }

    /// Wakes every waiter on this resource with [`crate::error::IoioError::IllegalState`],
    /// as if the resource had been closed. Used on device-initiated
    /// `SOFT_RESET` (§9: resources are released *before* waiters are
    /// signalled — the registry entry is already removed by the time this
    /// runs).
    pub fn mark_soft_reset(&self) {
        self.cancellable().mark_soft_reset();
    }

    fn cancellable(&self) -> &crate::resource_state::Cancellable {
        match self {
            ResourceState::PinInput(s) => s.cancellable(),
            ResourceState::AnalogInput(s) | ResourceState::CapSense(s) => s.cancellable(),
            ResourceState::Uart(s) => s.cancellable(),
            ResourceState::Spi(s) => s.stream.cancellable(),
            ResourceState::Twi(s) => s.stream.cancellable(),
            ResourceState::Icsp(s) => s.cancellable(),
            ResourceState::Incap(s) => s.cancellable(),
            ResourceState::Sequencer(s) => s.cancellable(),
        }
    }
}

/// The central map from open resource descriptor to its state object.
pub struct Registry {
    inner: Mutex<HashMap<ResourceKey, ResourceState>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Registry {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `state` under `key`. Callers must have already claimed
    /// `key` with the resource manager; this never overwrites a live entry
    /// silently in practice because the resource manager's mutual-exclusion
    /// invariant (§3) guarantees a key is removed before it is reused.
    pub fn insert(&self, key: ResourceKey, state: ResourceState) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.insert(key, state);
        }
    }

    /// Looks up the state object registered for `key`, if any.
    #[must_use]
    pub fn get(&self, key: ResourceKey) -> Option<ResourceState> {
        self.inner.lock().ok()?.get(&key).cloned()
    }

    /// Removes and returns the state object registered for `key`.
    pub fn remove(&self, key: ResourceKey) -> Option<ResourceState> {
        self.inner.lock().ok()?.remove(&key)
    }

    /// Removes every entry, marking each one disconnected. Used by
    /// `disconnect` (§3 invariant: "On `disconnect` every resource state's
    /// disconnect flag is true and every waiter is released with
    /// connection-lost").
    pub fn disconnect_all(&self) {
        let drained: Vec<ResourceState> = match self.inner.lock() {
            Ok(mut inner) => inner.drain().map(|(_, v)| v).collect(),
            Err(_) => return,
        };
        for state in drained {
            state.mark_disconnected();
        }
    }

    /// Removes every entry, marking each one soft-reset rather than
    /// disconnected. Used by `soft_reset` (§9: resources are freed *before*
    /// waiters observe the signal, which this does by draining the map
    /// first and notifying only afterwards).
    pub fn soft_reset_all(&self) {
        let drained: Vec<ResourceState> = match self.inner.lock() {
            Ok(mut inner) => inner.drain().map(|(_, v)| v).collect(),
            Err(_) => return,
        };
        for state in drained {
            state.mark_soft_reset();
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resource_state::PinInputState;

    #[test]
    fn insert_then_get_round_trips() {
        let registry = Registry::new();
        let key = ResourceKey::Pin(13);
        registry.insert(key, ResourceState::PinInput(Arc::new(PinInputState::new())));
        assert!(registry.get(key).is_some());
        assert!(registry.remove(key).is_some());
        assert!(registry.get(key).is_none());
    }

    #[test]
    fn disconnect_all_empties_the_map() {
        let registry = Registry::new();
        registry.insert(
            ResourceKey::Pin(1),
            ResourceState::PinInput(Arc::new(PinInputState::new())),
        );
        registry.disconnect_all();
        assert!(registry.get(ResourceKey::Pin(1)).is_none());
    }
}
