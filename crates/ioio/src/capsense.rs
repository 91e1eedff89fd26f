use std::sync::Arc;

use ioio_core::error::Result;
use ioio_core::resource_state::SampledInputState;

use crate::board::Session;

/// A pin opened for capacitive-sense sampling.
pub struct CapSense {
    session: Arc<Session>,
    pin: u8,
    state: Arc<SampledInputState>,
    generation: u64,
}

impl CapSense {
    pub(crate) fn new(session: Arc<Session>, pin: u8, state: Arc<SampledInputState>) -> Self {
        CapSense {
            session,
            pin,
            state,
            generation: 0,
        }
    }

    /// The last reported sample.
    pub fn read(&self) -> Result<u16> {
        self.state.read()
    }

    /// Blocks for the next sample that differs from the last one observed.
    pub fn wait_for_change(&mut self) -> Result<u16> {
        let (value, generation) = self.state.wait_for_change(self.generation)?;
        self.generation = generation;
        Ok(value)
    }

    /// The pin number this handle samples.
    #[must_use]
    pub fn pin(&self) -> u8 {
        self.pin
    }
}

impl Drop for CapSense {
    fn drop(&mut self) {
        let _ = self.session.close_cap_sense(self.pin);
    }
}
