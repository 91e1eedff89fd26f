use std::sync::Arc;

use ioio_core::error::Result;
use ioio_core::resource_state::SampledInputState;

use crate::board::Session;

/// A pin opened for analog sampling.
pub struct AnalogInput {
    session: Arc<Session>,
    pin: u8,
    state: Arc<SampledInputState>,
    generation: u64,
}

impl AnalogInput {
    pub(crate) fn new(session: Arc<Session>, pin: u8, state: Arc<SampledInputState>) -> Self {
        AnalogInput {
            session,
            pin,
            state,
            generation: 0,
        }
    }

    /// The last reported sample, in raw ADC counts.
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

impl Drop for AnalogInput {
    fn drop(&mut self) {
        let _ = self.session.close_analog_in(self.pin);
    }
}
