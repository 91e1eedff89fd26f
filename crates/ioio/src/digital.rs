use std::sync::Arc;

use ioio_core::config::PinState;
use ioio_core::error::Result;
use ioio_core::resource_state::PinInputState;

use crate::board::Session;

/// A pin opened for digital output. Closing (drop) releases the pin and
/// lets the board reclaim it as an input.
pub struct DigitalOutput {
    session: Arc<Session>,
    pin: u8,
}

impl DigitalOutput {
    pub(crate) fn new(session: Arc<Session>, pin: u8) -> Self {
        DigitalOutput { session, pin }
    }

    /// Sets the pin's level.
    pub fn write(&self, value: PinState) -> Result<()> {
        self.session.set_digital_out_level(self.pin, value)
    }

    /// The pin number this handle drives.
    #[must_use]
    pub fn pin(&self) -> u8 {
        self.pin
    }
}

impl Drop for DigitalOutput {
    fn drop(&mut self) {
        self.session.close_pin(self.pin);
    }
}

/// A pin opened for digital input, with change-notify support.
pub struct DigitalInput {
    session: Arc<Session>,
    pin: u8,
    state: Arc<PinInputState>,
    generation: u64,
}

impl DigitalInput {
    pub(crate) fn new(session: Arc<Session>, pin: u8, state: Arc<PinInputState>) -> Self {
        DigitalInput {
            session,
            pin,
            state,
            generation: 0,
        }
    }

    /// The pin's last reported level.
    pub fn read(&self) -> Result<bool> {
        self.state.read()
    }

    /// Arms or disarms change-notify reporting.
    pub fn set_change_notify(&self, notify: bool) -> Result<()> {
        self.session.set_change_notify(self.pin, notify)
    }

    /// Blocks until the level changes from what it was at the last call to
    /// `read` or `wait_for_change`, then returns the new level.
    pub fn wait_for_change(&mut self) -> Result<bool> {
        let (value, generation) = self.state.wait_for_change(self.generation)?;
        self.generation = generation;
        Ok(value)
    }

    /// The pin number this handle reads.
    #[must_use]
    pub fn pin(&self) -> u8 {
        self.pin
    }
}

impl Drop for DigitalInput {
    fn drop(&mut self) {
        self.session.close_pin(self.pin);
    }
}
