use std::sync::Arc;

use ioio_core::error::Result;
use ioio_core::resource_state::IncapState;

use crate::board::Session;

/// A single-edge input-capture channel.
pub struct IncapSingle {
    session: Arc<Session>,
    pin: u8,
    incap_num: u8,
    state: Arc<IncapState>,
    generation: u64,
}

impl IncapSingle {
    pub(crate) fn new(session: Arc<Session>, pin: u8, incap_num: u8, state: Arc<IncapState>) -> Self {
        IncapSingle {
            session,
            pin,
            incap_num,
            state,
            generation: 0,
        }
    }

    /// Blocks for the next capture report, returning its raw timer bytes.
    pub fn wait_for_capture(&mut self) -> Result<heapless::Vec<u8, 4>> {
        let (value, generation) = self.state.wait_for_capture(self.generation)?;
        self.generation = generation;
        Ok(value)
    }
}

impl Drop for IncapSingle {
    fn drop(&mut self) {
        self.session.close_incap_single(self.pin, self.incap_num);
    }
}

/// A dual-edge (double) input-capture pair spanning two pins.
pub struct IncapDouble {
    session: Arc<Session>,
    pin_a: u8,
    pin_b: u8,
    low: u8,
    high: u8,
    state: Arc<IncapState>,
    generation: u64,
}

impl IncapDouble {
    pub(crate) fn new(
        session: Arc<Session>,
        pin_a: u8,
        pin_b: u8,
        low: u8,
        high: u8,
        state: Arc<IncapState>,
    ) -> Self {
        IncapDouble {
            session,
            pin_a,
            pin_b,
            low,
            high,
            state,
            generation: 0,
        }
    }

    /// Blocks for the next capture report.
    pub fn wait_for_capture(&mut self) -> Result<heapless::Vec<u8, 4>> {
        let (value, generation) = self.state.wait_for_capture(self.generation)?;
        self.generation = generation;
        Ok(value)
    }
}

impl Drop for IncapDouble {
    fn drop(&mut self) {
        self.session
            .close_incap_double(self.pin_a, self.pin_b, self.low, self.high);
    }
}
