use std::sync::Arc;

use ioio_core::codec::TwiTransactionOutcome;
use ioio_core::error::Result;
use ioio_core::resource_state::TwiState;

use crate::board::Session;

/// An open I2C/TWI master module.
pub struct TwiMaster {
    session: Arc<Session>,
    i2c: u8,
    state: Arc<TwiState>,
}

impl TwiMaster {
    pub(crate) fn new(session: Arc<Session>, i2c: u8, state: Arc<TwiState>) -> Self {
        TwiMaster { session, i2c, state }
    }

    /// Issues one write-then-read transaction, blocking for the result.
    pub fn write_read(
        &self,
        address: u16,
        ten_bit: bool,
        write_data: &[u8],
        read_size: u8,
    ) -> Result<TwiTransactionOutcome> {
        self.session
            .twi_write_read(self.i2c, address, ten_bit, write_data, read_size, &self.state)
    }

    /// The module id allocated for this TWI bus.
    #[must_use]
    pub fn id(&self) -> u8 {
        self.i2c
    }
}

impl Drop for TwiMaster {
    fn drop(&mut self) {
        self.session.close_twi(self.i2c);
    }
}
