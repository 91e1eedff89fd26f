use std::sync::Arc;

use ioio_core::error::Result;
use ioio_core::resource_state::{SpiResponse, SpiState};

use crate::board::Session;

/// An open SPI master module.
pub struct SpiMaster {
    session: Arc<Session>,
    spi: u8,
    state: Arc<SpiState>,
}

impl SpiMaster {
    pub(crate) fn new(session: Arc<Session>, spi: u8, state: Arc<SpiState>) -> Self {
        SpiMaster { session, spi, state }
    }

    /// Issues one transaction against `ss_pin`, blocking for the response
    /// (§4.6: requests on a module complete strictly in the order issued).
    pub fn transceive(
        &self,
        ss_pin: u8,
        total: u8,
        data_count: Option<u8>,
        resp_count: Option<u8>,
        payload: &[u8],
    ) -> Result<SpiResponse> {
        self.session
            .spi_transceive(self.spi, ss_pin, total, data_count, resp_count, payload, &self.state)
    }

    /// The module id allocated for this SPI bus.
    #[must_use]
    pub fn id(&self) -> u8 {
        self.spi
    }
}

impl Drop for SpiMaster {
    fn drop(&mut self) {
        self.session.close_spi(self.spi);
    }
}
