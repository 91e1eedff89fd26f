use std::sync::Arc;

use ioio_core::error::Result;
use ioio_core::resource_state::StreamState;

use crate::board::Session;

/// An open UART module.
pub struct Uart {
    session: Arc<Session>,
    uart: u8,
    tx_pin: u8,
    rx_pin: u8,
    state: Arc<StreamState>,
}

impl Uart {
    pub(crate) fn new(session: Arc<Session>, uart: u8, tx_pin: u8, rx_pin: u8, state: Arc<StreamState>) -> Self {
        Uart {
            session,
            uart,
            tx_pin,
            rx_pin,
            state,
        }
    }

    /// Writes bytes, splitting into `UART_DATA`-sized chunks as needed.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        self.session.uart_write(self.uart, data)
    }

    /// Reads up to `buf.len()` bytes already delivered by the dispatcher,
    /// blocking until at least one is available.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.state.read(buf)
    }

    /// Blocks until the device reports every outstanding TX byte has left
    /// the wire.
    pub fn wait_for_tx_drained(&self) -> Result<()> {
        self.state.wait_for_tx_drained()
    }

    /// The module id allocated for this UART.
    #[must_use]
    pub fn id(&self) -> u8 {
        self.uart
    }
}

impl Drop for Uart {
    fn drop(&mut self) {
        let _ = self.session.close_uart(self.uart, self.tx_pin, self.rx_pin);
    }
}
