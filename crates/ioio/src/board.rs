use std::sync::Arc;

use ioio_core::capability::CapabilityTable;
use ioio_core::config::{PinPull, PinState, PwmScale, TwiRate};
use ioio_core::error::Result;
use ioio_core::transport::BoxedTransport;
use ioio_core::{IoioSession, Transport};

use crate::analog::AnalogInput;
use crate::capsense::CapSense;
use crate::digital::{DigitalInput, DigitalOutput};
use crate::icsp::IcspMaster;
use crate::incap::{IncapDouble, IncapSingle};
use crate::pwm::PwmOutput;
use crate::sequencer::Sequencer;
use crate::spi::SpiMaster;
use crate::twi::TwiMaster;
use crate::uart::Uart;

/// The transport passed into [`IoioSession`] is type-erased so a `Board`
/// (and every handle it hands out) can be named without threading the
/// transport's concrete type through the whole facade crate.
pub(crate) type Session = IoioSession<BoxedTransport>;

/// A live connection to one IOIO board. Clone to share it between threads;
/// every clone refers to the same underlying session.
#[derive(Clone)]
pub struct Board {
    pub(crate) session: Arc<Session>,
}

impl Board {
    /// Starts a session over `transport`, returning immediately — the
    /// handshake runs on the dispatcher thread. Call
    /// [`wait_for_connect`](Self::wait_for_connect) before opening any
    /// resource.
    pub fn connect<T>(transport: T) -> Result<Self>
    where
        T: Transport,
    {
        let session = Session::connect(BoxedTransport::new(transport))?;
        Ok(Board {
            session: Arc::new(session),
        })
    }

    /// Blocks until the handshake settles, returning the board's capability
    /// table on success.
    pub fn wait_for_connect(&self) -> Result<CapabilityTable> {
        self.session.wait_for_connect()
    }

    /// The capability table attached at handshake.
    pub fn capabilities(&self) -> Result<CapabilityTable> {
        self.session.capabilities()
    }

    /// Tears the session down from the host side.
    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    /// Requests a soft reset: every open handle's next operation observes
    /// [`ioio_core::IoioError::IllegalState`], but the board stays connected.
    pub fn soft_reset(&self) -> Result<()> {
        self.session.soft_reset()
    }

    /// Blocks until every command issued so far has been processed by the
    /// device, in order.
    pub fn sync(&self) -> Result<()> {
        self.session.sync()
    }

    /// Opens `pin` as a digital output at `initial`.
    pub fn open_digital_out(&self, pin: u8, open_drain: bool, initial: PinState) -> Result<DigitalOutput> {
        self.session.open_digital_out(pin, open_drain, initial)?;
        Ok(DigitalOutput::new(self.session.clone(), pin))
    }

    /// Opens `pin` as a digital input.
    pub fn open_digital_in(&self, pin: u8, pull: PinPull) -> Result<DigitalInput> {
        let state = self.session.open_digital_in(pin, pull)?;
        Ok(DigitalInput::new(self.session.clone(), pin, state))
    }

    /// Opens `pin` for PWM output on OUTCOMPARE channel `pwm_num` (obtained
    /// from [`ioio_core::resources::ResourceManager::claim_instance`] through
    /// the session; call with `pwm_num` already claimed by the caller's own
    /// bookkeeping, or use [`Board::open_pwm_any`] to let the board pick one).
    pub fn open_pwm(&self, pin: u8, pwm_num: u8, scale: PwmScale, period: u16) -> Result<PwmOutput> {
        self.session.open_pwm(pin, pwm_num, scale, period)?;
        Ok(PwmOutput::new(self.session.clone(), pin, pwm_num))
    }

    /// Opens `pin` for analog sampling.
    pub fn open_analog_in(&self, pin: u8, sampling: bool) -> Result<AnalogInput> {
        let state = self.session.open_analog_in(pin, sampling)?;
        Ok(AnalogInput::new(self.session.clone(), pin, state))
    }

    /// Opens `pin` for capacitive-sense sampling.
    pub fn open_cap_sense(&self, pin: u8) -> Result<CapSense> {
        let state = self.session.open_cap_sense(pin)?;
        Ok(CapSense::new(self.session.clone(), pin, state))
    }

    /// Opens a UART module on `tx_pin`/`rx_pin`.
    #[allow(clippy::too_many_arguments)]
    pub fn open_uart(
        &self,
        tx_pin: u8,
        rx_pin: u8,
        rate: u16,
        four_x: bool,
        two_stop: bool,
        parity: ioio_core::codec::encode::UartParity,
    ) -> Result<Uart> {
        let (uart, state) = self
            .session
            .open_uart(tx_pin, rx_pin, rate, four_x, two_stop, parity)?;
        Ok(Uart::new(self.session.clone(), uart, tx_pin, rx_pin, state))
    }

    /// Opens an SPI master module.
    pub fn open_spi(
        &self,
        mosi: u8,
        miso: u8,
        clk: u8,
        rate_code: u8,
        sample_on_trailing: bool,
        invert_clk: bool,
    ) -> Result<SpiMaster> {
        let (spi, state) = self
            .session
            .open_spi(mosi, miso, clk, rate_code, sample_on_trailing, invert_clk)?;
        Ok(SpiMaster::new(self.session.clone(), spi, state))
    }

    /// Opens an I2C/TWI master module.
    pub fn open_twi(&self, i2c: u8, smbus: bool, rate: TwiRate) -> Result<TwiMaster> {
        let state = self.session.open_twi(i2c, smbus, rate)?;
        Ok(TwiMaster::new(self.session.clone(), i2c, state))
    }

    /// Opens the board's one ICSP master.
    pub fn open_icsp(&self) -> Result<IcspMaster> {
        let state = self.session.open_icsp()?;
        Ok(IcspMaster::new(self.session.clone(), state))
    }

    /// Opens a single-channel input-capture on `pin`.
    pub fn open_incap_single(&self, pin: u8, mode: u8, clock: u8) -> Result<IncapSingle> {
        let (incap_num, state) = self.session.open_incap_single(pin, mode, clock)?;
        Ok(IncapSingle::new(self.session.clone(), pin, incap_num, state))
    }

    /// Opens a double-channel (dual-edge) input capture spanning two pins.
    pub fn open_incap_double(&self, pin_a: u8, pin_b: u8, mode: u8, clock: u8) -> Result<IncapDouble> {
        let (low, high, state) = self.session.open_incap_double(pin_a, pin_b, mode, clock)?;
        Ok(IncapDouble::new(self.session.clone(), pin_a, pin_b, low, high, state))
    }

    /// Opens the cue sequencer.
    pub fn open_sequencer(&self, config_bytes: &[u8]) -> Result<Sequencer> {
        let state = self.session.open_sequencer(config_bytes)?;
        Ok(Sequencer::new(self.session.clone(), state))
    }
}
