//! `IoioSession`: the single entry point most callers of this crate need.
//!
//! Owns everything the components need to cooperate: a transport clone
//! dedicated to writing (wrapped by [`OutgoingChannel`]), the dispatcher
//! thread's join handle, the [`Registry`] (C3's event-bus target), the
//! [`ResourceManager`] (C4), and the [`StateMachine`] (C5). Facade crates
//! (`ioio`) are built entirely on the public methods here; none of them
//! reach into `ioio-core`'s internals directly.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::capability::CapabilityTable;
use crate::channel::OutgoingChannel;
use crate::codec::encode::{self, SequencerAction, SpiPinFunction, UartParity};
use crate::codec::TwiTransactionOutcome;
use crate::config::{PinPull, PinState, PwmScale, TwiRate};
use crate::dispatcher::{self, DispatcherContext};
use crate::error::{IoioError, Result};
use crate::registry::{Registry, ResourceState};
use crate::resource_state::{
    deadline_from, Cancellable, IcspState, IncapState, PendingQueue, PinInputState,
    SampledInputState, SequencerState, SpiResponse, SpiState, StreamState, TransactionState,
    TwiState,
};
use crate::resources::{ResourceKey, ResourceKind, ResourceManager};
use crate::state_machine::{BoardIdentity, ConnectionState, StateMachine};
use crate::transport::Transport;

/// A live connection to one IOIO board over one transport.
///
/// `T` is the transport's concrete type; callers normally never name it,
/// since [`IoioSession::connect`] infers it from the value they pass in. Use
/// [`crate::transport::BoxedTransport`] to erase it when a facade needs a
/// single non-generic session type.
pub struct IoioSession<T: Transport> {
    channel: Arc<OutgoingChannel<T>>,
    registry: Arc<Registry>,
    resources: Arc<Mutex<Option<ResourceManager>>>,
    state: Arc<StateMachine>,
    board: Arc<Mutex<Option<BoardIdentity>>>,
    sync_waiter: Arc<TransactionState<()>>,
    dispatcher: Option<std::thread::JoinHandle<()>>,
    disconnect_transport: Mutex<Option<T>>,
}

impl<T: Transport> IoioSession<T> {
    /// Starts a session over `transport`: dials the link, then spawns the
    /// dispatcher thread immediately. The handshake runs on that thread, so
    /// this call returns right away and
    /// [`wait_for_connect`](Self::wait_for_connect) is what blocks for it to
    /// finish.
    pub fn connect(mut transport: T) -> Result<Self> {
        transport
            .wait_for_connect()
            .map_err(|_| IoioError::ConnectionLost)?;
        let reader = transport
            .try_clone()
            .map_err(|_| IoioError::ConnectionLost)?;
        let writer = transport
            .try_clone()
            .map_err(|_| IoioError::ConnectionLost)?;

        let channel = Arc::new(OutgoingChannel::new(writer));
        let registry = Arc::new(Registry::new());
        let state = Arc::new(StateMachine::new());
        let board = Arc::new(Mutex::new(None));
        let resources = Arc::new(Mutex::new(None));
        let sync_waiter = Arc::new(TransactionState::new());

        let ctx = DispatcherContext {
            registry: Arc::clone(&registry),
            state: Arc::clone(&state),
            channel: Arc::clone(&channel),
            board: Arc::clone(&board),
            resources: Arc::clone(&resources),
            sync_waiter: Arc::clone(&sync_waiter),
        };
        let dispatcher = dispatcher::spawn(reader, ctx);

        Ok(IoioSession {
            channel,
            registry,
            resources,
            state,
            board,
            sync_waiter,
            dispatcher: Some(dispatcher),
            disconnect_transport: Mutex::new(Some(transport)),
        })
    }

    /// Blocks until the handshake completes, returning the attached
    /// [`CapabilityTable`] on success. Maps a board-rejected interface id to
    /// [`IoioError::Incompatible`] (distinct from the generic
    /// [`IoioError::IllegalState`] every other operation uses for "wrong
    /// state").
    pub fn wait_for_connect(&self) -> Result<CapabilityTable> {
        match self.state.wait_until_settled()? {
            ConnectionState::Connected => {
                let caps = self
                    .board
                    .lock()
                    .map_err(|_| IoioError::ConnectionLost)?
                    .as_ref()
                    .ok_or(IoioError::IllegalState)?
                    .capabilities
                    .clone();
                let mut resources = self.resources.lock().map_err(|_| IoioError::ConnectionLost)?;
                *resources = Some(ResourceManager::new(caps.clone()));
                Ok(caps)
            }
            ConnectionState::Incompatible => Err(IoioError::Incompatible),
            ConnectionState::Dead | ConnectionState::Init => Err(IoioError::ConnectionLost),
        }
    }

    /// The capability table attached at handshake, if connected.
    pub fn capabilities(&self) -> Result<CapabilityTable> {
        self.state.require_connected()?;
        self.board
            .lock()
            .map_err(|_| IoioError::ConnectionLost)?
            .as_ref()
            .map(|b| b.capabilities.clone())
            .ok_or(IoioError::IllegalState)
    }

    /// Tears the session down from the host side: wakes every blocked
    /// waiter with [`IoioError::ConnectionLost`] and disconnects the
    /// transport.
    pub fn disconnect(&self) {
        self.state.mark_dead();
        self.registry.disconnect_all();
        if let Ok(mut slot) = self.disconnect_transport.lock() {
            if let Some(mut transport) = slot.take() {
                if transport.can_close() {
                    transport.disconnect();
                } else if let Ok(cmd) = encode::soft_close() {
                    let _ = self.channel.send(cmd);
                }
            }
        }
    }

    /// Requests a device-initiated soft reset: every open resource is
    /// implicitly closed (waiters observe [`IoioError::IllegalState`]) but
    /// the session itself stays CONNECTED.
    pub fn soft_reset(&self) -> Result<()> {
        self.state.require_connected()?;
        self.channel.send(encode::soft_reset()?)?;
        self.registry.soft_reset_all();
        if let Ok(mut resources) = self.resources.lock() {
            if let Some(caps) = self.board.lock().ok().and_then(|b| b.as_ref().map(|b| b.capabilities.clone())) {
                *resources = Some(ResourceManager::new(caps));
            }
        }
        Ok(())
    }

    /// Sends `SYNC` and blocks until the device echoes it back, a barrier
    /// that every previously queued command has been processed in order.
    pub fn sync(&self) -> Result<()> {
        self.state.require_connected()?;
        self.channel.send(encode::sync()?)?;
        self.sync_waiter.wait_for_result()
    }

    fn with_resources<R>(&self, f: impl FnOnce(&ResourceManager) -> Result<R>) -> Result<R> {
        let guard = self.resources.lock().map_err(|_| IoioError::ConnectionLost)?;
        f(guard.as_ref().ok_or(IoioError::IllegalState)?)
    }

    // ---- digital I/O -----------------------------------------------------

    /// Opens `pin` as a digital output at `initial`, returning its state
    /// object. The caller (a facade handle) drives level changes by calling
    /// [`Self::set_digital_out_level`] and drops the claim via
    /// [`Self::close_pin`].
    pub fn open_digital_out(&self, pin: u8, open_drain: bool, initial: PinState) -> Result<()> {
        self.state.require_connected()?;
        self.with_resources(|r| r.claim_pin(pin))?;
        self.channel
            .send(encode::set_pin_digital_out(pin, open_drain, initial)?)
    }

    /// Changes the level of a pin already opened with
    /// [`Self::open_digital_out`].
    pub fn set_digital_out_level(&self, pin: u8, value: PinState) -> Result<()> {
        self.state.require_connected()?;
        self.channel.send(encode::set_digital_out_level(pin, value)?)
    }

    /// Opens `pin` as a digital input, registering its blocking state
    /// object so the dispatcher can route `REPORT_DIGITAL_IN_STATUS` events.
    pub fn open_digital_in(&self, pin: u8, pull: PinPull) -> Result<Arc<PinInputState>> {
        self.state.require_connected()?;
        self.with_resources(|r| r.claim_pin(pin))?;
        let state = Arc::new(PinInputState::new());
        self.registry
            .insert(ResourceKey::Pin(pin), ResourceState::PinInput(Arc::clone(&state)));
        self.channel.send(encode::set_pin_digital_in(pin, pull)?)?;
        Ok(state)
    }

    /// Arms or disarms change-notify for an open digital input.
    pub fn set_change_notify(&self, pin: u8, notify: bool) -> Result<()> {
        self.state.require_connected()?;
        self.channel.send(encode::set_change_notify(pin, notify)?)
    }

    /// Releases a pin claimed by [`Self::open_digital_out`] or
    /// [`Self::open_digital_in`].
    pub fn close_pin(&self, pin: u8) {
        self.registry.remove(ResourceKey::Pin(pin));
        if let Ok(resources) = self.resources.lock() {
            if let Some(r) = resources.as_ref() {
                r.release_pin(pin);
            }
        }
    }

    // ---- PWM ---------------------------------------------------------

    /// Opens `pin` for PWM output on OUTCOMPARE channel `pwm_num`.
    pub fn open_pwm(&self, pin: u8, pwm_num: u8, scale: PwmScale, period: u16) -> Result<()> {
        self.state.require_connected()?;
        self.with_resources(|r| r.claim_pin(pin))?;
        self.channel.batch(|| {
            self.channel.send(encode::set_pin_pwm(pin, true, pwm_num)?)?;
            self.channel.send(encode::set_pwm_period(pwm_num, scale, period)?)
        })
    }

    /// Sets the duty cycle of an open PWM channel.
    pub fn set_pwm_duty_cycle(&self, pwm_num: u8, fraction: u8, duty: u16) -> Result<()> {
        self.state.require_connected()?;
        self.channel
            .send(encode::set_pwm_duty_cycle(pwm_num, fraction, duty)?)
    }

    /// Closes a PWM channel opened with [`Self::open_pwm`].
    pub fn close_pwm(&self, pin: u8, pwm_num: u8) {
        self.registry.remove(ResourceKey::Pin(pin));
        let _ = self.channel.send(
            encode::set_pin_pwm(pin, false, pwm_num).unwrap_or_default(),
        );
        if let Ok(resources) = self.resources.lock() {
            if let Some(r) = resources.as_ref() {
                r.release_pin(pin);
                r.release_instance(ResourceKind::Outcompare, pwm_num);
            }
        }
    }

    // ---- analog input --------------------------------------------------

    /// Opens `pin` for analog sampling.
    pub fn open_analog_in(&self, pin: u8, sampling: bool) -> Result<Arc<SampledInputState>> {
        self.state.require_connected()?;
        self.with_resources(|r| r.claim_pin(pin))?;
        let state = Arc::new(SampledInputState::new());
        self.registry
            .insert(ResourceKey::Pin(pin), ResourceState::AnalogInput(Arc::clone(&state)));
        self.channel.batch(|| {
            self.channel.send(encode::set_pin_analog_in(pin)?)?;
            self.channel.send(encode::set_analog_in_sampling(pin, sampling)?)
        })?;
        Ok(state)
    }

    /// Closes an analog input opened with [`Self::open_analog_in`].
    pub fn close_analog_in(&self, pin: u8) -> Result<()> {
        self.registry.remove(ResourceKey::Pin(pin));
        self.channel.send(encode::set_analog_in_sampling(pin, false)?)?;
        if let Ok(resources) = self.resources.lock() {
            if let Some(r) = resources.as_ref() {
                r.release_pin(pin);
            }
        }
        Ok(())
    }

    // ---- capacitive sense ------------------------------------------------

    /// Opens `pin` for capacitive-sense sampling. There is no device echo
    /// for this open, so the open flag is set locally (§4.3: cap-sense has
    /// no `ModuleStatus`-style confirmation).
    pub fn open_cap_sense(&self, pin: u8) -> Result<Arc<SampledInputState>> {
        self.state.require_connected()?;
        self.with_resources(|r| r.claim_pin(pin))?;
        let state = Arc::new(SampledInputState::new());
        state.on_open(true);
        self.registry
            .insert(ResourceKey::Pin(pin), ResourceState::CapSense(Arc::clone(&state)));
        self.channel.batch(|| {
            self.channel.send(encode::set_pin_capsense(pin)?)?;
            self.channel.send(encode::set_capsense_sampling(pin, true)?)
        })?;
        Ok(state)
    }

    /// Closes a cap-sense pin opened with [`Self::open_cap_sense`].
    pub fn close_cap_sense(&self, pin: u8) -> Result<()> {
        self.registry.remove(ResourceKey::Pin(pin));
        self.channel.send(encode::set_capsense_sampling(pin, false)?)?;
        if let Ok(resources) = self.resources.lock() {
            if let Some(r) = resources.as_ref() {
                r.release_pin(pin);
            }
        }
        Ok(())
    }

    // ---- UART --------------------------------------------------------

    /// Opens a UART module, wiring `tx_pin`/`rx_pin` and configuring the
    /// rate. Returns the stream state the facade reads from and writes
    /// flow-control against.
    #[allow(clippy::too_many_arguments)]
    pub fn open_uart(
        &self,
        tx_pin: u8,
        rx_pin: u8,
        rate: u16,
        four_x: bool,
        two_stop: bool,
        parity: UartParity,
    ) -> Result<(u8, Arc<StreamState>)> {
        self.state.require_connected()?;
        let uart = self.with_resources(|r| r.claim_instance(ResourceKind::Uart))?;
        let state = Arc::new(StreamState::new());
        self.registry.insert(
            ResourceKey::Instance(ResourceKind::Uart, uart),
            ResourceState::Uart(Arc::clone(&state)),
        );
        self.channel.batch(|| {
            self.channel.send(encode::set_pin_uart(tx_pin, true, true, uart)?)?;
            self.channel.send(encode::set_pin_uart(rx_pin, true, false, uart)?)?;
            self.channel
                .send(encode::uart_config(uart, rate, four_x, two_stop, parity)?)
        })?;
        Ok((uart, state))
    }

    /// Writes bytes to an open UART module.
    pub fn uart_write(&self, uart: u8, data: &[u8]) -> Result<()> {
        self.state.require_connected()?;
        for chunk in data.chunks(crate::config::UART_DATA_MAX_BYTES) {
            self.channel.send(encode::uart_data(uart, chunk)?)?;
        }
        Ok(())
    }

    /// Closes a UART module opened with [`Self::open_uart`].
    pub fn close_uart(&self, uart: u8, tx_pin: u8, rx_pin: u8) -> Result<()> {
        self.registry.remove(ResourceKey::Instance(ResourceKind::Uart, uart));
        self.channel.batch(|| {
            self.channel.send(encode::set_pin_uart(tx_pin, false, true, uart)?)?;
            self.channel.send(encode::set_pin_uart(rx_pin, false, false, uart)?)?;
            self.channel
                .send(encode::uart_config(uart, 0, false, false, UartParity::None)?)
        })?;
        if let Ok(resources) = self.resources.lock() {
            if let Some(r) = resources.as_ref() {
                r.release_instance(ResourceKind::Uart, uart);
            }
        }
        Ok(())
    }

    // ---- SPI -----------------------------------------------------------

    /// Opens an SPI master module and wires its MOSI/MISO/CLK pins.
    pub fn open_spi(
        &self,
        mosi: u8,
        miso: u8,
        clk: u8,
        rate_code: u8,
        sample_on_trailing: bool,
        invert_clk: bool,
    ) -> Result<(u8, Arc<SpiState>)> {
        self.state.require_connected()?;
        let spi = self.with_resources(|r| r.claim_instance(ResourceKind::Spi))?;
        let state = Arc::new(SpiState::new());
        self.registry.insert(
            ResourceKey::Instance(ResourceKind::Spi, spi),
            ResourceState::Spi(Arc::clone(&state)),
        );
        self.channel.batch(|| {
            self.channel
                .send(encode::set_pin_spi(mosi, spi, SpiPinFunction::Mosi)?)?;
            self.channel
                .send(encode::set_pin_spi(miso, spi, SpiPinFunction::Miso)?)?;
            self.channel
                .send(encode::set_pin_spi(clk, spi, SpiPinFunction::Clk)?)?;
            self.channel.send(encode::spi_configure_master(
                spi,
                rate_code,
                sample_on_trailing,
                invert_clk,
            )?)
        })?;
        Ok((spi, state))
    }

    /// Issues one SPI master transaction on `spi` against slave-select
    /// `ss_pin`, blocking until the matching `SPI_DATA` response arrives
    /// (§4.6: FIFO-matched per module).
    pub fn spi_transceive(
        &self,
        spi: u8,
        ss_pin: u8,
        total: u8,
        data_count: Option<u8>,
        resp_count: Option<u8>,
        payload: &[u8],
        state: &SpiState,
    ) -> Result<SpiResponse> {
        self.state.require_connected()?;
        let slot = state.pending.push_request()?;
        self.channel.send(encode::spi_master_request(
            spi, ss_pin, total, data_count, resp_count, payload,
        )?)?;
        state.pending.wait_for(&slot)
    }

    /// Closes an SPI module opened with [`Self::open_spi`].
    pub fn close_spi(&self, spi: u8) {
        self.registry.remove(ResourceKey::Instance(ResourceKind::Spi, spi));
        let _ = self
            .channel
            .send(encode::spi_configure_master(spi, 0, true, false).unwrap_or_default());
        if let Ok(resources) = self.resources.lock() {
            if let Some(r) = resources.as_ref() {
                r.release_instance(ResourceKind::Spi, spi);
            }
        }
    }

    // ---- I2C/TWI ---------------------------------------------------------

    /// Opens an I2C/TWI master module on the board's fixed SDA/SCL pins for
    /// `i2c`.
    pub fn open_twi(&self, i2c: u8, smbus: bool, rate: TwiRate) -> Result<Arc<TwiState>> {
        self.state.require_connected()?;
        self.with_resources(|r| r.claim_instance(ResourceKind::Twi))?;
        let state = Arc::new(TwiState::new());
        self.registry.insert(
            ResourceKey::Instance(ResourceKind::Twi, i2c),
            ResourceState::Twi(Arc::clone(&state)),
        );
        self.channel
            .send(encode::i2c_configure_master(i2c, smbus, rate)?)?;
        Ok(state)
    }

    /// Issues one I2C write-then-read transaction, blocking for the result.
    pub fn twi_write_read(
        &self,
        i2c: u8,
        address: u16,
        ten_bit: bool,
        write_data: &[u8],
        read_size: u8,
        state: &TwiState,
    ) -> Result<TwiTransactionOutcome> {
        self.state.require_connected()?;
        let slot = state.pending.push_request()?;
        self.channel.send(encode::i2c_write_read(
            i2c, address, ten_bit, write_data, read_size,
        )?)?;
        state.pending.wait_for(&slot)
    }

    /// Closes a TWI module opened with [`Self::open_twi`].
    pub fn close_twi(&self, i2c: u8) {
        self.registry.remove(ResourceKey::Instance(ResourceKind::Twi, i2c));
        let _ = self.channel.send(
            encode::i2c_configure_master(i2c, false, TwiRate::Rate100k).unwrap_or_default(),
        );
        if let Ok(resources) = self.resources.lock() {
            if let Some(r) = resources.as_ref() {
                r.release_instance(ResourceKind::Twi, i2c);
            }
        }
    }

    // ---- ICSP ------------------------------------------------------------

    /// Opens the board's one ICSP master.
    pub fn open_icsp(&self) -> Result<Arc<IcspState>> {
        self.state.require_connected()?;
        self.with_resources(|r| r.claim_instance(ResourceKind::Icsp))?;
        let state = Arc::new(IcspState::new());
        self.registry.insert(
            ResourceKey::Instance(ResourceKind::Icsp, 0),
            ResourceState::Icsp(Arc::clone(&state)),
        );
        self.channel.send(encode::icsp_config(true)?)?;
        Ok(state)
    }

    /// Sends a 24-bit SIX instruction.
    pub fn icsp_six(&self, instruction: u32) -> Result<()> {
        self.state.require_connected()?;
        self.channel.send(encode::icsp_six(instruction)?)
    }

    /// Requests the next VISI register read, blocking for the result.
    pub fn icsp_regout(&self, state: &IcspState) -> Result<u16> {
        self.state.require_connected()?;
        self.channel.send(encode::icsp_regout()?)?;
        state.wait_visi_result()
    }

    /// Closes the ICSP master opened with [`Self::open_icsp`].
    pub fn close_icsp(&self) {
        self.registry.remove(ResourceKey::Instance(ResourceKind::Icsp, 0));
        let _ = self.channel.send(encode::icsp_config(false).unwrap_or_default());
        if let Ok(resources) = self.resources.lock() {
            if let Some(r) = resources.as_ref() {
                r.release_instance(ResourceKind::Icsp, 0);
            }
        }
    }

    // ---- input capture -----------------------------------------------------

    /// Opens a single-edge input-capture channel on `pin`.
    pub fn open_incap_single(&self, pin: u8, mode: u8, clock: u8) -> Result<(u8, Arc<IncapState>)> {
        self.state.require_connected()?;
        let incap_num = self.with_resources(|r| r.claim_instance(ResourceKind::IncapSingle))?;
        let state = Arc::new(IncapState::new());
        self.registry.insert(
            ResourceKey::Instance(ResourceKind::IncapSingle, incap_num),
            ResourceState::Incap(Arc::clone(&state)),
        );
        self.channel.batch(|| {
            self.channel.send(encode::set_pin_incap(pin, incap_num, true)?)?;
            self.channel.send(encode::incap_configure(incap_num, false, mode, clock)?)
        })?;
        Ok((incap_num, state))
    }

    /// Opens a dual-edge (double) input-capture pair spanning two pins.
    pub fn open_incap_double(
        &self,
        pin_a: u8,
        pin_b: u8,
        mode: u8,
        clock: u8,
    ) -> Result<(u8, u8, Arc<IncapState>)> {
        self.state.require_connected()?;
        let (low, high) = self.with_resources(|r| r.claim_incap_double())?;
        let state = Arc::new(IncapState::new());
        self.registry.insert(
            ResourceKey::Instance(ResourceKind::IncapSingle, low),
            ResourceState::Incap(Arc::clone(&state)),
        );
        self.channel.batch(|| {
            self.channel.send(encode::set_pin_incap(pin_a, low, true)?)?;
            self.channel.send(encode::set_pin_incap(pin_b, high, true)?)?;
            self.channel.send(encode::incap_configure(low, true, mode, clock)?)
        })?;
        Ok((low, high, state))
    }

    /// Closes a single-channel input capture opened with
    /// [`Self::open_incap_single`].
    pub fn close_incap_single(&self, pin: u8, incap_num: u8) {
        self.registry
            .remove(ResourceKey::Instance(ResourceKind::IncapSingle, incap_num));
        let _ = self.channel.send(encode::set_pin_incap(pin, incap_num, false).unwrap_or_default());
        if let Ok(resources) = self.resources.lock() {
            if let Some(r) = resources.as_ref() {
                r.release_instance(ResourceKind::IncapSingle, incap_num);
            }
        }
    }

    /// Closes a double-channel input capture opened with
    /// [`Self::open_incap_double`].
    pub fn close_incap_double(&self, pin_a: u8, pin_b: u8, low: u8, high: u8) {
        self.registry
            .remove(ResourceKey::Instance(ResourceKind::IncapSingle, low));
        let _ = self.channel.send(encode::set_pin_incap(pin_a, low, false).unwrap_or_default());
        let _ = self.channel.send(encode::set_pin_incap(pin_b, high, false).unwrap_or_default());
        if let Ok(resources) = self.resources.lock() {
            if let Some(r) = resources.as_ref() {
                r.release_incap_double(low, high);
            }
        }
    }

    // ---- sequencer -------------------------------------------------------

    /// Opens the cue sequencer with the given configuration bytes.
    pub fn open_sequencer(&self, config_bytes: &[u8]) -> Result<Arc<SequencerState>> {
        self.state.require_connected()?;
        self.with_resources(|r| r.claim_instance(ResourceKind::Sequencer))?;
        let state = Arc::new(SequencerState::new());
        self.registry.insert(
            ResourceKey::Instance(ResourceKind::Sequencer, 0),
            ResourceState::Sequencer(Arc::clone(&state)),
        );
        self.channel.send(encode::sequencer_configure(config_bytes)?)?;
        Ok(state)
    }

    /// Pushes one cue onto the sequencer's queue.
    pub fn sequencer_push(&self, duration: u16, cue_bytes: &[u8]) -> Result<()> {
        self.state.require_connected()?;
        self.channel.send(encode::sequencer_push(duration, cue_bytes)?)
    }

    /// Issues a sequencer control action (start/stop/pause/manual).
    pub fn sequencer_control(&self, action: SequencerAction<'_>) -> Result<()> {
        self.state.require_connected()?;
        self.channel.send(encode::sequencer_control(action)?)
    }

    /// Closes the sequencer opened with [`Self::open_sequencer`].
    pub fn close_sequencer(&self) {
        self.registry
            .remove(ResourceKey::Instance(ResourceKind::Sequencer, 0));
        let _ = self.channel.send(encode::sequencer_configure(&[]).unwrap_or_default());
        if let Ok(resources) = self.resources.lock() {
            if let Some(r) = resources.as_ref() {
                r.release_instance(ResourceKind::Sequencer, 0);
            }
        }
    }
}

impl<T: Transport> Drop for IoioSession<T> {
    fn drop(&mut self) {
        debug!("session dropping, disconnecting");
        self.disconnect();
        if let Some(handle) = self.dispatcher.take() {
            let _ = handle.join();
        }
    }
}

/// Blocks until `since` plus `timeout` has elapsed or `predicate` holds,
/// re-checked against the clock every time the underlying condvar wakes.
/// Exposed for facades that build their own bounded waits on top of
/// [`Cancellable`] rather than one of the state objects' built-in methods.
#[must_use]
pub fn deadline_in(timeout: Duration) -> std::time::Instant {
    deadline_from(timeout)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::mock_transport_pair;
    use crate::resources::ResourceKey as RK;
    use std::thread;
    use std::time::Duration as StdDuration;

    fn handshake_bytes(hardware_id: &[u8; 8]) -> Vec<u8> {
        let mut frame = vec![crate::opcode::ESTABLISH_CONNECTION];
        frame.extend_from_slice(b"IOIO");
        frame.extend_from_slice(hardware_id);
        frame.extend_from_slice(b"IOIO0000");
        frame.extend_from_slice(b"IOIO0000");
        frame
    }

    fn connected_session() -> (
        IoioSession<crate::mocks::MockTransport>,
        crate::mocks::MockTransport,
    ) {
        let (host, mut board) = mock_transport_pair();
        let session = IoioSession::connect(host).unwrap();
        board.write_all(&handshake_bytes(b"IOIO0003")).unwrap();
        let mut resp = [0u8; 9];
        board.read_exact(&mut resp).unwrap();
        board
            .write_all(&[crate::opcode::CHECK_INTERFACE_RESPONSE, 0x01])
            .unwrap();
        let caps = session.wait_for_connect().unwrap();
        assert_eq!(caps.pin_count(), 46);
        (session, board)
    }

    #[test]
    fn connect_then_digital_out_writes_expected_frame() {
        let (session, mut board) = connected_session();
        session.open_digital_out(5, false, PinState::High).unwrap();
        let mut frame = [0u8; 2];
        board.read_exact(&mut frame).unwrap();
        assert_eq!(frame[0], crate::opcode::SET_PIN_DIGITAL_OUT);
    }

    #[test]
    fn digital_in_status_reaches_the_open_pin_state() {
        let (session, mut board) = connected_session();
        let state = session.open_digital_in(7, PinPull::Floating).unwrap();
        let mut cmd = [0u8; 2];
        board.read_exact(&mut cmd).unwrap();
        assert_eq!(cmd[0], crate::opcode::SET_PIN_DIGITAL_IN);

        board
            .write_all(&[crate::opcode::REPORT_DIGITAL_IN_STATUS, (7 << 2) | 1])
            .unwrap();
        thread::sleep(StdDuration::from_millis(50));
        assert!(state.read().unwrap());
        session.close_pin(7);
        assert!(session.registry.get(RK::Pin(7)).is_none());
    }

    #[test]
    fn disconnect_wakes_blocked_reads() {
        let (session, _board) = connected_session();
        let state = session.open_digital_in(2, PinPull::Floating).unwrap();
        let handle = thread::spawn(move || state.wait_for_change(0));
        thread::sleep(StdDuration::from_millis(20));
        session.disconnect();
        let result = handle.join().unwrap();
        assert!(matches!(result, Err(IoioError::ConnectionLost)));
    }

    #[test]
    fn incompatible_hardware_id_surfaces_distinct_error() {
        let (host, mut board) = mock_transport_pair();
        let session = IoioSession::connect(host).unwrap();
        board.write_all(&handshake_bytes(b"XXXXXXXX")).unwrap();
        let result = session.wait_for_connect();
        assert!(matches!(result, Err(IoioError::Incompatible)));
    }
}
