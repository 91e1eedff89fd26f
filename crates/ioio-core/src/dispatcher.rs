//! Incoming dispatcher (C3): the single reader thread.
//!
//! One thread owns the read half of the transport for the life of the
//! session. It performs the connect handshake, then loops decoding events
//! and routing each one to the [`Registry`] entry it concerns. No facade, no
//! session method, and no other thread ever reads from the transport.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, warn};

use crate::capability::BoardModel;
use crate::channel::OutgoingChannel;
use crate::codec::decode::{read_event, read_opcode};
use crate::codec::{self, IncomingEvent, ModuleKind};
use crate::error::IoioError;
use crate::opcode;
use crate::registry::{Registry, ResourceState};
use crate::resource_state::TransactionState;
use crate::resources::{ResourceKey, ResourceKind, ResourceManager};
use crate::state_machine::{BoardIdentity, StateMachine};
use crate::transport::Transport;

/// Collaborators the dispatcher needs, gathered so `spawn` doesn't take a
/// dozen loose parameters.
pub struct DispatcherContext<T: Transport> {
    /// Where decoded events get routed.
    pub registry: Arc<Registry>,
    /// The connection lifecycle this thread drives through handshake.
    pub state: Arc<StateMachine>,
    /// Used only to send the `CHECK_INTERFACE` probe during handshake.
    pub channel: Arc<OutgoingChannel<T>>,
    /// Filled in on a successful handshake.
    pub board: Arc<Mutex<Option<BoardIdentity>>>,
    /// The same resource manager `IoioSession` allocates pins and peripheral
    /// instances from. Shared so a device-initiated `SOFT_RESET` (§4.3) can
    /// free every open descriptor exactly as `IoioSession::soft_reset` does
    /// for a host-initiated one — there is no separate code path for the
    /// two origins.
    pub resources: Arc<Mutex<Option<ResourceManager>>>,
    /// Completed when a `SYNC` echo arrives, for `IoioSession::sync`.
    pub sync_waiter: Arc<TransactionState<()>>,
}

/// Spawns the reader thread. `transport` is consumed entirely by this
/// thread: no other thread may read from it concurrently (§4: "one reader
/// thread"). On return (EOF, a `SOFT_CLOSE` event, or a fatal protocol
/// error), the thread marks the state machine DEAD, disconnects every
/// registry entry, and calls `transport.disconnect()` if the transport
/// reports it is the one that should tear the link down.
pub fn spawn<T>(mut transport: T, ctx: DispatcherContext<T>) -> JoinHandle<()>
where
    T: Transport,
{
    thread::spawn(move || {
        match handshake(&mut transport, &ctx) {
            Ok(()) if ctx.state.current() == crate::state_machine::ConnectionState::Connected => {
                run_loop(&mut transport, &ctx);
            }
            Ok(()) => {
                // INCOMPATIBLE: handshake completed but the board was rejected.
                // Nothing more to read; fall through to teardown below.
            }
            Err(err) => {
                warn!(?err, "handshake failed");
                ctx.state.mark_dead();
            }
        }
        ctx.registry.disconnect_all();
        // INCOMPATIBLE is terminal in its own right (`IoioError::Incompatible`,
        // not `ConnectionLost`); only downgrade to DEAD from every other state.
        if ctx.state.current() != crate::state_machine::ConnectionState::Incompatible {
            ctx.state.mark_dead();
        }
        if transport.can_close() {
            transport.disconnect();
        }
    })
}

fn handshake<T>(transport: &mut T, ctx: &DispatcherContext<T>) -> crate::error::Result<()>
where
    T: Transport,
{
    let Some(op) = read_opcode(transport).map_err(|_| IoioError::ConnectionLost)? else {
        return Err(IoioError::ConnectionLost);
    };
    let event = read_event(transport, op, &[]).map_err(|_| IoioError::Protocol("bad handshake frame"))?;
    let IncomingEvent::EstablishConnection {
        hardware_id,
        bootloader_id,
        firmware_id,
    } = event
    else {
        return Err(IoioError::Protocol("expected ESTABLISH_CONNECTION"));
    };

    let model = BoardModel::from_hardware_id(&hardware_id);
    let Some(capabilities) = model.capabilities() else {
        ctx.state.mark_incompatible()?;
        return Ok(());
    };

    ctx.channel.send(codec::encode::check_interface()?)?;
    let Some(op) = read_opcode(transport).map_err(|_| IoioError::ConnectionLost)? else {
        return Err(IoioError::ConnectionLost);
    };
    let IncomingEvent::CheckInterfaceResponse { supported } =
        read_event(transport, op, &[]).map_err(|_| IoioError::Protocol("bad interface response"))?
    else {
        return Err(IoioError::Protocol("expected CHECK_INTERFACE_RESPONSE"));
    };

    if !supported {
        ctx.state.mark_incompatible()?;
        return Ok(());
    }

    if let Ok(mut board) = ctx.board.lock() {
        *board = Some(BoardIdentity {
            hardware_id,
            bootloader_id,
            firmware_id,
            capabilities,
        });
    }
    ctx.state.mark_connected()
}

fn run_loop<T>(transport: &mut T, ctx: &DispatcherContext<T>)
where
    T: Transport,
{
    let mut tracked_analog_pins: heapless::Vec<u8, 64> = heapless::Vec::new();
    loop {
        let op = match read_opcode(transport) {
            Ok(Some(op)) => op,
            Ok(None) => {
                debug!("transport closed");
                return;
            }
            Err(err) => {
                error!(%err, "read error");
                return;
            }
        };
        let event = match read_event(transport, op, &tracked_analog_pins) {
            Ok(event) => event,
            Err(err) => {
                error!(%err, opcode = op, "protocol error decoding event");
                return;
            }
        };
        if matches!(event, IncomingEvent::SoftClose) {
            debug!("SOFT_CLOSE received, tearing down");
            return;
        }
        if let IncomingEvent::AnalogInFormat { ref pins } = event {
            apply_analog_format(&ctx.registry, &tracked_analog_pins, pins);
            tracked_analog_pins = pins.clone();
        }
        if matches!(event, IncomingEvent::SoftReset) {
            // §4.3: a device-initiated SOFT_RESET clears the currently-sampled
            // analog pin set, same as the host-initiated path.
            tracked_analog_pins.clear();
        }
        dispatch(&ctx.registry, &ctx.board, &ctx.resources, &ctx.sync_waiter, event);
    }
}

/// Diffs the previous and newly reported tracked-analog-pin lists and
/// signals each pin's `SampledInputState::on_open` for the side that
/// changed (§4.3: analog open/close is inferred from `REPORT_ANALOG_IN_FORMAT`,
/// there is no dedicated open/close event per pin).
fn apply_analog_format(registry: &Registry, before: &[u8], after: &[u8]) {
    for &pin in before {
        if !after.contains(&pin) {
            if let Some(ResourceState::AnalogInput(state)) =
                registry.get(ResourceKey::Pin(pin))
            {
                state.on_open(false);
            }
        }
    }
    for &pin in after {
        if !before.contains(&pin) {
            if let Some(ResourceState::AnalogInput(state)) =
                registry.get(ResourceKey::Pin(pin))
            {
                state.on_open(true);
            }
        }
    }
}

fn dispatch(
    registry: &Registry,
    board: &Mutex<Option<BoardIdentity>>,
    resources: &Mutex<Option<ResourceManager>>,
    sync_waiter: &TransactionState<()>,
    event: IncomingEvent,
) {
    match event {
        IncomingEvent::EstablishConnection { .. } | IncomingEvent::CheckInterfaceResponse { .. } => {
            warn!("handshake event seen outside handshake, ignoring");
        }
        IncomingEvent::SoftReset => {
            debug!("SOFT_RESET received");
            // Free every pin/instance pool slot before waiters are woken by
            // `soft_reset_all` below, so a facade unblocked by the signal can
            // immediately reopen the same pin or peripheral id (§4.3).
            if let Ok(mut resources) = resources.lock() {
                let caps = board
                    .lock()
                    .ok()
                    .and_then(|b| b.as_ref().map(|b| b.capabilities.clone()));
                if let Some(caps) = caps {
                    *resources = Some(ResourceManager::new(caps));
                }
            }
            registry.soft_reset_all();
        }
        IncomingEvent::DigitalInStatus { pin, level } => {
            if let Some(ResourceState::PinInput(state)) = registry.get(ResourceKey::Pin(pin)) {
                state.on_status(level);
            }
        }
        IncomingEvent::ChangeNotifyEcho { .. } => {}
        IncomingEvent::AnalogInFormat { .. } => {
            // handled in run_loop before tracked_analog_pins is updated
        }
        IncomingEvent::AnalogInStatus { samples } => {
            for (pin, sample) in samples {
                if let Some(ResourceState::AnalogInput(state)) =
                    registry.get(ResourceKey::Pin(pin))
                {
                    state.on_sample(sample);
                }
            }
        }
        IncomingEvent::ModuleStatus { kind, id, open } => {
            let key = ResourceKey::Instance(resource_kind_for(kind), id);
            match registry.get(key) {
                Some(ResourceState::Uart(state)) => state.on_status(open),
                Some(ResourceState::Spi(state)) => state.stream.on_status(open),
                Some(ResourceState::Twi(state)) => state.stream.on_status(open),
                _ => {}
            }
        }
        IncomingEvent::UartData { uart, data } => {
            if let Some(ResourceState::Uart(state)) =
                registry.get(ResourceKey::Instance(ResourceKind::Uart, uart))
            {
                state.on_inbound(&data);
            }
        }
        IncomingEvent::SpiData { spi, ss_pin, data } => {
            if let Some(ResourceState::Spi(state)) =
                registry.get(ResourceKey::Instance(ResourceKind::Spi, spi))
            {
                state
                    .pending
                    .complete_head(crate::resource_state::SpiResponse { ss_pin, data });
            }
        }
        IncomingEvent::TxStatus { kind, id, remaining } => {
            let key = ResourceKey::Instance(resource_kind_for(kind), id);
            match registry.get(key) {
                Some(ResourceState::Uart(state)) => state.on_tx_status(remaining),
                Some(ResourceState::Spi(state)) => state.stream.on_tx_status(remaining),
                Some(ResourceState::Twi(state)) => state.stream.on_tx_status(remaining),
                _ => {}
            }
        }
        IncomingEvent::I2cResult { twi, outcome } => {
            if let Some(ResourceState::Twi(state)) =
                registry.get(ResourceKey::Instance(ResourceKind::Twi, twi))
            {
                state.pending.complete_head(outcome);
            }
        }
        IncomingEvent::IcspResult { visi } => {
            if let Some(ResourceState::Icsp(state)) =
                registry.get(ResourceKey::Instance(ResourceKind::Icsp, 0))
            {
                state.on_result(u16::from_le_bytes(visi));
            }
        }
        IncomingEvent::IcspRxStatus { remaining } => {
            if let Some(ResourceState::Icsp(state)) =
                registry.get(ResourceKey::Instance(ResourceKind::Icsp, 0))
            {
                state.on_rx_status(remaining);
            }
        }
        IncomingEvent::IcspConfigEcho { open } => {
            if let Some(ResourceState::Icsp(state)) =
                registry.get(ResourceKey::Instance(ResourceKind::Icsp, 0))
            {
                state.on_config_echo(open);
            }
        }
        IncomingEvent::Incap {
            report,
            incap_num,
            value,
        } => {
            // Both single and double capture channels are registered under
            // `IncapSingle` keyed by their base id; a double capture's
            // partner id is never looked up directly by the dispatcher.
            let key = ResourceKey::Instance(ResourceKind::IncapSingle, incap_num);
            if let Some(ResourceState::Incap(state)) = registry.get(key) {
                if report {
                    state.on_report(&value);
                } else {
                    state.on_status(!value.is_empty() && value[0] != 0);
                }
            }
        }
        IncomingEvent::CapsenseReport { pin, value } => {
            if let Some(ResourceState::CapSense(state)) = registry.get(ResourceKey::Pin(pin)) {
                state.on_sample(value);
            }
        }
        IncomingEvent::CapsenseSamplingEcho { .. } => {}
        IncomingEvent::SequencerEvent(seq_event) => {
            if let Some(ResourceState::Sequencer(state)) =
                registry.get(ResourceKey::Instance(ResourceKind::Sequencer, 0))
            {
                state.on_event(seq_event);
            }
        }
        IncomingEvent::Sync => {
            sync_waiter.complete(());
        }
        IncomingEvent::SoftClose => {
            // handled by the caller before reaching `dispatch`
        }
        IncomingEvent::ReservedPeriodicDigitalIn => {
            warn!("REPORT_PERIODIC_DIGITAL_IN_STATUS received but unsupported; dropping");
        }
    }
}

fn resource_kind_for(kind: ModuleKind) -> ResourceKind {
    match kind {
        ModuleKind::Uart => ResourceKind::Uart,
        ModuleKind::Spi => ResourceKind::Spi,
        ModuleKind::Twi => ResourceKind::Twi,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::mock_transport_pair;
    use crate::resource_state::PinInputState;
    use std::time::Duration;

    fn establish_connection_frame(hardware_id: &[u8; 8]) -> Vec<u8> {
        let mut frame = vec![opcode::ESTABLISH_CONNECTION];
        frame.extend_from_slice(b"IOIO");
        frame.extend_from_slice(hardware_id);
        frame.extend_from_slice(b"IOIO0000");
        frame.extend_from_slice(b"IOIO0000");
        frame
    }

    fn spawn_session() -> (
        JoinHandle<()>,
        crate::mocks::MockTransport,
        Arc<Registry>,
        Arc<StateMachine>,
        Arc<Mutex<Option<ResourceManager>>>,
    ) {
        let (host, board) = mock_transport_pair();
        let registry = Arc::new(Registry::new());
        let state = Arc::new(StateMachine::new());
        let channel = Arc::new(OutgoingChannel::new(Vec::new()));
        let resources = Arc::new(Mutex::new(None));
        let ctx = DispatcherContext {
            registry: Arc::clone(&registry),
            state: Arc::clone(&state),
            channel,
            board: Arc::new(Mutex::new(None)),
            resources: Arc::clone(&resources),
            sync_waiter: Arc::new(TransactionState::new()),
        };
        let handle = spawn(host, ctx);
        (handle, board, registry, state, resources)
    }

    #[test]
    fn handshake_with_known_board_marks_connected() {
        let (handle, mut board, _registry, state, _resources) = spawn_session();
        board
            .write_all(&establish_connection_frame(b"IOIO0003"))
            .unwrap();
        let mut resp = [0u8; 2];
        board.read_exact(&mut resp).unwrap();
        assert_eq!(resp[0], opcode::CHECK_INTERFACE);
        board
            .write_all(&[opcode::CHECK_INTERFACE_RESPONSE, 0x01])
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(state.current(), crate::state_machine::ConnectionState::Connected);
        board.disconnect();
        let _ = handle.join();
    }

    #[test]
    fn digital_in_status_routes_to_registered_pin() {
        let (handle, mut board, registry, state, _resources) = spawn_session();
        board
            .write_all(&establish_connection_frame(b"IOIO0003"))
            .unwrap();
        let mut resp = [0u8; 2];
        board.read_exact(&mut resp).unwrap();
        board
            .write_all(&[opcode::CHECK_INTERFACE_RESPONSE, 0x01])
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(state.current(), crate::state_machine::ConnectionState::Connected);

        let pin_state = Arc::new(PinInputState::new());
        registry.insert(ResourceKey::Pin(3), ResourceState::PinInput(Arc::clone(&pin_state)));
        // REPORT_DIGITAL_IN_STATUS: pin 3, level high -> arg = (3 << 2) | 1
        board
            .write_all(&[opcode::REPORT_DIGITAL_IN_STATUS, (3 << 2) | 1])
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(pin_state.read().unwrap());

        board.disconnect();
        let _ = handle.join();
    }

    #[test]
    fn device_soft_reset_frees_the_resource_manager_and_analog_tracking() {
        let (handle, mut board, registry, state, resources) = spawn_session();
        board
            .write_all(&establish_connection_frame(b"IOIO0003"))
            .unwrap();
        let mut resp = [0u8; 2];
        board.read_exact(&mut resp).unwrap();
        board
            .write_all(&[opcode::CHECK_INTERFACE_RESPONSE, 0x01])
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(state.current(), crate::state_machine::ConnectionState::Connected);

        let caps = crate::capability::BoardModel::from_hardware_id(b"IOIO0003")
            .capabilities()
            .unwrap();
        {
            let mut guard = resources.lock().unwrap();
            let mgr = ResourceManager::new(caps);
            mgr.claim_pin(5).unwrap();
            *guard = Some(mgr);
        }
        registry.insert(
            ResourceKey::Pin(5),
            ResourceState::PinInput(Arc::new(PinInputState::new())),
        );

        // A device-initiated SOFT_RESET must free pin 5 in the resource
        // manager, not just drop its registry entry.
        board.write_all(&[opcode::SOFT_RESET]).unwrap();
        thread::sleep(Duration::from_millis(50));

        assert!(registry.get(ResourceKey::Pin(5)).is_none());
        let guard = resources.lock().unwrap();
        let mgr = guard.as_ref().expect("resource manager recreated on reset");
        assert!(mgr.claim_pin(5).is_ok());

        drop(guard);
        board.disconnect();
        let _ = handle.join();
    }
}
