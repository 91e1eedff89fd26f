//! Wire codec (C1): encode outgoing commands, decode incoming events.
//!
//! Two separate tables, not one opcode enum with direction flags — some byte
//! values mean different things depending on direction (see
//! [`crate::opcode`]), and modelling that with inheritance or a shared match
//! would blur the two tables together (§9 design note: "do not model with
//! inheritance").

pub mod decode;
pub mod encode;

/// Maximum length of any single encoded outgoing command.
///
/// 4 header bytes + up to 68 sequencer cue bytes is the largest frame the
/// table in §4.1 defines.
pub const MAX_COMMAND_LEN: usize = 80;

/// A fully encoded outgoing command, ready to hand to the outgoing channel.
pub type CommandBuf = heapless::Vec<u8, MAX_COMMAND_LEN>;

/// A fully decoded incoming event, independent of any per-resource state.
///
/// `AnalogInStatus` is the one event whose decode depends on dispatcher-held
/// context (the currently tracked analog pin list from the last
/// `AnalogInFormat`); see [`decode::read_analog_in_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingEvent {
    /// `ESTABLISH_CONNECTION` (0x00).
    EstablishConnection {
        /// Hardware revision id, 8 ASCII bytes.
        hardware_id: [u8; 8],
        /// Bootloader version id, 8 ASCII bytes.
        bootloader_id: [u8; 8],
        /// Firmware version id, 8 ASCII bytes.
        firmware_id: [u8; 8],
    },
    /// `SOFT_RESET` (0x01) arriving as a device-initiated event.
    SoftReset,
    /// `CHECK_INTERFACE_RESPONSE` (0x02).
    CheckInterfaceResponse {
        /// Bit 0 of the response argument.
        supported: bool,
    },
    /// `REPORT_DIGITAL_IN_STATUS` (0x04).
    DigitalInStatus {
        /// Pin number, `arg >> 2`.
        pin: u8,
        /// Logic level, `arg & 1`.
        level: bool,
    },
    /// `SET_CHANGE_NOTIFY` (0x06) echoed back for bookkeeping.
    ChangeNotifyEcho {
        /// Pin number.
        pin: u8,
        /// Whether change-notify is enabled for `pin`.
        notify: bool,
    },
    /// `REPORT_ANALOG_IN_FORMAT` (0x0C): the new tracked pin list.
    AnalogInFormat {
        /// Pins now sampled, in firmware-reported order.
        pins: heapless::Vec<u8, 64>,
    },
    /// `REPORT_ANALOG_IN_STATUS` (0x0B): one 10-bit sample per tracked pin,
    /// in the same order as the last `AnalogInFormat`.
    AnalogInStatus {
        /// `(pin, sample)` pairs, in tracked-list order.
        samples: heapless::Vec<(u8, u16), 64>,
    },
    /// `UART_STATUS` / `SPI_STATUS` / `I2C_STATUS`.
    ModuleStatus {
        /// Which module kind this status is for.
        kind: ModuleKind,
        /// Module instance id (low bits of the argument byte).
        id: u8,
        /// `true` if now open, `false` if now closed.
        open: bool,
    },
    /// `UART_DATA` arriving as an event: inbound bytes for a UART module.
    UartData {
        /// UART module id.
        uart: u8,
        /// Up to 64 inbound bytes.
        data: heapless::Vec<u8, 64>,
    },
    /// `SPI_DATA` arriving as an event: inbound bytes for an SPI module.
    SpiData {
        /// SPI module id.
        spi: u8,
        /// Slave-select pin used for the originating request.
        ss_pin: u8,
        /// Up to 64 inbound bytes.
        data: heapless::Vec<u8, 64>,
    },
    /// `UART_REPORT_TX_STATUS` / `SPI_REPORT_TX_STATUS` / `I2C_REPORT_TX_STATUS`.
    TxStatus {
        /// Which module kind this status is for.
        kind: ModuleKind,
        /// Module instance id.
        id: u8,
        /// Bytes remaining in the firmware-side TX buffer (10-bit).
        remaining: u16,
    },
    /// `I2C_RESULT`.
    I2cResult {
        /// I2C/TWI module id.
        twi: u8,
        /// Outcome of the head pending request.
        outcome: TwiTransactionOutcome,
    },
    /// `ICSP_RESULT`: a two-byte VISI read result.
    IcspResult {
        /// Raw 16-bit VISI register value, little-endian on the wire.
        visi: [u8; 2],
    },
    /// `ICSP_REPORT_RX_STATUS`: bytes remaining in the ICSP RX buffer.
    IcspRxStatus {
        /// 10-bit remaining count.
        remaining: u16,
    },
    /// `ICSP_CONFIG` arriving as an event: open/close echo.
    IcspConfigEcho {
        /// `true` if ICSP master mode is now open.
        open: bool,
    },
    /// `INCAP_STATUS` (configure echo) or `INCAP_REPORT` (capture result).
    Incap {
        /// Distinguishes the configure echo from an actual capture result.
        report: bool,
        /// INCAP channel id.
        incap_num: u8,
        /// Raw capture/echo bytes (1-4 bytes).
        value: heapless::Vec<u8, 4>,
    },
    /// `CAPSENSE_REPORT`.
    CapsenseReport {
        /// Pin number.
        pin: u8,
        /// 10-bit capacitive reading.
        value: u16,
    },
    /// `SET_CAPSENSE_SAMPLING` (0x1F) echoed back for bookkeeping.
    CapsenseSamplingEcho {
        /// Pin number, low 6 bits of the argument byte.
        pin: u8,
        /// Whether cap-sense sampling is now enabled for `pin`.
        enabled: bool,
    },
    /// `SEQUENCER_EVENT`.
    SequencerEvent(SequencerEvent),
    /// `SYNC` echoed back by the device.
    Sync,
    /// `SOFT_CLOSE` arriving as an event: orderly disconnect request.
    SoftClose,
    /// A recognised-but-reserved opcode with unspecified wire format
    /// (`REPORT_PERIODIC_DIGITAL_IN_STATUS`). Logged and dropped; see
    /// `SPEC_FULL.md` §4.
    ReservedPeriodicDigitalIn,
}

/// Which stream-oriented peripheral kind a status/tx-status event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// UART master.
    Uart,
    /// SPI master.
    Spi,
    /// I2C/TWI master.
    Twi,
}

/// Outcome of a completed I2C/TWI transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TwiTransactionOutcome {
    /// The transaction completed; these are the read bytes (write-only
    /// transactions report an empty vec).
    Completed(heapless::Vec<u8, 64>),
    /// The transaction was aborted by the bus (e.g. a NAK). Per the §9
    /// REDESIGN FLAG this is a distinct variant, not the raw `0xFF` sentinel.
    Aborted,
}

/// `SEQUENCER_EVENT` payload (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerEvent {
    /// The sequencer paused.
    Paused,
    /// The sequencer stalled (cue queue ran dry while playing).
    Stalled,
    /// The sequencer opened; carries the number of free cue slots.
    Opened {
        /// Free cue-queue slots available immediately after opening.
        free_slots: u8,
    },
    /// The sequencer advanced to its next queued cue.
    NextCue,
    /// The sequencer stopped; carries the number of free cue slots.
    Stopped {
        /// Free cue-queue slots available after stopping.
        free_slots: u8,
    },
    /// The sequencer closed.
    Closed,
}
