//! Incoming event decoders (§4.1, §4.3).
//!
//! The dispatcher thread (C3) owns the read side exclusively, so every
//! function here takes `&mut impl Read` rather than a shared stream handle.
//! [`read_opcode`] is the one entry point that distinguishes an orderly
//! disconnect (EOF exactly at a frame boundary) from a stream that died
//! mid-command, which the dispatcher needs to decide whether the last
//! partial event should be logged as a protocol violation.

use std::io::{self, ErrorKind, Read};

use heapless::Vec;

use super::{IncomingEvent, ModuleKind, SequencerEvent, TwiTransactionOutcome};
use crate::opcode;

fn read_u8(stream: &mut impl Read) -> io::Result<u8> {
    let mut byte = [0u8; 1];
    stream.read_exact(&mut byte)?;
    Ok(byte[0])
}

fn read_array<const N: usize>(stream: &mut impl Read) -> io::Result<[u8; N]> {
    let mut bytes = [0u8; N];
    stream.read_exact(&mut bytes)?;
    Ok(bytes)
}

fn protocol_error(message: &'static str) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, message)
}

/// Reads the next event's opcode byte.
///
/// Returns `Ok(None)` only when the stream is exhausted exactly at a frame
/// boundary (an orderly disconnect, §4.3 point 1). Any I/O error — including
/// EOF that lands partway through a multi-byte opcode read, which cannot
/// happen here since the opcode is a single byte, but does apply to the
/// fields each `read_*` function pulls afterwards — propagates as `Err` for
/// the dispatcher to map onto a non-orderly [`crate::error::IoioError::ConnectionLost`].
pub fn read_opcode(stream: &mut impl Read) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    match stream.read(&mut byte) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(byte[0])),
        Err(e) => Err(e),
    }
}

/// Reads and decodes exactly one event, given its opcode byte (as returned
/// by [`read_opcode`]).
pub fn read_event(stream: &mut impl Read, opcode: u8, tracked_analog_pins: &[u8]) -> io::Result<IncomingEvent> {
    match opcode {
        self::opcode::ESTABLISH_CONNECTION => read_establish_connection(stream),
        self::opcode::SOFT_RESET => Ok(IncomingEvent::SoftReset),
        self::opcode::CHECK_INTERFACE_RESPONSE => read_check_interface_response(stream),
        self::opcode::REPORT_DIGITAL_IN_STATUS => read_digital_in_status(stream),
        self::opcode::REPORT_PERIODIC_DIGITAL_IN_STATUS => Ok(IncomingEvent::ReservedPeriodicDigitalIn),
        self::opcode::SET_CHANGE_NOTIFY => read_change_notify_echo(stream),
        self::opcode::REPORT_ANALOG_IN_FORMAT => read_analog_in_format(stream),
        self::opcode::REPORT_ANALOG_IN_STATUS => read_analog_in_status(stream, tracked_analog_pins),
        self::opcode::UART_STATUS => read_module_status(stream, ModuleKind::Uart),
        self::opcode::SPI_STATUS => read_module_status(stream, ModuleKind::Spi),
        self::opcode::I2C_STATUS => read_module_status(stream, ModuleKind::Twi),
        self::opcode::UART_DATA => read_uart_data(stream),
        self::opcode::SPI_DATA => read_spi_data(stream),
        self::opcode::UART_REPORT_TX_STATUS => read_tx_status(stream, ModuleKind::Uart),
        self::opcode::SPI_REPORT_TX_STATUS => read_tx_status(stream, ModuleKind::Spi),
        self::opcode::I2C_REPORT_TX_STATUS => read_tx_status(stream, ModuleKind::Twi),
        self::opcode::I2C_RESULT => read_i2c_result(stream),
        self::opcode::ICSP_RESULT => read_icsp_result(stream),
        self::opcode::ICSP_REPORT_RX_STATUS => read_icsp_rx_status(stream),
        self::opcode::ICSP_CONFIG => read_icsp_config_echo(stream),
        self::opcode::INCAP_STATUS => read_incap(stream, false),
        self::opcode::INCAP_REPORT => read_incap(stream, true),
        self::opcode::CAPSENSE_REPORT => read_capsense_report(stream),
        self::opcode::SET_CAPSENSE_SAMPLING => read_capsense_sampling_echo(stream),
        self::opcode::SEQUENCER_EVENT => read_sequencer_event(stream),
        self::opcode::SYNC => Ok(IncomingEvent::Sync),
        self::opcode::SOFT_CLOSE => Ok(IncomingEvent::SoftClose),
        _ => Err(protocol_error("unrecognised opcode")),
    }
}

/// `ESTABLISH_CONNECTION` (0x00): `IOIO` magic, hardware id, bootloader id,
/// firmware id — three 8-byte ASCII fields.
fn read_establish_connection(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let magic: [u8; 4] = read_array(stream)?;
    if magic != opcode::IOIO_MAGIC {
        return Err(protocol_error("bad ESTABLISH_CONNECTION magic"));
    }
    let hardware_id = read_array(stream)?;
    let bootloader_id = read_array(stream)?;
    let firmware_id = read_array(stream)?;
    Ok(IncomingEvent::EstablishConnection {
        hardware_id,
        bootloader_id,
        firmware_id,
    })
}

/// `CHECK_INTERFACE_RESPONSE` (0x02): single argument byte, bit 0 is support.
fn read_check_interface_response(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let arg = read_u8(stream)?;
    Ok(IncomingEvent::CheckInterfaceResponse {
        supported: arg & 1 != 0,
    })
}

/// `REPORT_DIGITAL_IN_STATUS` (0x04): `pin<<2 | level`.
fn read_digital_in_status(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let arg = read_u8(stream)?;
    Ok(IncomingEvent::DigitalInStatus {
        pin: arg >> 2,
        level: arg & 1 != 0,
    })
}

/// `SET_CHANGE_NOTIFY` (0x06) echoed back for bookkeeping: `pin<<2 | notify`,
/// the same `pin<<2 | flag` shape as `REPORT_DIGITAL_IN_STATUS`.
fn read_change_notify_echo(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let arg = read_u8(stream)?;
    Ok(IncomingEvent::ChangeNotifyEcho {
        pin: arg >> 2,
        notify: arg & 1 != 0,
    })
}

/// `REPORT_ANALOG_IN_FORMAT` (0x0C): size byte, then that many pin bytes —
/// the new tracked-pin list, replacing whatever list was tracked before.
fn read_analog_in_format(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let count = read_u8(stream)?;
    let mut pins = Vec::new();
    for _ in 0..count {
        let pin = read_u8(stream)?;
        pins.push(pin)
            .map_err(|_| protocol_error("analog in format pin list too long"))?;
    }
    Ok(IncomingEvent::AnalogInFormat { pins })
}

/// `REPORT_ANALOG_IN_STATUS` (0x0B): one 10-bit sample per currently tracked
/// pin, packed 4 pins to every 5 bytes (a repeating header byte carrying the
/// low 2 bits of each of the next 4 samples, followed by the 4 high bytes).
///
/// This decode needs the tracked pin list from the most recent
/// [`IncomingEvent::AnalogInFormat`] because the firmware reports only a
/// flat sample stream in tracked-list order, with no pin numbers of its own.
fn read_analog_in_status(stream: &mut impl Read, tracked_pins: &[u8]) -> io::Result<IncomingEvent> {
    let mut samples = Vec::new();
    for group in tracked_pins.chunks(4) {
        let header = read_u8(stream)?;
        for (i, &pin) in group.iter().enumerate() {
            let low_bits = u16::from((header >> (2 * i)) & 0x03);
            let high = read_u8(stream)?;
            let sample = (u16::from(high) << 2) | low_bits;
            samples
                .push((pin, sample))
                .map_err(|_| protocol_error("analog in status sample list too long"))?;
        }
    }
    Ok(IncomingEvent::AnalogInStatus { samples })
}

/// `UART_STATUS` / `SPI_STATUS` / `I2C_STATUS`: `id<<1 | open`, shared shape
/// across the three stream-oriented peripherals.
fn read_module_status(stream: &mut impl Read, kind: ModuleKind) -> io::Result<IncomingEvent> {
    let arg = read_u8(stream)?;
    Ok(IncomingEvent::ModuleStatus {
        kind,
        id: arg >> 1,
        open: arg & 1 != 0,
    })
}

/// `UART_DATA` (0x0E) as an inbound event: `((count-1)&0x3F) | (uart<<6)`,
/// then `count` bytes.
fn read_uart_data(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let arg = read_u8(stream)?;
    let uart = arg >> 6;
    let count = usize::from(arg & 0x3F) + 1;
    let mut data = Vec::new();
    for _ in 0..count {
        data.push(read_u8(stream)?)
            .map_err(|_| protocol_error("uart data payload too long"))?;
    }
    Ok(IncomingEvent::UartData { uart, data })
}

/// `SPI_DATA` (0x11) as an inbound event: `spi<<6 | ss_pin`, `(count-1)`,
/// then `count` bytes.
fn read_spi_data(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let first = read_u8(stream)?;
    let spi = first >> 6;
    let ss_pin = first & 0x3F;
    let count_minus_one = read_u8(stream)?;
    let count = usize::from(count_minus_one) + 1;
    let mut data = Vec::new();
    for _ in 0..count {
        data.push(read_u8(stream)?)
            .map_err(|_| protocol_error("spi data payload too long"))?;
    }
    Ok(IncomingEvent::SpiData { spi, ss_pin, data })
}

/// `UART_REPORT_TX_STATUS` / `SPI_REPORT_TX_STATUS` / `I2C_REPORT_TX_STATUS`:
/// id in the low 2 bits of `arg1` (the same id-in-low-bits convention as
/// `*_STATUS`), with the 10-bit remaining count split as `(arg1>>2) |
/// (arg2<<6)`.
fn read_tx_status(stream: &mut impl Read, kind: ModuleKind) -> io::Result<IncomingEvent> {
    let arg1 = read_u8(stream)?;
    let arg2 = read_u8(stream)?;
    let id = arg1 & 0x03;
    let remaining = (u16::from(arg1) >> 2) | (u16::from(arg2) << 6);
    Ok(IncomingEvent::TxStatus {
        kind,
        id,
        remaining,
    })
}

/// `I2C_RESULT` (0x14): `twi<<2`, then a second byte that is either the
/// read-byte count, followed by that many bytes, or `0xFF` — the only
/// documented sentinel — marking an aborted transaction (§9 REDESIGN FLAG:
/// surfaced here as [`TwiTransactionOutcome::Aborted`] instead of threading
/// the sentinel through to callers). No other bit pattern, in this byte or
/// the first, signals abort.
fn read_i2c_result(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let arg = read_u8(stream)?;
    let twi = arg >> 2;
    let full_size = read_u8(stream)?;
    if full_size == 0xFF {
        return Ok(IncomingEvent::I2cResult {
            twi,
            outcome: TwiTransactionOutcome::Aborted,
        });
    }
    let mut data = Vec::new();
    for _ in 0..full_size {
        data.push(read_u8(stream)?)
            .map_err(|_| protocol_error("i2c result payload too long"))?;
    }
    Ok(IncomingEvent::I2cResult {
        twi,
        outcome: TwiTransactionOutcome::Completed(data),
    })
}

/// `ICSP_RESULT` (0x17): 16-bit VISI register value, little-endian.
fn read_icsp_result(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let visi: [u8; 2] = read_array(stream)?;
    Ok(IncomingEvent::IcspResult { visi })
}

/// `ICSP_REPORT_RX_STATUS` (0x16): reuses the 10-bit two-byte shape from
/// [`read_tx_status`], without the leading module id (ICSP has only one
/// instance per board).
fn read_icsp_rx_status(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let first = read_u8(stream)?;
    let low = read_u8(stream)?;
    let remaining = (u16::from(first & 0x03) << 8) | u16::from(low);
    Ok(IncomingEvent::IcspRxStatus { remaining })
}

/// `INCAP_STATUS` (configure echo) / `INCAP_REPORT` (capture result):
/// `incap_num & 0x3F`, then a value whose byte count comes from `size >>
/// 6` with its own convention distinct from the generic "raw value + 1"
/// used by `UART_DATA`/`SPI_DATA`: raw field 0 encodes 4 bytes, and raw
/// fields 1/2/3 encode 1/2/3 bytes respectively.
fn read_incap(stream: &mut impl Read, report: bool) -> io::Result<IncomingEvent> {
    let header = read_u8(stream)?;
    let incap_num = header & 0x3F;
    let size = match header >> 6 {
        0 => 4usize,
        n => usize::from(n),
    };
    let mut value = Vec::new();
    for _ in 0..size {
        value
            .push(read_u8(stream)?)
            .map_err(|_| protocol_error("incap value too long"))?;
    }
    Ok(IncomingEvent::Incap {
        report,
        incap_num,
        value,
    })
}

/// `CAPSENSE_REPORT` (0x1E): `pin & 0x3F`, then a 10-bit value across two
/// bytes, little-endian.
fn read_capsense_report(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let arg1 = read_u8(stream)?;
    let pin = arg1 & 0x3F;
    let arg2 = read_u8(stream)?;
    let value = (u16::from(arg1) >> 6) | (u16::from(arg2) << 2);
    Ok(IncomingEvent::CapsenseReport { pin, value })
}

/// `SET_CAPSENSE_SAMPLING` (0x1F) echoed back for bookkeeping: pin in the
/// low 6 bits, sampling-enabled in bit 7 — the same shape as the outgoing
/// command it echoes.
fn read_capsense_sampling_echo(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let arg = read_u8(stream)?;
    Ok(IncomingEvent::CapsenseSamplingEcho {
        pin: arg & 0x3F,
        enabled: arg & 0x80 != 0,
    })
}

/// `ICSP_CONFIG` (0x1A) echoed back as open/close confirmation, the same
/// single byte shape (0x01 open / 0x00 close) as the outgoing command.
fn read_icsp_config_echo(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let arg = read_u8(stream)?;
    Ok(IncomingEvent::IcspConfigEcho { open: arg != 0 })
}

/// `SEQUENCER_EVENT` (0x20): tag byte, with `Opened`/`Stopped` carrying one
/// extra free-slot-count byte.
fn read_sequencer_event(stream: &mut impl Read) -> io::Result<IncomingEvent> {
    let tag = read_u8(stream)?;
    let event = match tag {
        0 => SequencerEvent::Paused,
        1 => SequencerEvent::Stalled,
        2 => {
            let free_slots = read_u8(stream)?;
            SequencerEvent::Opened { free_slots }
        }
        3 => SequencerEvent::NextCue,
        4 => {
            let free_slots = read_u8(stream)?;
            SequencerEvent::Stopped { free_slots }
        }
        5 => SequencerEvent::Closed,
        _ => return Err(protocol_error("unrecognised sequencer event tag")),
    };
    Ok(IncomingEvent::SequencerEvent(event))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn orderly_disconnect_at_frame_boundary_yields_none() {
        let mut cursor: &[u8] = &[];
        assert_eq!(read_opcode(&mut cursor).unwrap(), None);
    }

    #[test]
    fn establish_connection_round_trips() {
        let mut bytes = Vec::<u8, 64>::new();
        bytes.extend_from_slice(b"IOIO").unwrap();
        bytes.extend_from_slice(b"IOIO0003").unwrap();
        bytes.extend_from_slice(b"BL000001").unwrap();
        bytes.extend_from_slice(b"FW000001").unwrap();
        let mut cursor: &[u8] = &bytes;
        let event = read_establish_connection(&mut cursor).unwrap();
        assert_eq!(
            event,
            IncomingEvent::EstablishConnection {
                hardware_id: *b"IOIO0003",
                bootloader_id: *b"BL000001",
                firmware_id: *b"FW000001",
            }
        );
    }

    #[test]
    fn establish_connection_rejects_bad_magic() {
        let bytes = *b"XXXXIOIO0003BL000001FW000001";
        let mut cursor: &[u8] = &bytes;
        assert!(read_establish_connection(&mut cursor).is_err());
    }

    #[test]
    fn digital_in_status_unpacks_pin_and_level() {
        let bytes = [0x35u8]; // pin 13, level 1
        let mut cursor: &[u8] = &bytes;
        let event = read_digital_in_status(&mut cursor).unwrap();
        assert_eq!(
            event,
            IncomingEvent::DigitalInStatus {
                pin: 13,
                level: true,
            }
        );
    }

    #[test]
    fn analog_in_status_uses_tracked_pin_list() {
        // Two tracked pins: one header byte, two sample bytes.
        // header = 0b0000_0110 -> pin0 low bits = 0b10, pin1 low bits = 0b01
        let bytes = [0b0000_0110u8, 0x01, 0x02];
        let mut cursor: &[u8] = &bytes;
        let event = read_analog_in_status(&mut cursor, &[31, 30]).unwrap();
        match event {
            IncomingEvent::AnalogInStatus { samples } => {
                assert_eq!(samples.len(), 2);
                assert_eq!(samples[0], (31, (u16::from(0x01u8) << 2) | 0b10));
                assert_eq!(samples[1], (30, (u16::from(0x02u8) << 2) | 0b01));
            }
            _ => panic!("wrong event"),
        }
    }

    #[test]
    fn i2c_result_aborted_is_a_distinct_outcome() {
        let bytes = [0x00u8, 0xFF];
        let mut cursor: &[u8] = &bytes;
        let event = read_i2c_result(&mut cursor).unwrap();
        assert_eq!(
            event,
            IncomingEvent::I2cResult {
                twi: 0,
                outcome: TwiTransactionOutcome::Aborted,
            }
        );
    }

    #[test]
    fn i2c_result_completed_carries_read_bytes() {
        let bytes = [0x00u8, 0x02, 0xAB, 0xCD];
        let mut cursor: &[u8] = &bytes;
        let event = read_i2c_result(&mut cursor).unwrap();
        match event {
            IncomingEvent::I2cResult { twi, outcome } => {
                assert_eq!(twi, 0);
                assert_eq!(
                    outcome,
                    TwiTransactionOutcome::Completed(Vec::from_slice(&[0xAB, 0xCD]).unwrap())
                );
            }
            _ => panic!("wrong event"),
        }
    }

    #[test]
    fn i2c_result_first_byte_low_bits_set_does_not_abort() {
        // arg = 0x03 -> twi 0, low two bits set; must not be mistaken for
        // an abort. Only the second byte (0xFF) is the abort sentinel.
        let bytes = [0x03u8, 0x01, 0xAB];
        let mut cursor: &[u8] = &bytes;
        let event = read_i2c_result(&mut cursor).unwrap();
        match event {
            IncomingEvent::I2cResult { twi, outcome } => {
                assert_eq!(twi, 0);
                assert_eq!(
                    outcome,
                    TwiTransactionOutcome::Completed(Vec::from_slice(&[0xAB]).unwrap())
                );
            }
            _ => panic!("wrong event"),
        }
    }

    #[test]
    fn tx_status_unpacks_id_from_low_bits_and_remaining_across_both_bytes() {
        // arg1: id = 0b10 in low 2 bits, remaining low bits 0b000101 in bits 2-7.
        // arg2: remaining high bits.
        let bytes = [0b0001_0110u8, 0x03];
        let mut cursor: &[u8] = &bytes;
        let event = read_tx_status(&mut cursor, ModuleKind::Uart).unwrap();
        assert_eq!(
            event,
            IncomingEvent::TxStatus {
                kind: ModuleKind::Uart,
                id: 0b10,
                remaining: (0b0001_0110u16 >> 2) | (0x03u16 << 6),
            }
        );
    }

    #[test]
    fn incap_size_zero_raw_means_four_bytes() {
        let bytes = [0x05u8, 0x11, 0x22, 0x33, 0x44]; // incap_num 5, raw size 0 -> 4 bytes
        let mut cursor: &[u8] = &bytes;
        let event = read_incap(&mut cursor, true).unwrap();
        assert_eq!(
            event,
            IncomingEvent::Incap {
                report: true,
                incap_num: 5,
                value: Vec::from_slice(&[0x11, 0x22, 0x33, 0x44]).unwrap(),
            }
        );
    }

    #[test]
    fn incap_size_one_raw_means_one_byte() {
        let bytes = [0b0100_0101u8, 0xAA]; // incap_num 5, raw size 1 -> 1 byte
        let mut cursor: &[u8] = &bytes;
        let event = read_incap(&mut cursor, false).unwrap();
        assert_eq!(
            event,
            IncomingEvent::Incap {
                report: false,
                incap_num: 5,
                value: Vec::from_slice(&[0xAA]).unwrap(),
            }
        );
    }

    #[test]
    fn mid_command_eof_is_an_error_not_an_orderly_disconnect() {
        let bytes = [opcode::REPORT_DIGITAL_IN_STATUS]; // missing the arg byte
        let mut cursor: &[u8] = &bytes;
        let opcode = read_opcode(&mut cursor).unwrap().expect("opcode present");
        let result = read_event(&mut cursor, opcode, &[]);
        assert!(result.is_err());
    }

    #[test]
    fn unrecognised_opcode_is_a_protocol_error() {
        let bytes = [0u8; 4];
        let mut cursor: &[u8] = &bytes;
        let result = read_event(&mut cursor, 0x7F, &[]);
        assert!(result.is_err());
    }

    #[test]
    fn sync_and_soft_close_carry_no_payload() {
        let mut cursor: &[u8] = &[];
        assert_eq!(
            read_event(&mut cursor, opcode::SYNC, &[]).unwrap(),
            IncomingEvent::Sync
        );
        let mut cursor2: &[u8] = &[];
        assert_eq!(
            read_event(&mut cursor2, opcode::SOFT_CLOSE, &[]).unwrap(),
            IncomingEvent::SoftClose
        );
    }

    #[test]
    fn change_notify_echo_unpacks_pin_and_flag() {
        let bytes = [0x35u8]; // pin 13, notify 1 — same shape as digital-in status
        let mut cursor: &[u8] = &bytes;
        let event = read_event(&mut cursor, opcode::SET_CHANGE_NOTIFY, &[]).unwrap();
        assert_eq!(
            event,
            IncomingEvent::ChangeNotifyEcho {
                pin: 13,
                notify: true,
            }
        );
    }

    #[test]
    fn reserved_periodic_digital_in_is_ignored_not_fatal() {
        let mut cursor: &[u8] = &[];
        let event =
            read_event(&mut cursor, opcode::REPORT_PERIODIC_DIGITAL_IN_STATUS, &[]).unwrap();
        assert_eq!(event, IncomingEvent::ReservedPeriodicDigitalIn);
    }

    #[test]
    fn icsp_config_echo_unpacks_open_flag() {
        let bytes = [0x01u8];
        let mut cursor: &[u8] = &bytes;
        let event = read_event(&mut cursor, opcode::ICSP_CONFIG, &[]).unwrap();
        assert_eq!(event, IncomingEvent::IcspConfigEcho { open: true });
    }

    #[test]
    fn capsense_sampling_echo_unpacks_pin_and_enabled() {
        let bytes = [0x9Fu8]; // pin 31, bit 7 set
        let mut cursor: &[u8] = &bytes;
        let event = read_event(&mut cursor, opcode::SET_CAPSENSE_SAMPLING, &[]).unwrap();
        assert_eq!(
            event,
            IncomingEvent::CapsenseSamplingEcho {
                pin: 31,
                enabled: true,
            }
        );
    }

    #[test]
    fn capsense_report_unpacks_pin_and_10bit_value() {
        // arg1: pin 5 in low 6 bits, value low 2 bits (0b10) in bits 6-7.
        // arg2: value high 8 bits.
        let bytes = [0b1000_0101u8, 0x03];
        let mut cursor: &[u8] = &bytes;
        let event = read_event(&mut cursor, opcode::CAPSENSE_REPORT, &[]).unwrap();
        assert_eq!(
            event,
            IncomingEvent::CapsenseReport {
                pin: 5,
                value: (0x03u16 << 2) | 0b10,
            }
        );
    }
}
