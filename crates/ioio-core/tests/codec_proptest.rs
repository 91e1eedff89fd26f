//! Property-based tests for the wire codec's encode/decode invariants.
//! Verifies invariants hold for ALL valid inputs, not just fixed examples.
#![allow(clippy::unwrap_used, clippy::panic)]

use std::io::Cursor;

use ioio_core::codec::decode;
use ioio_core::codec::encode;
use ioio_core::config::PinState;
use ioio_core::opcode;

proptest::proptest! {
    /// Every in-range pin round-trips through `SET_DIGITAL_OUT_LEVEL`'s
    /// `pin<<2 | value` packing without error.
    #[test]
    fn digital_out_level_never_fails_for_in_range_pins(pin in 0u8..=0x3F, value in proptest::bool::ANY) {
        let level = if value { PinState::High } else { PinState::Low };
        let cmd = encode::set_digital_out_level(pin, level).unwrap();
        assert_eq!(cmd.len(), 2);
        assert_eq!(cmd[0], opcode::SET_DIGITAL_OUT_LEVEL);
    }

    /// Pins above the 6-bit field width are always rejected, never silently
    /// truncated.
    #[test]
    fn digital_out_level_rejects_out_of_range_pins(pin in 0x40u8..=0xFFu8) {
        assert!(encode::set_digital_out_level(pin, PinState::Low).is_err());
    }

    /// Encoding then decoding `REPORT_DIGITAL_IN_STATUS` recovers the exact
    /// pin and level for every in-range pin, matching the host's own
    /// `pin<<2 | level` packing used for the outgoing command.
    #[test]
    fn digital_in_status_round_trips(pin in 0u8..=0x3F, level in proptest::bool::ANY) {
        let arg = (pin << 2) | u8::from(level);
        let frame = [opcode::REPORT_DIGITAL_IN_STATUS, arg];
        let mut cursor = Cursor::new(&frame[..]);
        let op = decode::read_opcode(&mut cursor).unwrap().unwrap();
        let event = decode::read_event(&mut cursor, op, &[]).unwrap();
        match event {
            ioio_core::codec::IncomingEvent::DigitalInStatus { pin: got_pin, level: got_level } => {
                assert_eq!(got_pin, pin);
                assert_eq!(got_level, level);
            }
            other => panic!("expected DigitalInStatus, got {other:?}"),
        }
    }

    /// `UART_DATA` accepts every payload length in `[1, 64]` and always
    /// produces a frame exactly 2 bytes longer than the payload.
    #[test]
    fn uart_data_accepts_valid_lengths(len in 1usize..=64usize) {
        let payload = vec![0xABu8; len];
        let cmd = encode::uart_data(0, &payload).unwrap();
        assert_eq!(cmd.len(), len + 2);
    }

    /// `UART_DATA` rejects every payload length above 64, never truncating.
    #[test]
    fn uart_data_rejects_oversize_lengths(len in 65usize..=200usize) {
        let payload = vec![0u8; len];
        assert!(encode::uart_data(0, &payload).is_err());
    }

    /// `SEQUENCER_PUSH` accepts every cue length in `[0, 68]`.
    #[test]
    fn sequencer_push_accepts_valid_cue_lengths(len in 0usize..=68usize) {
        let cue = vec![0u8; len];
        assert!(encode::sequencer_push(0, &cue).is_ok());
    }

    /// `SEQUENCER_PUSH` rejects every cue length above 68.
    #[test]
    fn sequencer_push_rejects_oversize_cues(len in 69usize..=150usize) {
        let cue = vec![0u8; len];
        assert!(encode::sequencer_push(0, &cue).is_err());
    }
}
