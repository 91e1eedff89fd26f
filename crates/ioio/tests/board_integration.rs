//! End-to-end facade tests over an in-memory board. These exercise `Board`
//! and its handle types the way an application would, driving a fake board
//! side to script firmware responses and checking both the bytes that cross
//! the wire and the handle's observable behaviour.

use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use ioio::{Board, PinPull, PinState, PwmScale};
use ioio_core::mocks::{mock_transport_pair, MockTransport};

fn handshake_bytes(hardware_id: &[u8; 8]) -> Vec<u8> {
    let mut frame = vec![ioio_core::opcode::ESTABLISH_CONNECTION];
    frame.extend_from_slice(b"IOIO");
    frame.extend_from_slice(hardware_id);
    frame.extend_from_slice(b"IOIO0000");
    frame.extend_from_slice(b"IOIO0000");
    frame
}

fn connected_board() -> (Board, MockTransport) {
    let (host, mut board_side) = mock_transport_pair();
    let board = Board::connect(host).unwrap();
    board_side.write_all(&handshake_bytes(b"IOIO0003")).unwrap();
    let mut check_interface = [0u8; 9];
    board_side.read_exact(&mut check_interface).unwrap();
    assert_eq!(check_interface[0], ioio_core::opcode::CHECK_INTERFACE);
    board_side
        .write_all(&[ioio_core::opcode::CHECK_INTERFACE_RESPONSE, 0x01])
        .unwrap();
    board.wait_for_connect().unwrap();
    (board, board_side)
}

#[test]
fn digital_out_blink_then_close_matches_spec_scenario_1() {
    let (board, mut board_side) = connected_board();
    let pin13 = board.open_digital_out(13, false, PinState::Low).unwrap();
    pin13.write(PinState::High).unwrap();
    pin13.write(PinState::Low).unwrap();
    drop(pin13);

    let mut wire = [0u8; 8];
    board_side.read_exact(&mut wire).unwrap();
    assert_eq!(wire, [0x03, 0x34, 0x04, 0x35, 0x04, 0x34, 0x05, 0x34]);
}

#[test]
fn digital_input_observes_reported_level_changes() {
    let (board, mut board_side) = connected_board();
    let mut input = board.open_digital_in(7, PinPull::Floating).unwrap();

    let mut open_cmd = [0u8; 2];
    board_side.read_exact(&mut open_cmd).unwrap();
    assert_eq!(open_cmd[0], ioio_core::opcode::SET_PIN_DIGITAL_IN);

    let handle = thread::spawn(move || input.wait_for_change());
    thread::sleep(Duration::from_millis(20));
    board_side
        .write_all(&[ioio_core::opcode::REPORT_DIGITAL_IN_STATUS, (7 << 2) | 1])
        .unwrap();
    assert!(handle.join().unwrap().unwrap());
}

#[test]
fn pwm_open_matches_spec_scenario_3() {
    let (board, mut board_side) = connected_board();
    let pwm = board.open_pwm(10, 0, PwmScale::X1, 15_999).unwrap();
    assert_eq!(pwm.channel(), 0);

    // `SET_PIN_PWM` enable (3 bytes) then `SET_PWM_PERIOD` for period=15999
    // (4 bytes), sent as one batch per spec.md §8 scenario 3.
    let mut wire = [0u8; 7];
    board_side.read_exact(&mut wire).unwrap();
    assert_eq!(wire, [0x08, 0x0A, 0x80, 0x0A, 0x00, 0x7F, 0x3E]);
}

#[test]
fn sync_blocks_until_device_echo_matches_spec_scenario_5() {
    let (board, mut board_side) = connected_board();
    let out = board.open_digital_out(3, false, PinState::Low).unwrap();
    out.write(PinState::High).unwrap();

    let mut write_cmd = [0u8; 4];
    board_side.read_exact(&mut write_cmd).unwrap();

    let sync_board = board.clone();
    let handle = thread::spawn(move || sync_board.sync());

    let mut sync_byte = [0u8; 1];
    board_side.read_exact(&mut sync_byte).unwrap();
    assert_eq!(sync_byte[0], ioio_core::opcode::SYNC);

    // `sync` must still be blocked: no echo has arrived yet.
    thread::sleep(Duration::from_millis(20));
    assert!(!handle.is_finished());

    board_side.write_all(&[ioio_core::opcode::SYNC]).unwrap();
    handle.join().unwrap().unwrap();
}

#[test]
fn disconnect_wakes_a_blocked_analog_reader_with_connection_lost() {
    let (board, _board_side) = connected_board();
    let mut analog = board.open_analog_in(31, true).unwrap();
    let handle = thread::spawn(move || analog.wait_for_change());
    thread::sleep(Duration::from_millis(20));
    board.disconnect();
    let err = handle.join().unwrap().unwrap_err();
    assert!(matches!(err, ioio::IoioError::ConnectionLost));
}

#[test]
fn closing_a_pin_lets_a_second_open_reclaim_it() {
    let (board, _board_side) = connected_board();
    let out = board.open_digital_out(2, false, PinState::Low).unwrap();
    drop(out);
    // The pin is free again immediately after drop runs `close_pin`.
    let reopened = board.open_digital_in(2, PinPull::Floating);
    assert!(reopened.is_ok());
}
