//! Criterion benchmarks for the wire codec (C1).
//!
//! Run: cargo bench -p ioio-core --bench codec
//!
//! Results show:
//!   encode_digital_out   — single-command encode cost (the hot path for
//!                          bit-banged digital I/O loops)
//!   encode_uart_data_64  — worst-case UART_DATA framing (max 64-byte chunk)
//!   decode_digital_in    — single-event decode cost off a `Read` stream
//!   decode_analog_burst  — decoding a run of `REPORT_ANALOG_IN_STATUS`
//!                          events, the densest incoming event on the wire

#![allow(clippy::unwrap_used, missing_docs)]

use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion};

use ioio_core::codec::decode;
use ioio_core::codec::encode;
use ioio_core::config::PinState;
use ioio_core::opcode;

fn bench_encode_digital_out(c: &mut Criterion) {
    c.bench_function("encode_digital_out", |b| {
        b.iter(|| encode::set_digital_out_level(13, PinState::High).unwrap());
    });
}

fn bench_encode_uart_data_64(c: &mut Criterion) {
    let payload = [0xABu8; 64];
    c.bench_function("encode_uart_data_64", |b| {
        b.iter(|| encode::uart_data(0, &payload).unwrap());
    });
}

fn bench_decode_digital_in(c: &mut Criterion) {
    let frame = [opcode::REPORT_DIGITAL_IN_STATUS, (7 << 2) | 1];
    c.bench_function("decode_digital_in", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(&frame[..]);
            let op = decode::read_opcode(&mut cursor).unwrap().unwrap();
            decode::read_event(&mut cursor, op, &[]).unwrap()
        });
    });
}

fn bench_decode_analog_burst(c: &mut Criterion) {
    let tracked_pins: Vec<u8> = (0..16).collect();
    // Each analog sample packs 2 bits into a header byte re-read every 4
    // pins, so 16 tracked pins cost 4 header bytes + 16 sample bytes.
    let mut frame = vec![opcode::REPORT_ANALOG_IN_STATUS];
    for chunk in tracked_pins.chunks(4) {
        frame.push(0); // header byte
        frame.extend(std::iter::repeat(0x00u8).take(chunk.len()));
    }
    c.bench_function("decode_analog_burst_16_pins", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(&frame[..]);
            let op = decode::read_opcode(&mut cursor).unwrap().unwrap();
            decode::read_event(&mut cursor, op, &tracked_pins).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_encode_digital_out,
    bench_encode_uart_data_64,
    bench_decode_digital_in,
    bench_decode_analog_burst
);
criterion_main!(benches);
