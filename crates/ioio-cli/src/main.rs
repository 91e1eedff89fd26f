// Desktop tooling crate — unwrap/expect acceptable outside the protocol engine itself.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ioio::{PinPull, PinState, PwmScale};
use ioio_transport_tcp::TcpTransport;
use tracing::info;

#[derive(Parser)]
#[command(name = "ioio-cli")]
#[command(about = "Drive a connected IOIO board over TCP", long_about = None)]
#[command(version)]
struct Cli {
    /// Address of the IOIO-over-TCP bridge, e.g. "192.168.1.50:4545".
    #[arg(long, default_value = "127.0.0.1:4545")]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Blink an LED on a digital output pin (spec scenario: digital-out blink).
    Blink {
        /// Pin to drive.
        #[arg(long, default_value_t = 13)]
        pin: u8,
        /// Number of on/off cycles.
        #[arg(long, default_value_t = 10)]
        cycles: u32,
        /// Milliseconds each half-cycle lasts.
        #[arg(long, default_value_t = 250)]
        period_ms: u64,
    },
    /// Sample an analog input pin and print readings until interrupted.
    AnalogIn {
        /// Pin to sample.
        #[arg(long, default_value_t = 31)]
        pin: u8,
        /// Number of samples to print before exiting.
        #[arg(long, default_value_t = 20)]
        samples: u32,
    },
    /// Drive a PWM output at a fixed duty cycle (spec scenario: 1kHz PWM).
    Pwm {
        /// Pin to drive.
        #[arg(long, default_value_t = 10)]
        pin: u8,
        /// OUTCOMPARE channel to allocate.
        #[arg(long, default_value_t = 0)]
        channel: u8,
        /// Duty cycle numerator out of 65536.
        #[arg(long, default_value_t = 32_768)]
        duty: u16,
        /// Seconds to hold the output before closing.
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let transport = TcpTransport::new(&cli.addr)
        .with_context(|| format!("resolving IOIO bridge address {}", cli.addr))?;
    let board = ioio::Board::connect(transport).context("starting session")?;
    let caps = board
        .wait_for_connect()
        .context("handshake with IOIO board")?;
    info!(pins = caps.pin_count(), "connected to board");

    match cli.command {
        Commands::Blink { pin, cycles, period_ms } => run_blink(&board, pin, cycles, period_ms),
        Commands::AnalogIn { pin, samples } => run_analog_in(&board, pin, samples),
        Commands::Pwm {
            pin,
            channel,
            duty,
            seconds,
        } => run_pwm(&board, pin, channel, duty, seconds),
    }
}

fn run_blink(board: &ioio::Board, pin: u8, cycles: u32, period_ms: u64) -> Result<()> {
    let out = board
        .open_digital_out(pin, false, PinState::Low)
        .context("opening digital output")?;
    for i in 0..cycles {
        out.write(PinState::High)?;
        thread::sleep(Duration::from_millis(period_ms));
        out.write(PinState::Low)?;
        thread::sleep(Duration::from_millis(period_ms));
        info!(cycle = i, "blinked");
    }
    Ok(())
}

fn run_analog_in(board: &ioio::Board, pin: u8, samples: u32) -> Result<()> {
    let mut input = board
        .open_analog_in(pin, true)
        .context("opening analog input")?;
    for _ in 0..samples {
        let value = input.wait_for_change()?;
        info!(pin, value, "sample");
    }
    Ok(())
}

fn run_pwm(board: &ioio::Board, pin: u8, channel: u8, duty: u16, seconds: u64) -> Result<()> {
    let pwm = board
        .open_pwm(pin, channel, PwmScale::X1, 15_999)
        .context("opening PWM output")?;
    pwm.set_duty_cycle(0, duty)?;
    info!(pin, channel, duty, "PWM running, holding for {seconds}s");
    thread::sleep(Duration::from_secs(seconds));
    Ok(())
}
