//! Typed facade over [`ioio_core`]: one small handle type per peripheral
//! kind, each backed by a shared [`Board`].
//!
//! `ioio-core` deliberately knows nothing about what a "pin" or a "SPI bus"
//! feels like to hold onto from calling code — it exposes open/operate/close
//! methods on [`ioio_core::IoioSession`] and leaves shaping them into
//! individual owned objects to this crate. Every handle here is `Drop`-safe:
//! letting a [`DigitalOutput`] or [`Uart`] go out of scope closes it on the
//! device and releases its resource-manager claim, the same contract
//! `std::net::TcpStream` gives a socket.

mod analog;
mod board;
mod capsense;
mod digital;
mod icsp;
mod incap;
mod pwm;
mod sequencer;
mod spi;
mod twi;
mod uart;

pub use analog::AnalogInput;
pub use board::Board;
pub use capsense::CapSense;
pub use digital::{DigitalInput, DigitalOutput};
pub use icsp::IcspMaster;
pub use incap::{IncapDouble, IncapSingle};
pub use pwm::PwmOutput;
pub use sequencer::Sequencer;
pub use spi::SpiMaster;
pub use twi::TwiMaster;
pub use uart::Uart;

pub use ioio_core::capability::CapabilityTable;
pub use ioio_core::codec::encode::{SequencerAction, SpiPinFunction, UartParity};
pub use ioio_core::codec::TwiTransactionOutcome;
pub use ioio_core::config::{PinPull, PinState, PwmScale, TwiRate};
pub use ioio_core::error::{IoioError, Result};
