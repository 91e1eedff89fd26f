//! Per-board-model capability table (C7).
//!
//! Attached once, at handshake, from the 8-byte hardware id reported in
//! `ESTABLISH_CONNECTION`. Immutable for the life of the session.

use heapless::Vec;

/// Maximum pin count across known board models, used to size fixed arrays.
const MAX_PINS: usize = 64;

/// A fixed-size pin-tuple used to describe a TWI module's SDA/SCL pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwiPins {
    /// Serial data pin.
    pub sda: u8,
    /// Serial clock pin.
    pub scl: u8,
}

/// The three pins dedicated to ICSP master mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcspPins {
    /// Programming clock (PGC).
    pub pgc: u8,
    /// Programming data (PGD).
    pub pgd: u8,
    /// Master clear / reset.
    pub mclr: u8,
}

/// Known board hardware models, resolved from the 8-byte hardware id sent at
/// `ESTABLISH_CONNECTION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardModel {
    /// Classic IOIO board (PIC24).
    Ioio0003,
    /// IOIO-OTG board (PIC24FJ256DA206).
    Ioio0004,
    /// Hardware id not recognised by this implementation.
    Unknown,
}

impl BoardModel {
    /// Resolve a board model from the 8-byte hardware id. Any id not listed
    /// here resolves to [`BoardModel::Unknown`], which the connection state
    /// machine treats as INCOMPATIBLE.
    #[must_use]
    pub fn from_hardware_id(id: &[u8; 8]) -> Self {
        match id {
            b"IOIO0003" => BoardModel::Ioio0003,
            b"IOIO0004" => BoardModel::Ioio0004,
            _ => BoardModel::Unknown,
        }
    }

    /// The capability table for this model, or `None` for [`BoardModel::Unknown`].
    #[must_use]
    pub fn capabilities(self) -> Option<CapabilityTable> {
        match self {
            BoardModel::Ioio0003 => Some(CapabilityTable::ioio0003()),
            BoardModel::Ioio0004 => Some(CapabilityTable::ioio0004()),
            BoardModel::Unknown => None,
        }
    }
}

/// Per-board-model classification of pins and peripheral-instance pools.
///
/// Pin membership sets are represented as bitmasks over `MAX_PINS` rather
/// than `Vec<u8>` to keep capability checks (`is_analog_capable`, …) O(1) and
/// allocation-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityTable {
    pin_count: u8,
    analog_capable: u64,
    peripheral_in_capable: u64,
    peripheral_out_capable: u64,
    capsense_capable: u64,
    twi_pins: Vec<TwiPins, 8>,
    icsp_pins: IcspPins,
    outcompare_pool_size: u8,
    uart_pool_size: u8,
    spi_pool_size: u8,
    incap_pool_size: u8,
    sequencer_cue_channels: u8,
}

impl CapabilityTable {
    /// Total addressable pin count on this board.
    #[must_use]
    pub const fn pin_count(&self) -> u8 {
        self.pin_count
    }

    /// Whether `pin` may be configured for analog input.
    #[must_use]
    pub fn is_analog_capable(&self, pin: u8) -> bool {
        Self::bit_set(self.analog_capable, pin)
    }

    /// Whether `pin` may be routed to a peripheral's input function
    /// (UART RX, SPI MISO, …).
    #[must_use]
    pub fn is_peripheral_in_capable(&self, pin: u8) -> bool {
        Self::bit_set(self.peripheral_in_capable, pin)
    }

    /// Whether `pin` may be routed to a peripheral's output function
    /// (UART TX, SPI MOSI/CLK, PWM, …).
    #[must_use]
    pub fn is_peripheral_out_capable(&self, pin: u8) -> bool {
        Self::bit_set(self.peripheral_out_capable, pin)
    }

    /// Whether `pin` may be configured for capacitive-sense sampling.
    #[must_use]
    pub fn is_capsense_capable(&self, pin: u8) -> bool {
        Self::bit_set(self.capsense_capable, pin)
    }

    /// The fixed SDA/SCL pin pair for TWI module `twi_num`, if that module
    /// number exists on this board.
    #[must_use]
    pub fn twi_pins(&self, twi_num: u8) -> Option<TwiPins> {
        self.twi_pins.get(usize::from(twi_num)).copied()
    }

    /// The fixed PGC/PGD/MCLR pins used for ICSP master mode.
    #[must_use]
    pub const fn icsp_pins(&self) -> IcspPins {
        self.icsp_pins
    }

    /// Number of OUTCOMPARE (PWM) channel ids available for allocation.
    #[must_use]
    pub const fn outcompare_pool_size(&self) -> u8 {
        self.outcompare_pool_size
    }

    /// Number of UART module ids available for allocation.
    #[must_use]
    pub const fn uart_pool_size(&self) -> u8 {
        self.uart_pool_size
    }

    /// Number of SPI module ids available for allocation.
    #[must_use]
    pub const fn spi_pool_size(&self) -> u8 {
        self.spi_pool_size
    }

    /// Number of INCAP channel ids available for allocation.
    #[must_use]
    pub const fn incap_pool_size(&self) -> u8 {
        self.incap_pool_size
    }

    /// Number of sequencer cue channels the firmware can hold in flight.
    #[must_use]
    pub const fn sequencer_cue_channels(&self) -> u8 {
        self.sequencer_cue_channels
    }

    fn bit_set(mask: u64, pin: u8) -> bool {
        match 1u64.checked_shl(u32::from(pin)) {
            Some(bit) => mask & bit != 0,
            None => false,
        }
    }

    fn mask_range(from: u8, to_inclusive: u8) -> u64 {
        let mut mask: u64 = 0;
        let mut pin = from;
        while pin <= to_inclusive {
            if let Some(bit) = 1u64.checked_shl(u32::from(pin)) {
                mask |= bit;
            }
            let Some(next) = pin.checked_add(1) else {
                break;
            };
            pin = next;
        }
        mask
    }

    /// Classic IOIO board: 46 pins, PIC24 pinout.
    fn ioio0003() -> Self {
        let mut twi_pins = Vec::new();
        // IOIO0003 exposes two fixed TWI modules.
        let _ = twi_pins.push(TwiPins { sda: 4, scl: 5 });
        let _ = twi_pins.push(TwiPins { sda: 14, scl: 15 });
        CapabilityTable {
            pin_count: 46,
            analog_capable: Self::mask_range(0, 15),
            peripheral_in_capable: Self::mask_range(0, 39),
            peripheral_out_capable: Self::mask_range(0, 39),
            capsense_capable: Self::mask_range(0, 15),
            twi_pins,
            icsp_pins: IcspPins {
                pgc: 40,
                pgd: 41,
                mclr: 42,
            },
            outcompare_pool_size: 8,
            uart_pool_size: 4,
            spi_pool_size: 4,
            incap_pool_size: 8,
            sequencer_cue_channels: 8,
        }
    }

    /// IOIO-OTG board: 62 pins, larger peripheral pools.
    fn ioio0004() -> Self {
        let mut twi_pins = Vec::new();
        let _ = twi_pins.push(TwiPins { sda: 4, scl: 5 });
        let _ = twi_pins.push(TwiPins { sda: 14, scl: 15 });
        let _ = twi_pins.push(TwiPins { sda: 25, scl: 26 });
        CapabilityTable {
            pin_count: 62,
            analog_capable: Self::mask_range(0, 19),
            peripheral_in_capable: Self::mask_range(0, 55),
            peripheral_out_capable: Self::mask_range(0, 55),
            capsense_capable: Self::mask_range(0, 19),
            twi_pins,
            icsp_pins: IcspPins {
                pgc: 56,
                pgd: 57,
                mclr: 58,
            },
            outcompare_pool_size: 10,
            uart_pool_size: 6,
            spi_pool_size: 6,
            incap_pool_size: 10,
            sequencer_cue_channels: 8,
        }
    }
}

const _: () = assert!(MAX_PINS <= 64, "pin bitmask must fit in a u64");

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn unknown_hardware_id_has_no_capabilities() {
        let model = BoardModel::from_hardware_id(b"XXXXXXXX");
        assert_eq!(model, BoardModel::Unknown);
        assert!(model.capabilities().is_none());
    }

    #[test]
    fn ioio0003_resolves_and_classifies_pins() {
        let model = BoardModel::from_hardware_id(b"IOIO0003");
        let caps = model.capabilities().expect("IOIO0003 is known");
        assert_eq!(caps.pin_count(), 46);
        assert!(caps.is_analog_capable(0));
        assert!(caps.is_analog_capable(15));
        assert!(!caps.is_analog_capable(16));
    }

    #[test]
    fn ioio0004_has_a_larger_pool_than_ioio0003() {
        let small = BoardModel::from_hardware_id(b"IOIO0003")
            .capabilities()
            .expect("known");
        let big = BoardModel::from_hardware_id(b"IOIO0004")
            .capabilities()
            .expect("known");
        assert!(big.pin_count() > small.pin_count());
        assert!(big.uart_pool_size() > small.uart_pool_size());
    }

    #[test]
    fn twi_pins_resolved_by_module_number() {
        let caps = BoardModel::from_hardware_id(b"IOIO0003")
            .capabilities()
            .expect("known");
        assert_eq!(caps.twi_pins(0), Some(TwiPins { sda: 4, scl: 5 }));
        assert_eq!(caps.twi_pins(1), Some(TwiPins { sda: 14, scl: 15 }));
        assert_eq!(caps.twi_pins(2), None);
    }
}
