//! Central configuration constants.
//!
//! All wire-format limits that must agree between the codec, the resource
//! manager, and the facades live here rather than being hardcoded at each
//! call site.

/// Maximum payload bytes in a single `UART_DATA` command (§4.1).
pub const UART_DATA_MAX_BYTES: usize = 64;

/// Maximum cue-configuration bytes in `SEQUENCER_CONFIGURE` / `SEQUENCER_PUSH`
/// (§4.1).
pub const SEQUENCER_MAX_CUE_BYTES: usize = 68;

/// Maximum payload bytes in a single `SPI_MASTER_REQUEST` transfer. Not
/// stated as a hard wire limit in the spec; bounded here to the same order
/// of magnitude as the firmware's USB endpoint buffer, consistent with
/// `UART_DATA_MAX_BYTES`.
pub const SPI_REQUEST_MAX_BYTES: usize = 64;

/// PWM period-scale encodings from §4.1 (`SET_PWM_PERIOD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmScale {
    /// 1x base clock.
    X1,
    /// 8x prescale.
    X8,
    /// 64x prescale.
    X64,
    /// 256x prescale.
    X256,
}

impl PwmScale {
    /// The 2-bit `scale_enc` value packed into `SET_PWM_PERIOD`.
    #[must_use]
    pub const fn encoding(self) -> u8 {
        match self {
            PwmScale::X1 => 0,
            PwmScale::X256 => 1,
            PwmScale::X64 => 2,
            PwmScale::X8 => 3,
        }
    }
}

/// I2C/TWI bus rate codes from §4.1 (`I2C_CONFIGURE_MASTER`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwiRate {
    /// 100 kHz standard mode.
    Rate100k,
    /// 400 kHz fast mode.
    Rate400k,
    /// 1 MHz fast mode plus.
    Rate1M,
}

impl TwiRate {
    /// The 2-bit `rate_code` packed into `I2C_CONFIGURE_MASTER`. `0` is
    /// reserved for "closed".
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            TwiRate::Rate100k => 1,
            TwiRate::Rate400k => 2,
            TwiRate::Rate1M => 3,
        }
    }
}

/// Pull configuration for a digital input pin (`SET_PIN_DIGITAL_IN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinPull {
    /// No pull resistor.
    Floating,
    /// Internal pull-up.
    PullUp,
    /// Internal pull-down.
    PullDown,
}

impl PinPull {
    /// The 2-bit `pull` value packed into `SET_PIN_DIGITAL_IN`.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            PinPull::Floating => 0,
            PinPull::PullUp => 1,
            PinPull::PullDown => 2,
        }
    }
}

/// Logic level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    /// Logic low.
    Low,
    /// Logic high.
    High,
}

impl PinState {
    #[must_use]
    pub(crate) const fn as_bit(self) -> bool {
        matches!(self, PinState::High)
    }
}

impl From<bool> for PinState {
    fn from(value: bool) -> Self {
        if value {
            PinState::High
        } else {
            PinState::Low
        }
    }
}

impl From<PinState> for bool {
    fn from(value: PinState) -> Self {
        value.as_bit()
    }
}
