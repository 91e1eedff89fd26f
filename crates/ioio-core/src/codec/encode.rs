//! Outgoing command encoders (§4.1).
//!
//! Every function here produces one complete, self-contained command frame.
//! Bounds on caller-supplied data (pin numbers, buffer lengths) are checked
//! explicitly and rejected with [`IoioError::IllegalArgument`] before any
//! byte is written — the crate never silently truncates a command, because a
//! truncated wire frame desyncs the whole duplex stream for every other
//! open resource.

use super::{CommandBuf, MAX_COMMAND_LEN};
use crate::config::{PinPull, PinState, PwmScale, TwiRate};
use crate::error::{IoioError, Result};
use crate::opcode;

fn push(buf: &mut CommandBuf, byte: u8) -> Result<()> {
    buf.push(byte)
        .map_err(|_| IoioError::IllegalArgument("command exceeds maximum frame length"))
}

fn push_slice(buf: &mut CommandBuf, bytes: &[u8]) -> Result<()> {
    for &b in bytes {
        push(buf, b)?;
    }
    Ok(())
}

fn push_u16_le(buf: &mut CommandBuf, value: u16) -> Result<()> {
    let bytes = value.to_le_bytes();
    push_slice(buf, &bytes)
}

/// `HARD_RESET` (0x00): opcode, then ASCII `IOIO`.
pub fn hard_reset() -> Result<CommandBuf> {
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::HARD_RESET)?;
    push_slice(&mut buf, &opcode::IOIO_MAGIC)?;
    Ok(buf)
}

/// `SOFT_RESET` (0x01): opcode only.
pub fn soft_reset() -> Result<CommandBuf> {
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SOFT_RESET)?;
    Ok(buf)
}

/// `SOFT_CLOSE` (0x1D): opcode only.
pub fn soft_close() -> Result<CommandBuf> {
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SOFT_CLOSE)?;
    Ok(buf)
}

/// `CHECK_INTERFACE` (0x02): opcode, then the 8-byte required interface id.
pub fn check_interface() -> Result<CommandBuf> {
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::CHECK_INTERFACE)?;
    push_slice(&mut buf, &opcode::REQUIRED_INTERFACE_ID)?;
    Ok(buf)
}

/// `SET_PIN_DIGITAL_OUT` (0x03): `pin<<2 | (open_drain?1:0) | (value?2:0)`.
pub fn set_pin_digital_out(pin: u8, open_drain: bool, value: PinState) -> Result<CommandBuf> {
    let arg = pack_pin_arg(pin)?
        | u8::from(open_drain)
        | (u8::from(bool::from(value)) << 1);
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_PIN_DIGITAL_OUT)?;
    push(&mut buf, arg)?;
    Ok(buf)
}

/// `SET_DIGITAL_OUT_LEVEL` (0x04): `pin<<2 | (value?1:0)`.
pub fn set_digital_out_level(pin: u8, value: PinState) -> Result<CommandBuf> {
    let arg = pack_pin_arg(pin)? | u8::from(bool::from(value));
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_DIGITAL_OUT_LEVEL)?;
    push(&mut buf, arg)?;
    Ok(buf)
}

/// `SET_PIN_DIGITAL_IN` (0x05): `pin<<2 | pull`.
pub fn set_pin_digital_in(pin: u8, pull: PinPull) -> Result<CommandBuf> {
    let arg = pack_pin_arg(pin)? | pull.code();
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_PIN_DIGITAL_IN)?;
    push(&mut buf, arg)?;
    Ok(buf)
}

/// `SET_CHANGE_NOTIFY` (0x06): `pin<<2 | (notify?1:0)`.
pub fn set_change_notify(pin: u8, notify: bool) -> Result<CommandBuf> {
    let arg = pack_pin_arg(pin)? | u8::from(notify);
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_CHANGE_NOTIFY)?;
    push(&mut buf, arg)?;
    Ok(buf)
}

/// `SET_PIN_PWM` (0x08): opcode, `pin & 0x3F`, `(enable?0x80:0) | (pwm_num & 0x0F)`.
pub fn set_pin_pwm(pin: u8, enable: bool, pwm_num: u8) -> Result<CommandBuf> {
    if pin > 0x3F {
        return Err(IoioError::IllegalArgument("pin number out of range"));
    }
    if pwm_num > 0x0F {
        return Err(IoioError::IllegalArgument("pwm channel out of range"));
    }
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_PIN_PWM)?;
    push(&mut buf, pin)?;
    push(&mut buf, (u8::from(enable) << 7) | pwm_num)?;
    Ok(buf)
}

/// `SET_PWM_DUTY_CYCLE` (0x09): `pwm_num<<2 | fraction`, duty (u16 LE).
pub fn set_pwm_duty_cycle(pwm_num: u8, fraction: u8, duty: u16) -> Result<CommandBuf> {
    if pwm_num > 0x3F || fraction > 0x03 {
        return Err(IoioError::IllegalArgument("pwm_num/fraction out of range"));
    }
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_PWM_DUTY_CYCLE)?;
    push(&mut buf, (pwm_num << 2) | fraction)?;
    push_u16_le(&mut buf, duty)?;
    Ok(buf)
}

/// `SET_PWM_PERIOD` (0x0A): `((scale_enc & 2)<<6) | (pwm_num<<1) | (scale_enc & 1)`, period (u16 LE).
pub fn set_pwm_period(pwm_num: u8, scale: PwmScale, period: u16) -> Result<CommandBuf> {
    if pwm_num > 0x3F {
        return Err(IoioError::IllegalArgument("pwm_num out of range"));
    }
    let scale_enc = scale.encoding();
    let arg = ((scale_enc & 2) << 6) | (pwm_num << 1) | (scale_enc & 1);
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_PWM_PERIOD)?;
    push(&mut buf, arg)?;
    push_u16_le(&mut buf, period)?;
    Ok(buf)
}

/// `SET_PIN_ANALOG_IN` (0x0B): opcode, `pin & 0x3F`.
pub fn set_pin_analog_in(pin: u8) -> Result<CommandBuf> {
    if pin > 0x3F {
        return Err(IoioError::IllegalArgument("pin number out of range"));
    }
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_PIN_ANALOG_IN)?;
    push(&mut buf, pin)?;
    Ok(buf)
}

/// `SET_ANALOG_IN_SAMPLING` (0x0C): `(enable?0x80:0) | (pin & 0x3F)`.
pub fn set_analog_in_sampling(pin: u8, enable: bool) -> Result<CommandBuf> {
    if pin > 0x3F {
        return Err(IoioError::IllegalArgument("pin number out of range"));
    }
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_ANALOG_IN_SAMPLING)?;
    push(&mut buf, (u8::from(enable) << 7) | pin)?;
    Ok(buf)
}

/// UART parity as packed into `UART_CONFIG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartParity {
    /// No parity.
    None,
    /// Even parity.
    Even,
    /// Odd parity.
    Odd,
}

impl UartParity {
    const fn bits(self) -> u8 {
        match self {
            UartParity::None => 0,
            UartParity::Even => 1,
            UartParity::Odd => 2,
        }
    }
}

/// `UART_CONFIG` (0x0D): `uart<<6 | (4x?8:0) | (two_stop?4:0) | parity_bits`, rate (u16 LE).
/// `rate = 0` closes the UART.
pub fn uart_config(
    uart: u8,
    rate: u16,
    four_x: bool,
    two_stop: bool,
    parity: UartParity,
) -> Result<CommandBuf> {
    if uart > 0x03 {
        return Err(IoioError::IllegalArgument("uart id out of range"));
    }
    let arg = (uart << 6) | (u8::from(four_x) << 3) | (u8::from(two_stop) << 2) | parity.bits();
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::UART_CONFIG)?;
    push(&mut buf, arg)?;
    push_u16_le(&mut buf, rate)?;
    Ok(buf)
}

/// `UART_DATA` (0x0E): `((count-1) & 0x3F) | (uart<<6)`, then `count` bytes.
/// `count` must be in `[1, 64]`.
pub fn uart_data(uart: u8, data: &[u8]) -> Result<CommandBuf> {
    if data.is_empty() || data.len() > crate::config::UART_DATA_MAX_BYTES {
        return Err(IoioError::IllegalArgument(
            "uart_data payload must be 1..=64 bytes",
        ));
    }
    if uart > 0x03 {
        return Err(IoioError::IllegalArgument("uart id out of range"));
    }
    // count in [1, 64] so (count - 1) in [0, 63] fits 0x3F.
    let count_minus_one = u8::try_from(data.len().saturating_sub(1))
        .map_err(|_| IoioError::IllegalArgument("uart_data payload too large"))?;
    let arg = (count_minus_one & 0x3F) | (uart << 6);
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::UART_DATA)?;
    push(&mut buf, arg)?;
    push_slice(&mut buf, data)?;
    Ok(buf)
}

/// `SET_PIN_UART` (0x0F): opcode, pin, `(enable?0x80:0) | (tx?0x40:0) | uart`.
pub fn set_pin_uart(pin: u8, enable: bool, tx: bool, uart: u8) -> Result<CommandBuf> {
    if uart > 0x3F {
        return Err(IoioError::IllegalArgument("uart id out of range"));
    }
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_PIN_UART)?;
    push(&mut buf, pin)?;
    push(&mut buf, (u8::from(enable) << 7) | (u8::from(tx) << 6) | uart)?;
    Ok(buf)
}

/// `SPI_CONFIGURE_MASTER` (0x10): `spi<<5 | rate_code`,
/// `(sample_on_trailing?0:2) | (invert_clk?1:0)`. `rate_code = 0` closes.
pub fn spi_configure_master(
    spi: u8,
    rate_code: u8,
    sample_on_trailing: bool,
    invert_clk: bool,
) -> Result<CommandBuf> {
    if spi > 0x07 || rate_code > 0x1F {
        return Err(IoioError::IllegalArgument("spi/rate_code out of range"));
    }
    let second = (u8::from(!sample_on_trailing) << 1) | u8::from(invert_clk);
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SPI_CONFIGURE_MASTER)?;
    push(&mut buf, (spi << 5) | rate_code)?;
    push(&mut buf, second)?;
    Ok(buf)
}

/// `SPI_MASTER_REQUEST` (0x11).
///
/// `data` is the outgoing payload; `resp` is how many bytes of the response
/// the caller wants back; `total` is the maximum of the two (the firmware
/// transfer length). Flags mark when `data`/`resp` differ from `total`.
pub fn spi_master_request(
    spi: u8,
    ss_pin: u8,
    total: u8,
    data_count: Option<u8>,
    resp_count: Option<u8>,
    payload: &[u8],
) -> Result<CommandBuf> {
    if spi > 0x03 || ss_pin > 0x3F {
        return Err(IoioError::IllegalArgument("spi/ss_pin out of range"));
    }
    if total == 0 || total > 0x40 {
        return Err(IoioError::IllegalArgument("spi total out of range"));
    }
    if payload.len() > crate::config::SPI_REQUEST_MAX_BYTES {
        return Err(IoioError::IllegalArgument("spi payload too large"));
    }
    let data_differs = data_count.is_some_and(|d| usize::from(d) != usize::from(total));
    let resp_differs = resp_count.is_some_and(|r| usize::from(r) != usize::from(total));
    let total_minus_one = total
        .checked_sub(1)
        .ok_or(IoioError::IllegalArgument("spi total out of range"))?;
    let second = (u8::from(data_differs) << 7) | (u8::from(resp_differs) << 6) | total_minus_one;

    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SPI_MASTER_REQUEST)?;
    push(&mut buf, (spi << 6) | ss_pin)?;
    push(&mut buf, second)?;
    if let Some(d) = data_count {
        push(&mut buf, d)?;
    }
    if let Some(r) = resp_count {
        push(&mut buf, r)?;
    }
    push_slice(&mut buf, payload)?;
    Ok(buf)
}

/// `SET_PIN_SPI` (0x12): opcode, pin, `0x10 | (mode<<2) | spi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiPinFunction {
    /// MOSI (master out).
    Mosi,
    /// MISO (master in).
    Miso,
    /// SPI clock.
    Clk,
}

pub fn set_pin_spi(pin: u8, spi: u8, function: SpiPinFunction) -> Result<CommandBuf> {
    if spi > 0x03 {
        return Err(IoioError::IllegalArgument("spi id out of range"));
    }
    let mode = match function {
        SpiPinFunction::Mosi => 0u8,
        SpiPinFunction::Miso => 1u8,
        SpiPinFunction::Clk => 2u8,
    };
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_PIN_SPI)?;
    push(&mut buf, pin)?;
    push(&mut buf, 0x10 | (mode << 2) | spi)?;
    Ok(buf)
}

/// `I2C_CONFIGURE_MASTER` (0x13): `(smbus?0x80:0) | (rate_code<<5) | i2c`.
/// `rate_code = 0` closes.
pub fn i2c_configure_master(i2c: u8, smbus: bool, rate: TwiRate) -> Result<CommandBuf> {
    if i2c > 0x1F {
        return Err(IoioError::IllegalArgument("i2c id out of range"));
    }
    let arg = (u8::from(smbus) << 7) | (rate.code() << 5) | i2c;
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::I2C_CONFIGURE_MASTER)?;
    push(&mut buf, arg)?;
    Ok(buf)
}

/// `I2C_WRITE_READ` (0x14).
pub fn i2c_write_read(
    i2c: u8,
    address: u16,
    ten_bit: bool,
    write_data: &[u8],
    read_size: u8,
) -> Result<CommandBuf> {
    if i2c > 0x1F {
        return Err(IoioError::IllegalArgument("i2c id out of range"));
    }
    if write_data.len() > 0xFF {
        return Err(IoioError::IllegalArgument("i2c write payload too large"));
    }
    let addr_hi = u8::try_from(address >> 8)
        .map_err(|_| IoioError::IllegalArgument("i2c address out of range"))?;
    let write_size = u8::try_from(write_data.len())
        .map_err(|_| IoioError::IllegalArgument("i2c write payload too large"))?;

    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::I2C_WRITE_READ)?;
    push(&mut buf, (addr_hi << 6) | (u8::from(ten_bit) << 5) | i2c)?;
    push(&mut buf, (address & 0xFF) as u8)?;
    push(&mut buf, write_size)?;
    push(&mut buf, read_size)?;
    push_slice(&mut buf, write_data)?;
    Ok(buf)
}

/// `ICSP_CONFIG` (0x1A): `0x01` to open, `0x00` to close.
pub fn icsp_config(open: bool) -> Result<CommandBuf> {
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::ICSP_CONFIG)?;
    push(&mut buf, u8::from(open))?;
    Ok(buf)
}

/// `ICSP_PROG_ENTER` (0x18): opcode only.
pub fn icsp_prog_enter() -> Result<CommandBuf> {
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::ICSP_PROG_ENTER)?;
    Ok(buf)
}

/// `ICSP_PROG_EXIT` (0x19): opcode only.
pub fn icsp_prog_exit() -> Result<CommandBuf> {
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::ICSP_PROG_EXIT)?;
    Ok(buf)
}

/// `ICSP_SIX` (0x16): opcode + 24-bit instruction, little-endian.
pub fn icsp_six(instruction: u32) -> Result<CommandBuf> {
    if instruction > 0x00FF_FFFF {
        return Err(IoioError::IllegalArgument("icsp instruction must be 24-bit"));
    }
    let bytes = instruction.to_le_bytes();
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::ICSP_SIX)?;
    push_slice(&mut buf, &bytes[..3])?;
    Ok(buf)
}

/// `ICSP_REGOUT` (0x17): opcode only (requests the next VISI read).
pub fn icsp_regout() -> Result<CommandBuf> {
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::ICSP_REGOUT)?;
    Ok(buf)
}

/// `SET_PIN_INCAP` (0x1C): opcode, pin, `incap_num | (enable?0x80:0)`.
pub fn set_pin_incap(pin: u8, incap_num: u8, enable: bool) -> Result<CommandBuf> {
    if incap_num > 0x3F {
        return Err(IoioError::IllegalArgument("incap_num out of range"));
    }
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_PIN_INCAP)?;
    push(&mut buf, pin)?;
    push(&mut buf, incap_num | (u8::from(enable) << 7))?;
    Ok(buf)
}

/// `INCAP_CONFIGURE` (0x1B): `(double?0x80:0) | (mode<<3) | clock`.
/// `mode = 0, clock = 0` closes.
pub fn incap_configure(incap_num: u8, double: bool, mode: u8, clock: u8) -> Result<CommandBuf> {
    if incap_num > 0x3F || mode > 0x0F || clock > 0x07 {
        return Err(IoioError::IllegalArgument("incap configuration out of range"));
    }
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::INCAP_CONFIGURE)?;
    push(&mut buf, incap_num)?;
    push(&mut buf, (u8::from(double) << 7) | (mode << 3) | clock)?;
    Ok(buf)
}

/// `SET_PIN_CAPSENSE` (0x1E): opcode, pin (lower 6 bits).
pub fn set_pin_capsense(pin: u8) -> Result<CommandBuf> {
    if pin > 0x3F {
        return Err(IoioError::IllegalArgument("pin number out of range"));
    }
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_PIN_CAPSENSE)?;
    push(&mut buf, pin)?;
    Ok(buf)
}

/// `SET_CAPSENSE_SAMPLING` (0x1F): opcode, pin with bit 7 set to enable.
pub fn set_capsense_sampling(pin: u8, enable: bool) -> Result<CommandBuf> {
    if pin > 0x3F {
        return Err(IoioError::IllegalArgument("pin number out of range"));
    }
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SET_CAPSENSE_SAMPLING)?;
    push(&mut buf, pin | (u8::from(enable) << 7))?;
    Ok(buf)
}

/// `SEQUENCER_CONFIGURE` (0x20): opcode, size (0..68), size config bytes.
/// `size = 0` closes.
pub fn sequencer_configure(config_bytes: &[u8]) -> Result<CommandBuf> {
    if config_bytes.len() > crate::config::SEQUENCER_MAX_CUE_BYTES {
        return Err(IoioError::IllegalArgument(
            "sequencer config exceeds 68 bytes",
        ));
    }
    let size = u8::try_from(config_bytes.len())
        .map_err(|_| IoioError::IllegalArgument("sequencer config exceeds 68 bytes"))?;
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SEQUENCER_CONFIGURE)?;
    push(&mut buf, size)?;
    push_slice(&mut buf, config_bytes)?;
    Ok(buf)
}

/// `SEQUENCER_PUSH` (0x21): opcode, duration (u16 LE), size cue bytes (0..68).
pub fn sequencer_push(duration: u16, cue_bytes: &[u8]) -> Result<CommandBuf> {
    if cue_bytes.len() > crate::config::SEQUENCER_MAX_CUE_BYTES {
        return Err(IoioError::IllegalArgument(
            "sequencer cue exceeds 68 bytes",
        ));
    }
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SEQUENCER_PUSH)?;
    push_u16_le(&mut buf, duration)?;
    push_slice(&mut buf, cue_bytes)?;
    Ok(buf)
}

/// `SEQUENCER_CONTROL` (0x22) action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerAction<'a> {
    /// Stop the sequencer.
    Stop,
    /// Start the sequencer.
    Start,
    /// Pause the sequencer.
    Pause,
    /// Start with an explicit initial cue (`action = 3` plus cue bytes).
    ManualStart(&'a [u8]),
    /// Stop immediately without draining the cue queue.
    ManualStop,
}

/// `SEQUENCER_CONTROL` (0x22): opcode, action byte, optional cue bytes.
pub fn sequencer_control(action: SequencerAction<'_>) -> Result<CommandBuf> {
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SEQUENCER_CONTROL)?;
    match action {
        SequencerAction::Stop => push(&mut buf, 0)?,
        SequencerAction::Start => push(&mut buf, 1)?,
        SequencerAction::Pause => push(&mut buf, 2)?,
        SequencerAction::ManualStart(cue) => {
            if cue.len() > crate::config::SEQUENCER_MAX_CUE_BYTES {
                return Err(IoioError::IllegalArgument("sequencer cue exceeds 68 bytes"));
            }
            push(&mut buf, 3)?;
            push_slice(&mut buf, cue)?;
        }
        SequencerAction::ManualStop => push(&mut buf, 4)?,
    }
    Ok(buf)
}

/// `SYNC` (0x23): opcode only.
pub fn sync() -> Result<CommandBuf> {
    let mut buf = CommandBuf::new();
    push(&mut buf, opcode::SYNC)?;
    Ok(buf)
}

/// Packs `pin<<2` after range-checking, for the several opcodes that encode
/// a pin number in the top 6 bits of a single argument byte.
fn pack_pin_arg(pin: u8) -> Result<u8> {
    if pin > 0x3F {
        return Err(IoioError::IllegalArgument("pin number out of range"));
    }
    Ok(pin << 2)
}

const _: () = assert!(MAX_COMMAND_LEN >= 4 + crate::config::SEQUENCER_MAX_CUE_BYTES);

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn digital_out_blink_matches_spec_scenario_1() {
        // spec.md §8 scenario 1: open pin 13 output low, HIGH, LOW, close.
        let open_low = set_pin_digital_out(13, false, PinState::Low).unwrap();
        assert_eq!(&open_low[..], &[0x03, 0x34]);

        let high = set_digital_out_level(13, PinState::High).unwrap();
        assert_eq!(&high[..], &[0x04, 0x35]);

        let low = set_digital_out_level(13, PinState::Low).unwrap();
        assert_eq!(&low[..], &[0x04, 0x34]);

        let close = set_pin_digital_in(13, PinPull::Floating).unwrap();
        assert_eq!(&close[..], &[0x05, 0x34]);
    }

    #[test]
    fn analog_in_open_matches_spec_scenario_2() {
        let open = set_pin_analog_in(31).unwrap();
        assert_eq!(&open[..], &[0x0B, 0x1F]);
        let sample = set_analog_in_sampling(31, true).unwrap();
        assert_eq!(&sample[..], &[0x0C, 0x9F]);
    }

    #[test]
    fn pwm_matches_spec_scenario_3() {
        let low = set_pin_digital_out(10, false, PinState::Low).unwrap();
        assert_eq!(&low[..], &[0x03, 0x28]);
        let enable = set_pin_pwm(10, true, 0).unwrap();
        assert_eq!(&enable[..], &[0x08, 0x0A, 0x80]);
        let period = set_pwm_period(0, PwmScale::X1, 15_999).unwrap();
        assert_eq!(&period[..], &[0x0A, 0x00, 0x7F, 0x3E]);
    }

    #[test]
    fn spi_read_matches_spec_scenario_4() {
        let req = spi_master_request(0, 0, 4, Some(2), Some(3), &[0x23, 0x45]).unwrap();
        assert_eq!(&req[..], &[0x11, 0x00, 0xC3, 0x02, 0x03, 0x23, 0x45]);
    }

    #[test]
    fn uart_data_rejects_zero_and_oversize_payloads() {
        assert!(uart_data(0, &[]).is_err());
        let too_big = [0u8; 65];
        assert!(uart_data(0, &too_big).is_err());
        let max = [0u8; 64];
        assert!(uart_data(0, &max).is_ok());
    }

    #[test]
    fn sequencer_rejects_oversize_cue() {
        let too_big = [0u8; 69];
        assert!(sequencer_push(0, &too_big).is_err());
        let max = [0u8; 68];
        assert!(sequencer_push(0, &max).is_ok());
    }

    #[test]
    fn hard_reset_sends_ioio_magic() {
        let cmd = hard_reset().unwrap();
        assert_eq!(&cmd[..], b"\x00IOIO");
    }

    #[test]
    fn check_interface_sends_required_id() {
        let cmd = check_interface().unwrap();
        assert_eq!(&cmd[..], b"\x02IOIO0005");
    }

    #[test]
    fn pin_out_of_range_is_rejected() {
        assert!(set_pin_digital_out(64, false, PinState::Low).is_err());
    }
}
