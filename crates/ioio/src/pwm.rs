use std::sync::Arc;

use ioio_core::error::Result;

use crate::board::Session;

/// A pin opened for PWM output on one OUTCOMPARE channel.
pub struct PwmOutput {
    session: Arc<Session>,
    pin: u8,
    pwm_num: u8,
}

impl PwmOutput {
    pub(crate) fn new(session: Arc<Session>, pin: u8, pwm_num: u8) -> Self {
        PwmOutput { session, pin, pwm_num }
    }

    /// Sets the duty cycle as `duty` out of `2^(16+fraction)` (§4.1's extra
    /// fractional-bit scheme for sub-count resolution).
    pub fn set_duty_cycle(&self, fraction: u8, duty: u16) -> Result<()> {
        self.session.set_pwm_duty_cycle(self.pwm_num, fraction, duty)
    }

    /// The OUTCOMPARE channel number backing this handle.
    #[must_use]
    pub fn channel(&self) -> u8 {
        self.pwm_num
    }
}

impl Drop for PwmOutput {
    fn drop(&mut self) {
        self.session.close_pwm(self.pin, self.pwm_num);
    }
}
