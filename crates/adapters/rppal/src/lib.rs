//! # lightsrv-adapter-rppal
//!
//! GPIO backend for the Raspberry Pi BCM2835 family, built on [`rppal`].
//!
//! Acquiring a session opens `/dev/gpiomem`; dropping it closes it again.
//! Pins are used by BCM number. Digital outputs keep their level after the
//! session ends, since the level *is* the state of the relay board.
//!
//! ## Hardware PWM
//!
//! | GPIO | Channel | Function |
//! |------|---------|----------|
//! | 12 | PWM0 | ALT0 |
//! | 18 | PWM0 | ALT5 |
//! | 13 | PWM1 | ALT0 |
//! | 19 | PWM1 | ALT5 |
//!
//! PWM output needs the `pwm-2chan` device-tree overlay.
//!
//! ## Dependency rule
//!
//! Depends on `lightsrv-app` (port traits) and `lightsrv-domain` only.

mod error;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use lightsrv_app::ports::{GpioBackend, GpioSession};
use lightsrv_domain::channel::{PWM_RANGE, Polarity};
use lightsrv_domain::error::LightsrvError;
use rppal::gpio::{Gpio, Level, Mode};
use rppal::pwm::{self, Channel, Pwm};

pub use error::GpioError;

/// Oscillator feeding the PWM clock divider.
pub const PWM_BASE_CLOCK_HZ: f64 = 19_200_000.0;

/// Logical state of a pin sampled at `level`.
fn logical_level(level: Level, polarity: Polarity) -> bool {
    polarity.apply(level == Level::High)
}

/// Hardware PWM channel and pin function for a BCM pin.
///
/// # Errors
///
/// Returns [`GpioError::NoPwmChannel`] for pins without hardware PWM.
pub fn pwm_channel(pin: u8) -> Result<(Channel, Mode), GpioError> {
    match pin {
        12 => Ok((Channel::Pwm0, Mode::Alt0)),
        18 => Ok((Channel::Pwm0, Mode::Alt5)),
        13 => Ok((Channel::Pwm1, Mode::Alt0)),
        19 => Ok((Channel::Pwm1, Mode::Alt5)),
        other => Err(GpioError::NoPwmChannel(other)),
    }
}

/// Output frequency for a clock divider and counter range.
#[must_use]
pub fn pwm_frequency(clock_divider: u32, range: u32) -> f64 {
    PWM_BASE_CLOCK_HZ / f64::from(clock_divider.max(1)) / f64::from(range.max(1))
}

/// Real GPIO backend.
#[derive(Debug, Default)]
pub struct RppalGpio {
    // counter range per PWM pin, remembered across sessions
    ranges: Mutex<HashMap<u8, u32>>,
}

impl RppalGpio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn range(&self, pin: u8) -> u32 {
        self.ranges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pin)
            .copied()
            .unwrap_or(PWM_RANGE)
    }

    fn set_range(&self, pin: u8, range: u32) {
        self.ranges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pin, range);
    }
}

impl GpioBackend for RppalGpio {
    type Session<'a> = RppalSession<'a>;

    fn acquire(&self) -> Result<Self::Session<'_>, LightsrvError> {
        let gpio = Gpio::new().map_err(GpioError::from)?;
        tracing::trace!("gpio opened");
        Ok(RppalSession { backend: self, gpio })
    }
}

/// Open handle on the GPIO peripheral.
pub struct RppalSession<'a> {
    backend: &'a RppalGpio,
    gpio: Gpio,
}

impl Drop for RppalSession<'_> {
    fn drop(&mut self) {
        tracing::trace!("gpio closed");
    }
}

impl RppalSession<'_> {
    fn pwm(pin: u8) -> Result<Pwm, GpioError> {
        let (channel, _) = pwm_channel(pin)?;
        let mut pwm = Pwm::new(channel)?;
        pwm.set_reset_on_drop(false);
        Ok(pwm)
    }
}

impl GpioSession for RppalSession<'_> {
    fn configure_output(&mut self, pin: u8) -> Result<(), LightsrvError> {
        let mut output = self.gpio.get(pin).map_err(GpioError::from)?.into_output();
        output.set_reset_on_drop(false);
        Ok(())
    }

    fn write_pin(&mut self, pin: u8, on: bool, polarity: Polarity) -> Result<(), LightsrvError> {
        let mut output = self.gpio.get(pin).map_err(GpioError::from)?.into_output();
        output.set_reset_on_drop(false);
        if polarity.apply(on) {
            output.set_high();
        } else {
            output.set_low();
        }
        Ok(())
    }

    fn read_pin(&mut self, pin: u8, polarity: Polarity) -> Result<bool, LightsrvError> {
        let input = self.gpio.get(pin).map_err(GpioError::from)?;
        Ok(logical_level(input.read(), polarity))
    }

    fn configure_pwm(
        &mut self,
        pin: u8,
        clock_divider: u32,
        range: u32,
    ) -> Result<(), LightsrvError> {
        let (channel, mode) = pwm_channel(pin)?;
        let mut io = self.gpio.get(pin).map_err(GpioError::from)?.into_io(mode);
        io.set_reset_on_drop(false);

        let frequency = pwm_frequency(clock_divider, range);
        let mut pwm = Pwm::with_frequency(channel, frequency, 0.0, pwm::Polarity::Normal, true)
            .map_err(GpioError::from)?;
        pwm.set_reset_on_drop(false);
        self.backend.set_range(pin, range);
        tracing::debug!(pin, ?channel, frequency, "pwm configured");
        Ok(())
    }

    fn write_pwm(&mut self, pin: u8, duty: u32) -> Result<(), LightsrvError> {
        let range = self.backend.range(pin).max(1);
        let fraction = f64::from(duty.min(range)) / f64::from(range);
        Self::pwm(pin)?
            .set_duty_cycle(fraction)
            .map_err(GpioError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_pwm_pins_to_channels() {
        assert!(matches!(pwm_channel(12), Ok((Channel::Pwm0, Mode::Alt0))));
        assert!(matches!(pwm_channel(18), Ok((Channel::Pwm0, Mode::Alt5))));
        assert!(matches!(pwm_channel(13), Ok((Channel::Pwm1, Mode::Alt0))));
        assert!(matches!(pwm_channel(19), Ok((Channel::Pwm1, Mode::Alt5))));
    }

    #[test]
    fn should_read_level_through_polarity() {
        assert!(logical_level(Level::High, Polarity::Normal));
        assert!(!logical_level(Level::Low, Polarity::Normal));
        assert!(!logical_level(Level::High, Polarity::Inverted));
        assert!(logical_level(Level::Low, Polarity::Inverted));
    }

    #[test]
    fn should_reject_pin_without_pwm() {
        assert!(matches!(pwm_channel(17), Err(GpioError::NoPwmChannel(17))));
    }

    #[test]
    fn should_compute_default_pwm_frequency() {
        let frequency = pwm_frequency(16, 1024);
        assert!((frequency - 1171.875).abs() < 1e-9);
    }

    #[test]
    fn should_not_divide_by_zero() {
        assert!(pwm_frequency(0, 0).is_finite());
    }

    #[test]
    fn should_default_range_until_configured() {
        let gpio = RppalGpio::new();
        assert_eq!(gpio.range(18), PWM_RANGE);
        gpio.set_range(18, 2048);
        assert_eq!(gpio.range(18), 2048);
    }
}
