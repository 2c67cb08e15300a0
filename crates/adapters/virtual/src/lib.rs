//! # lightsrv-adapter-virtual
//!
//! In-memory GPIO backend for machines without the BCM2835 peripheral.
//!
//! ## Behaviour
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `acquire` / drop | counts opens and closes of the simulated peripheral |
//! | `write_pin` | stores the caller's **logical** level |
//! | `read_pin` | returns the stored level through the requested polarity |
//! | `configure_pwm` / `write_pwm` | stores divider, range and raw duty |
//!
//! Because reads go through the polarity transform while writes store the
//! logical level, switching a channel on and reading it back yields `false`
//! on an inverted controller. Every operation is traced at `debug` level.
//!
//! ## Dependency rule
//!
//! Depends on `lightsrv-app` (port traits) and `lightsrv-domain` only.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use lightsrv_app::ports::{GpioBackend, GpioSession};
use lightsrv_domain::channel::Polarity;
use lightsrv_domain::error::LightsrvError;

/// PWM settings last written to a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmState {
    pub clock_divider: u32,
    pub range: u32,
    pub duty: u32,
}

#[derive(Debug, Default)]
struct State {
    outputs: HashSet<u8>,
    levels: HashMap<u8, bool>,
    pwm: HashMap<u8, PwmState>,
    acquired: u64,
    released: u64,
}

/// Simulated peripheral.
#[derive(Debug, Default)]
pub struct VirtualGpio {
    state: Mutex<State>,
}

impl VirtualGpio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical level last written to `pin`, if any.
    #[must_use]
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.lock().levels.get(&pin).copied()
    }

    #[must_use]
    pub fn is_output(&self, pin: u8) -> bool {
        self.lock().outputs.contains(&pin)
    }

    #[must_use]
    pub fn pwm(&self, pin: u8) -> Option<PwmState> {
        self.lock().pwm.get(&pin).copied()
    }

    /// How many times the peripheral was opened.
    #[must_use]
    pub fn acquire_count(&self) -> u64 {
        self.lock().acquired
    }

    /// How many times the peripheral was closed.
    #[must_use]
    pub fn release_count(&self) -> u64 {
        self.lock().released
    }

    /// Whether a session is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        let state = self.lock();
        state.acquired > state.released
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GpioBackend for VirtualGpio {
    type Session<'a> = VirtualSession<'a>;

    fn acquire(&self) -> Result<Self::Session<'_>, LightsrvError> {
        let mut state = self.lock();
        if state.acquired > state.released {
            tracing::warn!("virtual gpio acquired while already open");
        }
        state.acquired += 1;
        tracing::debug!(count = state.acquired, "virtual gpio acquired");
        Ok(VirtualSession { gpio: self })
    }
}

/// Open bracket on a [`VirtualGpio`].
pub struct VirtualSession<'a> {
    gpio: &'a VirtualGpio,
}

impl Drop for VirtualSession<'_> {
    fn drop(&mut self) {
        let mut state = self.gpio.lock();
        state.released += 1;
        tracing::debug!(count = state.released, "virtual gpio released");
    }
}

impl GpioSession for VirtualSession<'_> {
    fn configure_output(&mut self, pin: u8) -> Result<(), LightsrvError> {
        tracing::debug!(pin, "configure output");
        self.gpio.lock().outputs.insert(pin);
        Ok(())
    }

    fn write_pin(&mut self, pin: u8, on: bool, polarity: Polarity) -> Result<(), LightsrvError> {
        tracing::debug!(pin, on, physical = polarity.apply(on), "write pin");
        self.gpio.lock().levels.insert(pin, on);
        Ok(())
    }

    fn read_pin(&mut self, pin: u8, polarity: Polarity) -> Result<bool, LightsrvError> {
        let stored = self.gpio.lock().levels.get(&pin).copied().unwrap_or(false);
        let level = polarity.apply(stored);
        tracing::debug!(pin, level, "read pin");
        Ok(level)
    }

    fn configure_pwm(
        &mut self,
        pin: u8,
        clock_divider: u32,
        range: u32,
    ) -> Result<(), LightsrvError> {
        tracing::debug!(pin, clock_divider, range, "configure pwm");
        self.gpio.lock().pwm.insert(
            pin,
            PwmState {
                clock_divider,
                range,
                duty: 0,
            },
        );
        Ok(())
    }

    fn write_pwm(&mut self, pin: u8, duty: u32) -> Result<(), LightsrvError> {
        tracing::debug!(pin, duty, "write pwm");
        let mut state = self.gpio.lock();
        let entry = state.pwm.entry(pin).or_insert(PwmState {
            clock_divider: 0,
            range: 0,
            duty: 0,
        });
        entry.duty = duty;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lightsrv_app::channel_controller::ChannelController;
    use lightsrv_domain::channel::{PWM_CLOCK_DIVIDER, PWM_RANGE};
    use lightsrv_domain::config::ControllerConfig;

    use super::*;

    fn controller(inverted: bool) -> ChannelController<Arc<VirtualGpio>> {
        let config = ControllerConfig::builder()
            .switch_pins([17, 27, 22, 23])
            .pwm_pins([18])
            .inverted(inverted)
            .build()
            .unwrap();
        let controller = ChannelController::new(Arc::new(VirtualGpio::new()), &config);
        controller.setup().unwrap();
        controller
    }

    #[test]
    fn should_balance_acquire_and_release() {
        let gpio = VirtualGpio::new();
        {
            let _session = gpio.acquire().unwrap();
            assert!(gpio.is_open());
        }
        assert!(!gpio.is_open());
        assert_eq!(gpio.acquire_count(), 1);
        assert_eq!(gpio.release_count(), 1);
    }

    #[test]
    fn should_store_logical_level_and_read_through_polarity() {
        let gpio = VirtualGpio::new();
        let mut session = gpio.acquire().unwrap();
        session.write_pin(17, true, Polarity::Inverted).unwrap();
        assert!(!session.read_pin(17, Polarity::Inverted).unwrap());
        assert!(session.read_pin(17, Polarity::Normal).unwrap());
        drop(session);
        assert_eq!(gpio.level(17), Some(true));
    }

    #[test]
    fn should_read_unwritten_pin_as_low() {
        let gpio = VirtualGpio::new();
        let mut session = gpio.acquire().unwrap();
        assert!(!session.read_pin(5, Polarity::Normal).unwrap());
    }

    #[test]
    fn should_configure_pins_on_controller_setup() {
        let controller = controller(false);
        let gpio = controller.backend();
        for pin in [17, 27, 22, 23] {
            assert!(gpio.is_output(pin));
        }
        assert_eq!(
            gpio.pwm(18),
            Some(PwmState {
                clock_divider: PWM_CLOCK_DIVIDER,
                range: PWM_RANGE,
                duty: 0,
            })
        );
        assert_eq!(gpio.acquire_count(), gpio.release_count());
    }

    #[test]
    fn should_round_trip_switch_through_controller() {
        let controller = controller(false);
        controller.switch_channel(1, true).unwrap();
        assert!(controller.get_channel(1).unwrap());
        assert_eq!(controller.backend().level(27), Some(true));
    }

    #[test]
    fn should_invert_read_back_through_controller() {
        let controller = controller(true);
        controller.switch_channel(0, true).unwrap();
        assert!(!controller.get_channel(0).unwrap());
    }

    #[test]
    fn should_record_scaled_pwm_duty() {
        let controller = controller(false);
        controller.set_pwm(0, 75).unwrap();
        assert_eq!(controller.backend().pwm(18).map(|p| p.duty), Some(768));
        assert_eq!(controller.get_pwm(0).unwrap(), 75);
    }
}
