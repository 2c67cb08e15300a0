//! GPIO port — the capability interface every peripheral backend implements.
//!
//! A backend hands out short-lived [`GpioSession`]s. Acquiring a session
//! opens the peripheral; dropping it closes it again, so the release happens
//! on every exit path, including early returns through `?`.

use std::sync::Arc;

use lightsrv_domain::channel::Polarity;
use lightsrv_domain::error::LightsrvError;

/// Operations available while the peripheral is held open.
pub trait GpioSession {
    /// Configure `pin` as a digital output.
    fn configure_output(&mut self, pin: u8) -> Result<(), LightsrvError>;

    /// Drive `pin` for the logical level `on` under `polarity`.
    ///
    /// Hardware backends write `polarity.apply(on)`. Simulated backends may
    /// record the logical level instead.
    fn write_pin(&mut self, pin: u8, on: bool, polarity: Polarity) -> Result<(), LightsrvError>;

    /// Read back the logical level of `pin` under `polarity`.
    fn read_pin(&mut self, pin: u8, polarity: Polarity) -> Result<bool, LightsrvError>;

    /// Configure `pin` for PWM output with the given clock divider and
    /// counter range.
    fn configure_pwm(&mut self, pin: u8, clock_divider: u32, range: u32)
    -> Result<(), LightsrvError>;

    /// Set the raw duty (`0..=range`) of a PWM pin.
    fn write_pwm(&mut self, pin: u8, duty: u32) -> Result<(), LightsrvError>;
}

/// A peripheral backend (real hardware or in-memory).
pub trait GpioBackend: Send + Sync {
    /// Session type; dropping it releases the peripheral.
    type Session<'a>: GpioSession
    where
        Self: 'a;

    /// Open the peripheral for one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::Hardware`] when the peripheral cannot be
    /// initialised.
    fn acquire(&self) -> Result<Self::Session<'_>, LightsrvError>;
}

impl<T: GpioBackend> GpioBackend for Arc<T> {
    type Session<'a>
        = T::Session<'a>
    where
        Self: 'a;

    fn acquire(&self) -> Result<Self::Session<'_>, LightsrvError> {
        (**self).acquire()
    }
}
