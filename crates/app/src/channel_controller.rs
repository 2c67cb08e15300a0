//! Channel controller — logical digital and PWM channels over a GPIO backend.
//!
//! Every hardware transaction runs inside an acquire/release bracket on the
//! backend. The bracket is serialized by a mutex, so automation ticks and
//! request handlers on other threads never interleave their brackets. The
//! same mutex guards the PWM cache, which is the only record of the PWM
//! values: the peripheral cannot read them back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use lightsrv_domain::channel::{
    ChannelKind, DEFAULT_PWM_PERCENT, PWM_CLOCK_DIVIDER, PWM_RANGE, Polarity, check_percent,
    percent_to_duty,
};
use lightsrv_domain::config::ControllerConfig;
use lightsrv_domain::error::{IndexOutOfRange, LightsrvError};

use crate::ports::{GpioBackend, GpioSession};

/// Point-in-time view of every channel, read in a single bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub switches: Vec<bool>,
    pub pwms: Vec<u8>,
}

/// Logical channel controller, generic over the peripheral backend.
pub struct ChannelController<B> {
    backend: B,
    switch_pins: Vec<u8>,
    pwm_pins: Vec<u8>,
    inverted: AtomicBool,
    pwm_cache: Mutex<Vec<u8>>,
}

impl<B: GpioBackend> ChannelController<B> {
    /// Create a controller for the pins in `config`.
    ///
    /// Does not touch the hardware; call [`setup`](Self::setup) once before
    /// serving requests.
    pub fn new(backend: B, config: &ControllerConfig) -> Self {
        Self {
            backend,
            switch_pins: config.switch_pins().to_vec(),
            pwm_pins: config.pwm_pins().to_vec(),
            inverted: AtomicBool::new(config.polarity().is_inverted()),
            pwm_cache: Mutex::new(vec![DEFAULT_PWM_PERCENT; config.pwm_pins().len()]),
        }
    }

    /// Access the backend (mostly useful for inspecting the virtual one).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of digital channels.
    #[must_use]
    pub fn size(&self) -> usize {
        self.switch_pins.len()
    }

    /// Number of PWM channels.
    #[must_use]
    pub fn pwm_size(&self) -> usize {
        self.pwm_pins.len()
    }

    pub fn set_inverted(&self, inverted: bool) {
        self.inverted.store(inverted, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted.load(Ordering::Relaxed)
    }

    fn polarity(&self) -> Polarity {
        Polarity::from_inverted(self.is_inverted())
    }

    /// Configure every pin and reset every PWM channel to the default duty.
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::Hardware`] if the backend cannot be opened or
    /// rejects a pin.
    #[tracing::instrument(skip(self), fields(switches = self.size(), pwms = self.pwm_size()))]
    pub fn setup(&self) -> Result<(), LightsrvError> {
        self.transaction(|session| {
            for &pin in session.switch_pins {
                session.hw.configure_output(pin)?;
            }
            let duty = percent_to_duty(DEFAULT_PWM_PERCENT);
            for (index, &pin) in session.pwm_pins.iter().enumerate() {
                session.hw.configure_pwm(pin, PWM_CLOCK_DIVIDER, PWM_RANGE)?;
                session.hw.write_pwm(pin, duty)?;
                session.pwm_cache[index] = DEFAULT_PWM_PERCENT;
            }
            tracing::info!("channels configured");
            Ok(())
        })
    }

    /// Open one bracket for several operations.
    ///
    /// The backend is released when the returned session is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::Hardware`] if the backend cannot be opened.
    pub fn session(&self) -> Result<ControllerSession<'_, B>, LightsrvError> {
        let pwm_cache = self.pwm_cache.lock().unwrap_or_else(PoisonError::into_inner);
        let hw = self.backend.acquire()?;
        Ok(ControllerSession {
            hw,
            pwm_cache,
            switch_pins: &self.switch_pins,
            pwm_pins: &self.pwm_pins,
            polarity: self.polarity(),
        })
    }

    /// Run `f` inside a single acquire/release bracket.
    ///
    /// # Errors
    ///
    /// Returns the backend's acquire error, or whatever `f` returns.
    pub fn transaction<'a, T>(
        &'a self,
        f: impl FnOnce(&mut ControllerSession<'a, B>) -> Result<T, LightsrvError>,
    ) -> Result<T, LightsrvError> {
        let mut session = self.session()?;
        f(&mut session)
    }

    /// Switch digital channel `index` on or off.
    ///
    /// Returns the logical value written.
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::IndexOutOfRange`] before touching the backend
    /// when `index >= size()`, or a hardware error.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn switch_channel(&self, index: usize, on: bool) -> Result<bool, LightsrvError> {
        check_index(ChannelKind::Switch, index, self.size())?;
        self.transaction(|session| session.switch_channel(index, on))
    }

    /// Read the logical state of digital channel `index`.
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::IndexOutOfRange`] before touching the backend
    /// when `index >= size()`, or a hardware error.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn get_channel(&self, index: usize) -> Result<bool, LightsrvError> {
        check_index(ChannelKind::Switch, index, self.size())?;
        self.transaction(|session| session.get_channel(index))
    }

    /// Set PWM channel `index` to `percent` and return the cached percent.
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::IndexOutOfRange`] when `index >= pwm_size()`,
    /// [`LightsrvError::Validation`] when `percent > 100`, or a hardware
    /// error. Neither validation failure touches the backend.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn set_pwm(&self, index: usize, percent: u32) -> Result<u8, LightsrvError> {
        check_index(ChannelKind::Pwm, index, self.pwm_size())?;
        check_percent(percent)?;
        self.transaction(|session| session.set_pwm(index, percent))
    }

    /// Write digital channel `index` and read it back in one bracket.
    ///
    /// # Errors
    ///
    /// Same as [`switch_channel`](Self::switch_channel).
    pub fn switch_and_read(&self, index: usize, on: bool) -> Result<bool, LightsrvError> {
        check_index(ChannelKind::Switch, index, self.size())?;
        self.transaction(|session| {
            session.switch_channel(index, on)?;
            session.get_channel(index)
        })
    }

    /// Set PWM channel `index` and read the cached value back in one bracket.
    ///
    /// # Errors
    ///
    /// Same as [`set_pwm`](Self::set_pwm).
    pub fn set_pwm_and_read(&self, index: usize, percent: u32) -> Result<u8, LightsrvError> {
        check_index(ChannelKind::Pwm, index, self.pwm_size())?;
        check_percent(percent)?;
        self.transaction(|session| {
            session.set_pwm(index, percent)?;
            session.get_pwm(index)
        })
    }

    /// Cached percent of PWM channel `index`. Never touches the backend.
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::IndexOutOfRange`] when `index >= pwm_size()`.
    pub fn get_pwm(&self, index: usize) -> Result<u8, LightsrvError> {
        check_index(ChannelKind::Pwm, index, self.pwm_size())?;
        let cache = self.pwm_cache.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(cache[index])
    }

    /// Read every digital channel and every cached PWM value in one bracket.
    ///
    /// # Errors
    ///
    /// Returns a hardware error if the backend cannot be opened or read.
    pub fn snapshot(&self) -> Result<ControllerSnapshot, LightsrvError> {
        self.transaction(|session| {
            let switches = (0..session.size())
                .map(|index| session.get_channel(index))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ControllerSnapshot {
                switches,
                pwms: session.pwm_cache.clone(),
            })
        })
    }
}

/// An open bracket on the backend plus exclusive access to the PWM cache.
pub struct ControllerSession<'a, B: GpioBackend + 'a> {
    // released before the cache lock: fields drop in declaration order
    hw: B::Session<'a>,
    pwm_cache: MutexGuard<'a, Vec<u8>>,
    switch_pins: &'a [u8],
    pwm_pins: &'a [u8],
    polarity: Polarity,
}

impl<B: GpioBackend> ControllerSession<'_, B> {
    #[must_use]
    pub fn size(&self) -> usize {
        self.switch_pins.len()
    }

    #[must_use]
    pub fn pwm_size(&self) -> usize {
        self.pwm_pins.len()
    }

    /// See [`ChannelController::switch_channel`].
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::IndexOutOfRange`] or a hardware error.
    pub fn switch_channel(&mut self, index: usize, on: bool) -> Result<bool, LightsrvError> {
        check_index(ChannelKind::Switch, index, self.size())?;
        let pin = self.switch_pins[index];
        tracing::debug!(index, pin, on, polarity = ?self.polarity, "write channel");
        self.hw.write_pin(pin, on, self.polarity)?;
        Ok(on)
    }

    /// See [`ChannelController::get_channel`].
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::IndexOutOfRange`] or a hardware error.
    pub fn get_channel(&mut self, index: usize) -> Result<bool, LightsrvError> {
        check_index(ChannelKind::Switch, index, self.size())?;
        self.hw.read_pin(self.switch_pins[index], self.polarity)
    }

    /// See [`ChannelController::set_pwm`].
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::IndexOutOfRange`], [`LightsrvError::Validation`],
    /// or a hardware error. The cache keeps its old value on failure.
    pub fn set_pwm(&mut self, index: usize, percent: u32) -> Result<u8, LightsrvError> {
        check_index(ChannelKind::Pwm, index, self.pwm_size())?;
        let percent = check_percent(percent)?;
        let pin = self.pwm_pins[index];
        let duty = percent_to_duty(percent);
        tracing::debug!(index, pin, percent, duty, "write pwm");
        self.hw.write_pwm(pin, duty)?;
        self.pwm_cache[index] = percent;
        Ok(percent)
    }

    /// See [`ChannelController::get_pwm`].
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::IndexOutOfRange`].
    pub fn get_pwm(&self, index: usize) -> Result<u8, LightsrvError> {
        check_index(ChannelKind::Pwm, index, self.pwm_size())?;
        Ok(self.pwm_cache[index])
    }
}

fn check_index(kind: ChannelKind, index: usize, count: usize) -> Result<(), IndexOutOfRange> {
    if index >= count {
        return Err(IndexOutOfRange { kind, index, count });
    }
    Ok(())
}
