//! Automation engine — drives the channels from the daily [`Schedule`].
//!
//! Each tick evaluates the schedule at the given time of day and applies the
//! result to the controller inside a single hardware bracket. Application is
//! best effort: a failing write is logged and reported, and the remaining
//! writes still run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lightsrv_domain::config::ChannelMap;
use lightsrv_domain::error::LightsrvError;
use lightsrv_domain::schedule::{DesiredState, Schedule};
use lightsrv_domain::time::TimeOfDay;

use crate::channel_controller::ChannelController;
use crate::ports::GpioBackend;

/// Which write of a tick failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStep {
    Dimmer,
    LightA,
    LightB,
    Aux,
    Co2,
}

#[derive(Debug)]
pub struct StepFailure {
    pub step: TickStep,
    pub error: LightsrvError,
}

/// What a tick applied, and which writes failed.
#[derive(Debug)]
pub struct TickReport {
    pub at: TimeOfDay,
    pub desired: DesiredState,
    pub failures: Vec<StepFailure>,
}

impl TickReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub enum TickOutcome {
    /// Automation unsupported or switched off; nothing was touched.
    Skipped,
    Applied(TickReport),
}

/// Time-of-day automation over a shared [`ChannelController`].
pub struct AutomationEngine<B> {
    controller: Arc<ChannelController<B>>,
    schedule: Schedule,
    channels: ChannelMap,
    supported: bool,
    enabled: AtomicBool,
}

impl<B: GpioBackend> AutomationEngine<B> {
    /// Create an engine. Automation starts enabled iff `supported`.
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::Validation`] when `supported` and the channel
    /// map references a channel the controller does not have.
    pub fn new(
        controller: Arc<ChannelController<B>>,
        supported: bool,
        schedule: Schedule,
        channels: ChannelMap,
    ) -> Result<Self, LightsrvError> {
        if supported {
            channels.validate(controller.size(), controller.pwm_size())?;
        }
        Ok(Self {
            controller,
            schedule,
            channels,
            supported,
            enabled: AtomicBool::new(supported),
        })
    }

    pub fn controller(&self) -> &Arc<ChannelController<B>> {
        &self.controller
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Whether this deployment has automation wiring at all.
    #[must_use]
    pub fn has_automation(&self) -> bool {
        self.supported
    }

    /// Whether ticks currently drive the channels.
    #[must_use]
    pub fn get_auto(&self) -> bool {
        self.supported && self.enabled.load(Ordering::Relaxed)
    }

    /// Switch automation on or off and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::AutomationUnsupported`] when the deployment
    /// has no automation wiring.
    pub fn set_auto(&self, enabled: bool) -> Result<bool, LightsrvError> {
        if !self.supported {
            return Err(LightsrvError::AutomationUnsupported);
        }
        self.enabled.store(enabled, Ordering::Relaxed);
        tracing::info!(enabled, "automation toggled");
        Ok(enabled)
    }

    /// Apply the schedule for `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::Hardware`] only when the backend cannot be
    /// opened. Individual write failures are collected in the report.
    #[tracing::instrument(level = "debug", skip_all, fields(now = %now))]
    pub fn tick(&self, now: TimeOfDay) -> Result<TickOutcome, LightsrvError> {
        if !self.get_auto() {
            return Ok(TickOutcome::Skipped);
        }

        let desired = self.schedule.evaluate(now);
        let channels = self.channels;
        let failures = self.controller.transaction(|session| {
            let steps: [(TickStep, Result<(), LightsrvError>); 5] = [
                (
                    TickStep::Dimmer,
                    session
                        .set_pwm(channels.dimmer, u32::from(desired.dimmer_percent))
                        .map(drop),
                ),
                (
                    TickStep::LightA,
                    session.switch_channel(channels.light_a, desired.lights_on).map(drop),
                ),
                (
                    TickStep::LightB,
                    session.switch_channel(channels.light_b, desired.lights_on).map(drop),
                ),
                (
                    TickStep::Aux,
                    session.switch_channel(channels.aux, desired.aux_on).map(drop),
                ),
                (
                    TickStep::Co2,
                    session.switch_channel(channels.co2, desired.co2_on).map(drop),
                ),
            ];
            Ok(steps
                .into_iter()
                .filter_map(|(step, result)| {
                    result.err().map(|error| StepFailure { step, error })
                })
                .collect::<Vec<_>>())
        })?;

        for failure in &failures {
            tracing::warn!(step = ?failure.step, error = %failure.error, "automation write failed");
        }
        tracing::debug!(?desired, "automation applied");

        Ok(TickOutcome::Applied(TickReport {
            at: now,
            desired,
            failures,
        }))
    }
}
