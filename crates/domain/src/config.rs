//! Controller configuration — the validated value object built once at startup.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelKind, Polarity};
use crate::error::{LightsrvError, ValidationError};

/// Pin layout and behaviour flags of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    switch_pins: Vec<u8>,
    pwm_pins: Vec<u8>,
    polarity: Polarity,
    automation: bool,
}

impl ControllerConfig {
    /// Create a builder for constructing a [`ControllerConfig`].
    #[must_use]
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::Validation`] when a pin appears twice, within
    /// or across the switch and PWM lists.
    pub fn validate(&self) -> Result<(), LightsrvError> {
        let mut seen = HashSet::new();
        for pin in self.switch_pins.iter().chain(&self.pwm_pins) {
            if !seen.insert(*pin) {
                return Err(ValidationError::DuplicatePin(*pin).into());
            }
        }
        Ok(())
    }

    /// Physical pin ids of the digital channels, in channel order.
    #[must_use]
    pub fn switch_pins(&self) -> &[u8] {
        &self.switch_pins
    }

    /// Physical pin ids of the PWM channels, in channel order.
    #[must_use]
    pub fn pwm_pins(&self) -> &[u8] {
        &self.pwm_pins
    }

    #[must_use]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Whether this deployment has automation wiring at all.
    #[must_use]
    pub fn has_automation(&self) -> bool {
        self.automation
    }
}

/// Step-by-step builder for [`ControllerConfig`].
#[derive(Debug, Default)]
pub struct ControllerConfigBuilder {
    switch_pins: Vec<u8>,
    pwm_pins: Vec<u8>,
    polarity: Polarity,
    automation: bool,
}

impl ControllerConfigBuilder {
    #[must_use]
    pub fn switch_pins(mut self, pins: impl IntoIterator<Item = u8>) -> Self {
        self.switch_pins = pins.into_iter().collect();
        self
    }

    #[must_use]
    pub fn pwm_pins(mut self, pins: impl IntoIterator<Item = u8>) -> Self {
        self.pwm_pins = pins.into_iter().collect();
        self
    }

    #[must_use]
    pub fn inverted(mut self, inverted: bool) -> Self {
        self.polarity = Polarity::from_inverted(inverted);
        self
    }

    #[must_use]
    pub fn automation(mut self, automation: bool) -> Self {
        self.automation = automation;
        self
    }

    /// Consume the builder, validate, and return a [`ControllerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`LightsrvError::Validation`] on duplicate pins.
    pub fn build(self) -> Result<ControllerConfig, LightsrvError> {
        let config = ControllerConfig {
            switch_pins: self.switch_pins,
            pwm_pins: self.pwm_pins,
            polarity: self.polarity,
            automation: self.automation,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Which channels the automation engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMap {
    /// First light bank (switch index).
    pub light_a: usize,
    /// Second light bank (switch index).
    pub light_b: usize,
    /// Filtration / heating, held on while automation runs (switch index).
    pub aux: usize,
    /// CO2 valve (switch index).
    pub co2: usize,
    /// Dimmer (PWM index).
    pub dimmer: usize,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            light_a: 0,
            light_b: 1,
            aux: 2,
            co2: 3,
            dimmer: 0,
        }
    }
}

impl ChannelMap {
    /// Check every referenced index against the configured channel counts.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ChannelReference`] for the first role that
    /// points past the configured channels.
    pub fn validate(&self, switches: usize, pwms: usize) -> Result<(), ValidationError> {
        let roles = [
            ("light_a", ChannelKind::Switch, self.light_a, switches),
            ("light_b", ChannelKind::Switch, self.light_b, switches),
            ("aux", ChannelKind::Switch, self.aux, switches),
            ("co2", ChannelKind::Switch, self.co2, switches),
            ("dimmer", ChannelKind::Pwm, self.dimmer, pwms),
        ];
        for (role, kind, index, count) in roles {
            if index >= count {
                return Err(ValidationError::ChannelReference {
                    role,
                    kind,
                    index,
                    count,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_valid_config_when_pins_are_distinct() {
        let config = ControllerConfig::builder()
            .switch_pins([17, 27, 22, 23])
            .pwm_pins([18])
            .inverted(true)
            .automation(true)
            .build()
            .unwrap();
        assert_eq!(config.switch_pins(), &[17, 27, 22, 23]);
        assert_eq!(config.pwm_pins(), &[18]);
        assert_eq!(config.polarity(), Polarity::Inverted);
        assert!(config.has_automation());
    }

    #[test]
    fn should_default_to_empty_normal_manual_config() {
        let config = ControllerConfig::builder().build().unwrap();
        assert!(config.switch_pins().is_empty());
        assert!(config.pwm_pins().is_empty());
        assert_eq!(config.polarity(), Polarity::Normal);
        assert!(!config.has_automation());
    }

    #[test]
    fn should_reject_duplicate_switch_pin() {
        let result = ControllerConfig::builder().switch_pins([17, 17]).build();
        assert!(matches!(
            result,
            Err(LightsrvError::Validation(ValidationError::DuplicatePin(17)))
        ));
    }

    #[test]
    fn should_reject_pin_used_as_switch_and_pwm() {
        let result = ControllerConfig::builder()
            .switch_pins([17, 18])
            .pwm_pins([18])
            .build();
        assert!(matches!(
            result,
            Err(LightsrvError::Validation(ValidationError::DuplicatePin(18)))
        ));
    }

    #[test]
    fn should_accept_default_channel_map_with_four_switches_and_one_pwm() {
        assert!(ChannelMap::default().validate(4, 1).is_ok());
    }

    #[test]
    fn should_reject_channel_map_beyond_switch_count() {
        let result = ChannelMap::default().validate(3, 1);
        assert_eq!(
            result,
            Err(ValidationError::ChannelReference {
                role: "co2",
                kind: ChannelKind::Switch,
                index: 3,
                count: 3,
            })
        );
    }

    #[test]
    fn should_reject_channel_map_without_pwm() {
        let result = ChannelMap::default().validate(4, 0);
        assert!(matches!(
            result,
            Err(ValidationError::ChannelReference { role: "dimmer", .. })
        ));
    }
}
