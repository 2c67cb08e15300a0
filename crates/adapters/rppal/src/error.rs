//! rppal adapter error types.

use lightsrv_domain::error::LightsrvError;

/// Errors specific to the rppal backend.
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    /// Opening the GPIO peripheral or driving a pin failed.
    #[error("GPIO error")]
    Gpio(#[from] rppal::gpio::Error),

    /// Configuring or writing a PWM channel failed.
    #[error("PWM error")]
    Pwm(#[from] rppal::pwm::Error),

    /// The pin is not routed to a hardware PWM channel.
    #[error("GPIO {0} has no hardware PWM channel")]
    NoPwmChannel(u8),
}

impl GpioError {
    /// Convert into a [`LightsrvError::Hardware`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> LightsrvError {
        LightsrvError::Hardware(Box::new(self))
    }
}

impl From<GpioError> for LightsrvError {
    fn from(err: GpioError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_missing_pwm_channel() {
        let err = GpioError::NoPwmChannel(17);
        assert_eq!(err.to_string(), "GPIO 17 has no hardware PWM channel");
    }

    #[test]
    fn should_convert_to_hardware_error() {
        let err: LightsrvError = GpioError::NoPwmChannel(4).into();
        assert!(matches!(err, LightsrvError::Hardware(_)));
    }

    #[test]
    fn should_keep_source_when_converted() {
        let err: LightsrvError = GpioError::NoPwmChannel(4).into();
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "GPIO 4 has no hardware PWM channel");
    }
}
