//! In-memory backend shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use lightsrv_domain::channel::Polarity;
use lightsrv_domain::error::LightsrvError;

use crate::ports::{GpioBackend, GpioSession};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Acquire,
    Release,
    ConfigureOutput(u8),
    WritePin { pin: u8, on: bool },
    ReadPin(u8),
    ConfigurePwm { pin: u8, divider: u32, range: u32 },
    WritePwm { pin: u8, duty: u32 },
}

/// Records every call; stores the logical level written to each pin.
#[derive(Default)]
pub struct RecordingBackend {
    ops: Mutex<Vec<Op>>,
    levels: Mutex<HashMap<u8, bool>>,
    failing_pins: Mutex<HashSet<u8>>,
    fail_acquire: Mutex<bool>,
}

impl RecordingBackend {
    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    pub fn count(&self, wanted: &Op) -> usize {
        self.ops.lock().unwrap().iter().filter(|op| *op == wanted).count()
    }

    pub fn fail_pin(&self, pin: u8) {
        self.failing_pins.lock().unwrap().insert(pin);
    }

    pub fn fail_acquire(&self) {
        *self.fail_acquire.lock().unwrap() = true;
    }

    fn record(&self, op: Op) {
        self.ops.lock().unwrap().push(op);
    }

    fn check(&self, pin: u8) -> Result<(), LightsrvError> {
        if self.failing_pins.lock().unwrap().contains(&pin) {
            return Err(LightsrvError::Hardware(Box::new(std::io::Error::other(
                format!("pin {pin} stuck"),
            ))));
        }
        Ok(())
    }
}

pub struct RecordingSession<'a> {
    backend: &'a RecordingBackend,
}

impl Drop for RecordingSession<'_> {
    fn drop(&mut self) {
        self.backend.record(Op::Release);
    }
}

impl GpioSession for RecordingSession<'_> {
    fn configure_output(&mut self, pin: u8) -> Result<(), LightsrvError> {
        self.backend.record(Op::ConfigureOutput(pin));
        Ok(())
    }

    fn write_pin(&mut self, pin: u8, on: bool, _polarity: Polarity) -> Result<(), LightsrvError> {
        self.backend.check(pin)?;
        self.backend.record(Op::WritePin { pin, on });
        self.backend.levels.lock().unwrap().insert(pin, on);
        Ok(())
    }

    fn read_pin(&mut self, pin: u8, polarity: Polarity) -> Result<bool, LightsrvError> {
        self.backend.check(pin)?;
        self.backend.record(Op::ReadPin(pin));
        let level = self.backend.levels.lock().unwrap().get(&pin).copied();
        Ok(polarity.apply(level.unwrap_or(false)))
    }

    fn configure_pwm(
        &mut self,
        pin: u8,
        clock_divider: u32,
        range: u32,
    ) -> Result<(), LightsrvError> {
        self.backend.record(Op::ConfigurePwm {
            pin,
            divider: clock_divider,
            range,
        });
        Ok(())
    }

    fn write_pwm(&mut self, pin: u8, duty: u32) -> Result<(), LightsrvError> {
        self.backend.check(pin)?;
        self.backend.record(Op::WritePwm { pin, duty });
        Ok(())
    }
}

impl GpioBackend for RecordingBackend {
    type Session<'a> = RecordingSession<'a>;

    fn acquire(&self) -> Result<Self::Session<'_>, LightsrvError> {
        if *self.fail_acquire.lock().unwrap() {
            return Err(LightsrvError::Hardware(Box::new(std::io::Error::other(
                "peripheral unavailable",
            ))));
        }
        self.record(Op::Acquire);
        Ok(RecordingSession { backend: self })
    }
}
