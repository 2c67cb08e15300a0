//! # lightsrv-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `GpioBackend` / `GpioSession` — acquire the peripheral, drive and read pins
//!   - `Clock` — local wall-clock time of day
//! - Provide the use-cases built on them:
//!   - `ChannelController` — logical digital and PWM channels, polarity, PWM cache
//!   - `AutomationEngine` — apply the daily schedule on every tick
//!   - `PeriodicTask` — drift-free invoker aligned to local midnight
//!
//! ## Dependency rule
//! Depends on `lightsrv-domain` only (plus `tokio` for timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod automation_engine;
pub mod channel_controller;
pub mod periodic_task;
pub mod ports;

#[cfg(test)]
mod testing;
