//! # lightsrv-domain
//!
//! Pure domain model for the lightsrv channel controller.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, time of day, half-open intervals
//! - Define **channels** (digital outputs, PWM outputs, polarity, duty scaling)
//! - Define the **schedule** (light/CO2 windows, dimmer envelope, dark period)
//! - Define the validated **controller configuration** value object
//! - Contain all invariant enforcement and the pure schedule math
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod channel;
pub mod config;
pub mod schedule;
