//! # lightsrv-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON channel API** under `/v1` (`switch`, `pwm`, `list`, `auto`)
//! - Serve the single whitelisted **index page** from the docroot, with the
//!   channel names substituted into it
//! - Map HTTP requests into controller and engine calls (driving adapter)
//! - Map domain errors into the `{"error": {"code": …}}` envelope
//!
//! ## Dependency rule
//! Depends on `lightsrv-app` (controller, engine, port traits) and
//! `lightsrv-domain` (error types). Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod index;
pub mod router;
pub mod state;
