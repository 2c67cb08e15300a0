//! Shared application state for axum handlers.

use std::sync::Arc;

use lightsrv_app::automation_engine::AutomationEngine;
use lightsrv_app::channel_controller::ChannelController;
use lightsrv_app::ports::GpioBackend;

use crate::index::IndexPage;

/// Application state shared across all axum handlers.
///
/// Generic over the GPIO backend to avoid dynamic dispatch. `Clone` is
/// implemented manually so the backend itself does not need to be `Clone`;
/// only the `Arc` wrappers are cloned.
pub struct AppState<B> {
    /// Channel controller, shared with the automation engine.
    pub controller: Arc<ChannelController<B>>,
    pub engine: Arc<AutomationEngine<B>>,
    /// Index page template settings.
    pub index: Arc<IndexPage>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            engine: Arc::clone(&self.engine),
            index: Arc::clone(&self.index),
        }
    }
}

impl<B: GpioBackend + 'static> AppState<B> {
    /// Create a new application state. The controller is taken from the
    /// engine, so both always drive the same hardware.
    pub fn new(engine: Arc<AutomationEngine<B>>, index: IndexPage) -> Self {
        Self {
            controller: Arc::clone(engine.controller()),
            engine,
            index: Arc::new(index),
        }
    }
}
