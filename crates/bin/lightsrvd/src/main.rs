//! # lightsrvd — lightsrv daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Select the GPIO backend (`rppal` or `virtual`) and set up every channel
//! - Construct the channel controller and automation engine
//! - Schedule the automation tick on intervals aligned to local midnight
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use chrono::Utc;
use lightsrv_adapter_http_axum::index::IndexPage;
use lightsrv_adapter_http_axum::state::AppState;
use lightsrv_adapter_rppal::RppalGpio;
use lightsrv_adapter_virtual::VirtualGpio;
use lightsrv_app::automation_engine::{AutomationEngine, TickOutcome};
use lightsrv_app::channel_controller::ChannelController;
use lightsrv_app::periodic_task::PeriodicTask;
use lightsrv_app::ports::GpioBackend;
use lightsrv_domain::time::TimeOfDay;

use crate::config::{BackendKind, Config};

// One cooperative event loop runs the server, the handlers and the ticks.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .init();

    tracing::info!(backend = ?config.gpio.backend, "lightsrvd starting");
    match config.gpio.backend {
        BackendKind::Rppal => run(RppalGpio::new(), &config).await,
        BackendKind::Virtual => run(VirtualGpio::new(), &config).await,
    }
}

async fn run<B>(backend: B, config: &Config) -> Result<(), Box<dyn std::error::Error>>
where
    B: GpioBackend + 'static,
{
    // Controller
    let controller_config = config.controller_config()?;
    let controller = Arc::new(ChannelController::new(backend, &controller_config));
    controller.setup()?;

    // Automation
    let engine = Arc::new(AutomationEngine::new(
        Arc::clone(&controller),
        controller_config.has_automation(),
        config.automation.schedule.clone(),
        config.automation.channels,
    )?);
    let _automation = if engine.has_automation() {
        let engine = Arc::clone(&engine);
        let task = PeriodicTask::start(
            "automation",
            config.automation.interval_secs,
            config.automation.start_immediately,
            move || run_tick(&engine),
        )?;
        Some(task)
    } else {
        tracing::info!("automation not configured, skipping periodic tick");
        None
    };

    // HTTP
    let index = IndexPage::new(
        config.server.docroot.clone(),
        &config.switch_names(),
        &config.pwm_names(),
        Utc::now(),
    );
    let state = AppState::new(engine, index);
    let app = lightsrv_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        switches = controller.size(),
        pwms = controller.pwm_size(),
        "lightsrvd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("lightsrvd stopped");
    Ok(())
}

fn run_tick<B: GpioBackend>(engine: &AutomationEngine<B>) {
    match engine.tick(TimeOfDay::now()) {
        Ok(TickOutcome::Applied(report)) if !report.is_complete() => {
            tracing::warn!(
                at = %report.at,
                failures = report.failures.len(),
                "automation tick partially applied"
            );
        }
        Ok(_) => {}
        Err(err) => tracing::error!(error = %err, "automation tick failed"),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
