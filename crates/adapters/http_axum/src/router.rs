//! Axum router assembly.

use axum::Router;
use axum::http::{HeaderValue, header};
use axum::routing::get;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use lightsrv_app::ports::GpioBackend;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the channel API under `/v1` and serves the index page at `/`.
/// Every response allows any origin; `OPTIONS` handlers add the allowed
/// methods and headers. Includes a
/// [`TraceLayer`] that logs each HTTP request/response at the `DEBUG` level
/// using the `tracing` ecosystem.
pub fn build<B>(state: AppState<B>) -> Router
where
    B: GpioBackend + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/v1", crate::api::routes())
        .merge(crate::index::routes())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
