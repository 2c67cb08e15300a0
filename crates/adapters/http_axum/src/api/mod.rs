//! JSON channel API handler modules.
//!
//! Successful responses share one envelope:
//!
//! ```json
//! {"error": {"code": 0}, "request": {...}, "response": {...}}
//! ```
//!
//! `request` echoes the decoded body and is only present for `PUT`.

#[allow(clippy::missing_errors_doc)]
pub mod auto;
#[allow(clippy::missing_errors_doc)]
pub mod list;
#[allow(clippy::missing_errors_doc)]
pub mod pwm;
#[allow(clippy::missing_errors_doc)]
pub mod switch;

use axum::Router;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;

use lightsrv_app::ports::GpioBackend;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Status {
    pub code: u8,
}

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<Resp, Req = ()> {
    pub error: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Req>,
    pub response: Resp,
}

impl<Resp> Envelope<Resp> {
    pub fn ok(response: Resp) -> Self {
        Self {
            error: Status { code: 0 },
            request: None,
            response,
        }
    }
}

impl<Resp, Req> Envelope<Resp, Req> {
    pub fn echo(request: Req, response: Resp) -> Self {
        Self {
            error: Status { code: 0 },
            request: Some(request),
            response,
        }
    }
}

/// `OPTIONS` answer for resources that accept `GET` and `PUT`.
pub async fn options_get_put() -> Response {
    preflight("OPTIONS,GET,PUT", "GET,PUT,OPTIONS")
}

/// `OPTIONS` answer for read-only resources.
pub async fn options_get() -> Response {
    preflight("OPTIONS,GET", "GET,OPTIONS")
}

fn preflight(allow: &'static str, methods: &'static str) -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ALLOW, HeaderValue::from_static(allow)),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(methods),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("*"),
            ),
        ],
    )
        .into_response()
}

/// Build the `/v1` sub-router.
pub fn routes<B>() -> Router<AppState<B>>
where
    B: GpioBackend + 'static,
{
    Router::new()
        .route(
            "/switch/{index}",
            get(switch::get::<B>)
                .put(switch::put::<B>)
                .options(options_get_put),
        )
        .route(
            "/pwm/{index}",
            get(pwm::get::<B>).put(pwm::put::<B>).options(options_get_put),
        )
        .route("/list", get(list::get::<B>).options(options_get))
        .route(
            "/auto",
            get(auto::get::<B>).put(auto::put::<B>).options(options_get_put),
        )
}
