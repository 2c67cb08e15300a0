//! JSON handlers for the automation switch.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use lightsrv_app::ports::GpioBackend;

use crate::api::Envelope;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of `PUT` requests.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AutoRequest {
    pub on: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AutoValue {
    pub value: bool,
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Envelope<AutoValue>>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the put endpoint.
pub enum PutResponse {
    Ok(Json<Envelope<AutoValue, AutoValue>>),
}

impl IntoResponse for PutResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /v1/auto` — always `false` on deployments without automation.
pub async fn get<B>(State(state): State<AppState<B>>) -> GetResponse
where
    B: GpioBackend + 'static,
{
    let value = state.engine.get_auto();
    GetResponse::Ok(Json(Envelope::ok(AutoValue { value })))
}

/// `PUT /v1/auto`
pub async fn put<B>(
    State(state): State<AppState<B>>,
    body: Result<Json<AutoRequest>, JsonRejection>,
) -> Result<PutResponse, ApiError>
where
    B: GpioBackend + 'static,
{
    let Json(request) = body?;
    state.engine.set_auto(request.on)?;
    Ok(PutResponse::Ok(Json(Envelope::echo(
        AutoValue { value: request.on },
        AutoValue {
            value: state.engine.get_auto(),
        },
    ))))
}
