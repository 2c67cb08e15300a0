//! JSON handlers for PWM channels.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use lightsrv_app::ports::GpioBackend;

use crate::api::Envelope;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of `PUT` requests: the requested duty in percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PwmRequest {
    pub value: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PwmValue {
    pub value: u8,
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Envelope<PwmValue>>),
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
    Ok(Json<Envelope<PwmValue, PwmRequest>>),
}

impl IntoResponse for PutResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /v1/pwm/{index}` — the cached value, no hardware access.
pub async fn get<B>(
    State(state): State<AppState<B>>,
    index: Result<Path<usize>, PathRejection>,
) -> Result<GetResponse, ApiError>
where
    B: GpioBackend + 'static,
{
    let Path(index) = index?;
    let value = state.controller.get_pwm(index)?;
    Ok(GetResponse::Ok(Json(Envelope::ok(PwmValue { value }))))
}

/// `PUT /v1/pwm/{index}`
pub async fn put<B>(
    State(state): State<AppState<B>>,
    index: Result<Path<usize>, PathRejection>,
    body: Result<Json<PwmRequest>, JsonRejection>,
) -> Result<PutResponse, ApiError>
where
    B: GpioBackend + 'static,
{
    let Path(index) = index?;
    let Json(request) = body?;
    tracing::info!(index, value = request.value, "pwm request");
    let value = state.controller.set_pwm_and_read(index, request.value)?;
    Ok(PutResponse::Ok(Json(Envelope::echo(
        request,
        PwmValue { value },
    ))))
}
