//! JSON handlers for digital channels.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use lightsrv_app::ports::GpioBackend;

use crate::api::Envelope;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of `PUT` requests and payload of every switch response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SwitchState {
    pub on: bool,
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Envelope<SwitchState>>),
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
    Ok(Json<Envelope<SwitchState, SwitchState>>),
}

impl IntoResponse for PutResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /v1/switch/{index}`
pub async fn get<B>(
    State(state): State<AppState<B>>,
    index: Result<Path<usize>, PathRejection>,
) -> Result<GetResponse, ApiError>
where
    B: GpioBackend + 'static,
{
    let Path(index) = index?;
    let on = state.controller.get_channel(index)?;
    Ok(GetResponse::Ok(Json(Envelope::ok(SwitchState { on }))))
}

/// `PUT /v1/switch/{index}`
///
/// Writes the channel and reads it back in the same hardware bracket.
pub async fn put<B>(
    State(state): State<AppState<B>>,
    index: Result<Path<usize>, PathRejection>,
    body: Result<Json<SwitchState>, JsonRejection>,
) -> Result<PutResponse, ApiError>
where
    B: GpioBackend + 'static,
{
    let Path(index) = index?;
    let Json(request) = body?;
    tracing::info!(index, on = request.on, "switch request");
    let on = state.controller.switch_and_read(index, request.on)?;
    Ok(PutResponse::Ok(Json(Envelope::echo(
        request,
        SwitchState { on },
    ))))
}
