//! JSON handler listing every channel at once.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use lightsrv_app::ports::GpioBackend;

use crate::api::Envelope;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AutoStatus {
    pub available: bool,
    /// Only present when automation is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ChannelList {
    pub switches: Vec<bool>,
    pub pwms: Vec<u8>,
    pub auto: AutoStatus,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Envelope<ChannelList>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /v1/list` — every channel, read in a single hardware bracket.
pub async fn get<B>(State(state): State<AppState<B>>) -> Result<ListResponse, ApiError>
where
    B: GpioBackend + 'static,
{
    let snapshot = state.controller.snapshot()?;
    let available = state.engine.has_automation();
    let auto = AutoStatus {
        available,
        value: available.then(|| state.engine.get_auto()),
    };
    Ok(ListResponse::Ok(Json(Envelope::ok(ChannelList {
        switches: snapshot.switches,
        pwms: snapshot.pwms,
        auto,
    }))))
}
