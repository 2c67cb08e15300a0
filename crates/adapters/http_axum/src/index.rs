//! The index page — the only static file served.
//!
//! `index.html` is read from the docroot on every request. The quoted
//! placeholders `"%%SWITCH_NAMES%%"` and `"%%PWM_NAMES%%"` are replaced by
//! JSON arrays of channel names, so the page script can use them as literals.

use std::path::{Path, PathBuf};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chrono::{DateTime, Utc};

use lightsrv_app::ports::GpioBackend;

use crate::api::options_get_put;
use crate::state::AppState;

const SWITCH_NAMES_PLACEHOLDER: &str = "\"%%SWITCH_NAMES%%\"";
const PWM_NAMES_PLACEHOLDER: &str = "\"%%PWM_NAMES%%\"";

/// Docroot and substitution values for the index page.
#[derive(Debug, Clone)]
pub struct IndexPage {
    docroot: PathBuf,
    switch_names: String,
    pwm_names: String,
    last_modified: String,
}

impl IndexPage {
    /// `started` is reported as the page's `Last-Modified` date.
    #[must_use]
    pub fn new(
        docroot: impl Into<PathBuf>,
        switch_names: &[String],
        pwm_names: &[String],
        started: DateTime<Utc>,
    ) -> Self {
        Self {
            docroot: docroot.into(),
            switch_names: names_json(switch_names),
            pwm_names: names_json(pwm_names),
            last_modified: started.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        }
    }

    #[must_use]
    pub fn docroot(&self) -> &Path {
        &self.docroot
    }

    /// Substitute the channel names into `template`.
    #[must_use]
    pub fn render(&self, template: &str) -> String {
        template
            .replace(SWITCH_NAMES_PLACEHOLDER, &self.switch_names)
            .replace(PWM_NAMES_PLACEHOLDER, &self.pwm_names)
    }
}

fn names_json(names: &[String]) -> String {
    serde_json::to_string(names).unwrap_or_else(|_| "[]".to_string())
}

/// Possible responses from the index endpoint.
pub enum IndexResponse {
    Ok { body: String, last_modified: String },
    NotFound,
}

impl IntoResponse for IndexResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok {
                body,
                last_modified,
            } => {
                let mut response = (
                    [(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("text/html; charset=utf-8"),
                    )],
                    body,
                )
                    .into_response();
                if let Ok(value) = HeaderValue::from_str(&last_modified) {
                    response.headers_mut().insert(header::LAST_MODIFIED, value);
                }
                response
            }
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

/// `GET /` and `GET /index.html`
pub async fn index<B>(State(state): State<AppState<B>>) -> IndexResponse
where
    B: GpioBackend + 'static,
{
    let page = &state.index;
    let path = page.docroot.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(template) => IndexResponse::Ok {
            body: page.render(&template),
            last_modified: page.last_modified.clone(),
        },
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "cannot open index page");
            IndexResponse::NotFound
        }
    }
}

/// Routes serving the index page. Every other path falls through to 404.
pub fn routes<B>() -> Router<AppState<B>>
where
    B: GpioBackend + 'static,
{
    Router::new()
        .route("/", get(index::<B>).options(options_get_put))
        .route("/index.html", get(index::<B>).options(options_get_put))
}
