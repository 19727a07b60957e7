//! Counter page.
//!
//! - `GET  /golds?incr`        increment the page identity's counter and render it
//! - `GET  /golds?<identity>`  render the page identity's counter
//! - `POST /golds`             accept a JSON body (logged only)

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Html,
    routing::get,
    Router,
};
use golds_core::CounterError;
use golds_wecom::GoldCounters;
use tera::{Context, Tera};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::status_code;

const GOLDS_TEMPLATE: &str = "golds.html";

#[derive(Clone)]
pub struct GoldsState {
    counters: Arc<GoldCounters>,
    identity: String,
    templates: Arc<Tera>,
}

impl GoldsState {
    pub fn new(counters: Arc<GoldCounters>, identity: impl Into<String>, templates: Arc<Tera>) -> Self {
        Self { counters, identity: identity.into(), templates }
    }
}

pub fn init_templates() -> Result<Arc<Tera>, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(GOLDS_TEMPLATE, include_str!("../../../templates/golds.html"))?;
    Ok(Arc::new(tera))
}

pub fn router(state: GoldsState) -> Router {
    Router::new().route("/golds", get(show_golds).post(receive_golds)).with_state(state)
}

pub async fn show_golds(
    State(state): State<GoldsState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let correlation_id = Uuid::new_v4().to_string();

    let outcome = if params.contains_key("incr") {
        Some(state.counters.increment(&state.identity).await)
    } else if params.contains_key(&state.identity) {
        Some(state.counters.read(&state.identity).await)
    } else {
        None
    };

    let golds = match outcome {
        Some(Ok(value)) => value,
        Some(Err(counter_error)) => return Err(reject(counter_error, &correlation_id)),
        None => 0,
    };

    let mut context = Context::new();
    context.insert("golds", &golds);
    let page = state.templates.render(GOLDS_TEMPLATE, &context).map_err(|render_error| {
        error!(
            event_name = "golds.page.render_failed",
            correlation_id = %correlation_id,
            error = %render_error,
            "counter page template failed to render"
        );
        (StatusCode::INTERNAL_SERVER_ERROR, "counter page unavailable".to_owned())
    })?;

    Ok(Html(page))
}

pub async fn receive_golds(headers: HeaderMap, body: Bytes) -> StatusCode {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().starts_with("application/json"));

    if !is_json {
        warn!(event_name = "golds.post.rejected", "non-json body rejected");
        return StatusCode::BAD_REQUEST;
    }

    info!(
        event_name = "golds.post.received",
        body = %String::from_utf8_lossy(&body),
        "json body received"
    );
    StatusCode::OK
}

fn reject(counter_error: CounterError, correlation_id: &str) -> (StatusCode, String) {
    let interface_error = counter_error.into_interface(correlation_id);
    warn!(
        event_name = "golds.page.counter_failed",
        correlation_id = %correlation_id,
        error = %interface_error,
        "counter operation failed"
    );
    (status_code(&interface_error), interface_error.message().to_owned())
}
