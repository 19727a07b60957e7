//! `POST /wecom`: one inbound message in, one reply out.

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use golds_core::InterfaceError;
use golds_wecom::{DispatchError, InboundMessage, MessageDispatcher};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Clone)]
pub struct WebhookState {
    dispatcher: MessageDispatcher,
    request_timeout: Duration,
}

impl WebhookState {
    pub fn new(dispatcher: MessageDispatcher, request_timeout: Duration) -> Self {
        Self { dispatcher, request_timeout }
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/wecom", post(receive_message)).with_state(state)
}

pub async fn receive_message(
    State(state): State<WebhookState>,
    Json(message): Json<InboundMessage>,
) -> Result<Response, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let message_type = message.message_type();
    info!(
        event_name = "wecom.webhook.received",
        correlation_id = %correlation_id,
        message_type = %message_type,
        from_user = %message.from_user,
        "inbound message received"
    );

    let outcome =
        tokio::time::timeout(state.request_timeout, state.dispatcher.dispatch(&message)).await;

    match outcome {
        Ok(Ok(reply)) => {
            info!(
                event_name = "wecom.webhook.replied",
                correlation_id = %correlation_id,
                message_type = %message_type,
                "reply produced"
            );
            Ok(Json(reply).into_response())
        }
        Ok(Err(DispatchError::UnknownMessageType(_))) => {
            info!(
                event_name = "wecom.webhook.ignored",
                correlation_id = %correlation_id,
                message_type = %message_type,
                "message type has no handler; dropped"
            );
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Ok(Err(DispatchError::Handler(handler_error))) => {
            error!(
                event_name = "wecom.webhook.handler_failed",
                correlation_id = %correlation_id,
                error = %handler_error,
                "message handler failed"
            );
            Err(ApiError(InterfaceError::Internal {
                message: handler_error.to_string(),
                correlation_id,
            }))
        }
        Err(_) => {
            warn!(
                event_name = "wecom.webhook.timeout",
                correlation_id = %correlation_id,
                timeout_secs = state.request_timeout.as_secs(),
                "dispatch exceeded request deadline"
            );
            Err(ApiError(InterfaceError::ServiceUnavailable {
                message: format!(
                    "dispatch did not finish within {}s",
                    state.request_timeout.as_secs()
                ),
                correlation_id,
            }))
        }
    }
}
