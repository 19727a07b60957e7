use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::message::{InboundMessage, MessageType, OutboundMessage};
use crate::registry::{HandlerError, HandlerRegistry};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no handler registered for message type `{0}`")]
    UnknownMessageType(MessageType),
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

/// Routes each inbound message to the handler registered for its type.
/// Stateless beyond the shared registry, so concurrent dispatches are safe.
#[derive(Clone)]
pub struct MessageDispatcher {
    registry: Arc<HandlerRegistry>,
}

impl MessageDispatcher {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, message: &InboundMessage) -> Result<OutboundMessage, DispatchError> {
        let message_type = message.message_type();
        let Some(handler) = self.registry.lookup(message_type) else {
            warn!(
                event_name = "wecom.dispatch.unknown_type",
                message_type = %message_type,
                from_user = %message.from_user,
                "no handler registered for message type"
            );
            return Err(DispatchError::UnknownMessageType(message_type));
        };

        debug!(
            event_name = "wecom.dispatch.routed",
            message_type = %message_type,
            from_user = %message.from_user,
            "dispatching message"
        );
        Ok(handler.handle_message(message).await?)
    }
}
