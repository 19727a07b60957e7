use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::message::{InboundMessage, MessageType, OutboundMessage};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("{handler} handler cannot process a {actual} message")]
    UnexpectedPayload { handler: MessageType, actual: MessageType },
}

#[async_trait]
pub trait MessageHandler: Send + Sync {
    fn message_type(&self) -> MessageType;

    async fn handle_message(
        &self,
        message: &InboundMessage,
    ) -> Result<OutboundMessage, HandlerError>;
}

/// Handler table keyed by message type. Built once at startup and read-only
/// afterwards; wrap in `Arc` to share across request tasks.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<MessageType, Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last registration for a type wins; the replaced handler is returned.
    pub fn register(
        &mut self,
        message_type: MessageType,
        handler: Arc<dyn MessageHandler>,
    ) -> Option<Arc<dyn MessageHandler>> {
        let previous = self.handlers.insert(message_type, handler);
        if previous.is_some() {
            debug!(
                event_name = "wecom.registry.replaced",
                message_type = %message_type,
                "message handler replaced"
            );
        }
        previous
    }

    pub fn lookup(&self, message_type: MessageType) -> Option<Arc<dyn MessageHandler>> {
        self.handlers.get(&message_type).cloned()
    }

    pub fn entries(&self) -> impl Iterator<Item = (MessageType, &Arc<dyn MessageHandler>)> + '_ {
        self.handlers.iter().map(|(message_type, handler)| (*message_type, handler))
    }

    pub fn message_types(&self) -> Vec<MessageType> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
