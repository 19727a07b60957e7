use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::commands::{CommandRouter, CommandTable};
use crate::counters::GoldCounters;
use crate::message::{InboundMessage, MessagePayload, MessageType, OutboundMessage};
use crate::registry::{HandlerError, MessageHandler};

pub struct TextMessageHandler {
    router: CommandRouter,
    counters: Arc<GoldCounters>,
}

impl TextMessageHandler {
    pub fn new(table: CommandTable, counters: Arc<GoldCounters>) -> Self {
        Self { router: CommandRouter::new(table, counters.clone()), counters }
    }

    /// Shared counter gateway, also used by the `/golds` page.
    pub fn counters(&self) -> Arc<GoldCounters> {
        self.counters.clone()
    }
}

#[async_trait]
impl MessageHandler for TextMessageHandler {
    fn message_type(&self) -> MessageType {
        MessageType::Text
    }

    async fn handle_message(
        &self,
        message: &InboundMessage,
    ) -> Result<OutboundMessage, HandlerError> {
        let MessagePayload::Text { content } = &message.payload else {
            return Err(HandlerError::UnexpectedPayload {
                handler: MessageType::Text,
                actual: message.message_type(),
            });
        };

        let reply = self.router.route(content).await;
        info!(
            event_name = "wecom.text.replied",
            from_user = %message.from_user,
            reply_len = reply.len(),
            "text message handled"
        );
        Ok(OutboundMessage::text(reply))
    }
}
