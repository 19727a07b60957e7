//! WeCom message handling for the golds service.
//!
//! - **Messages** (`message`) - inbound/outbound message model keyed by `MessageType`
//! - **Registry** (`registry`) - per-type `MessageHandler` table built at startup
//! - **Dispatch** (`dispatch`) - routes one inbound message to its handler
//! - **Commands** (`commands`) - slash-command table and router over the gold counters
//! - **Text** (`text`) - the text message handler
//!
//! # Architecture
//!
//! ```text
//! Webhook → MessageDispatcher → HandlerRegistry → TextMessageHandler
//!                                                     ↓
//!                                CommandRouter → GoldCounters → CounterStore
//! ```

pub mod commands;
pub mod counters;
pub mod dispatch;
pub mod message;
pub mod registry;
pub mod text;

use std::sync::Arc;

pub use commands::{CommandAction, CommandError, CommandRouter, CommandTable, NO_DATA_REPLY};
pub use counters::GoldCounters;
pub use dispatch::{DispatchError, MessageDispatcher};
pub use message::{InboundMessage, MessagePayload, MessageType, OutboundMessage};
pub use registry::{HandlerError, HandlerRegistry, MessageHandler};
pub use text::TextMessageHandler;

/// The fixed handler set this service serves: text only. Each handler is keyed
/// by the type it declares.
pub fn default_registry(text_handler: Arc<TextMessageHandler>) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(text_handler.message_type(), text_handler);
    registry
}
