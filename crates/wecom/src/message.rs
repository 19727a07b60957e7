use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Voice,
    Event,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Voice => "voice",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "msg_type", rename_all = "lowercase")]
pub enum MessagePayload {
    Text {
        content: String,
    },
    Image {
        pic_url: String,
        media_id: String,
    },
    Voice {
        media_id: String,
        format: String,
    },
    Event {
        event: String,
        #[serde(default)]
        event_key: Option<String>,
    },
}

impl MessagePayload {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Text { .. } => MessageType::Text,
            Self::Image { .. } => MessageType::Image,
            Self::Voice { .. } => MessageType::Voice,
            Self::Event { .. } => MessageType::Event,
        }
    }
}

/// One received webhook event. Read-only to the handlers; lives for one dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub to_user: String,
    pub from_user: String,
    pub create_time: i64,
    #[serde(default)]
    pub msg_id: Option<i64>,
    #[serde(default)]
    pub agent_id: i64,
    #[serde(flatten)]
    pub payload: MessagePayload,
}

impl InboundMessage {
    pub fn text(from_user: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            to_user: String::new(),
            from_user: from_user.into(),
            create_time: 0,
            msg_id: None,
            agent_id: 0,
            payload: MessagePayload::Text { content: content.into() },
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.payload.message_type()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "msg_type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Text { content: String },
}

impl OutboundMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text { content: content.into() }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Text { content } => content,
        }
    }
}
