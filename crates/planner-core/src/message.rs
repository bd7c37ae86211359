use serde::{Deserialize, Serialize};

/// An outgoing notification to deliver through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    pub metadata: MessageMetadata,
    /// Platform-specific destination (e.g. a WhatsApp phone number).
    /// `None` = the channel's configured default recipient.
    #[serde(default)]
    pub reply_target: Option<String>,
}

impl OutgoingMessage {
    /// A plain text message for the default recipient.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Metadata about how a message was generated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageMetadata {
    /// Which provider produced this text ("fallback" for composer output).
    pub provider_used: String,
}
