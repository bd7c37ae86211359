use serde::{Deserialize, Serialize};

/// A single-turn request passed to a prose provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// The prompt body.
    pub current_message: String,
}

/// A structured message for API-based providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

impl Context {
    pub fn new(message: &str) -> Self {
        Self {
            current_message: message.to_string(),
        }
    }

    /// The prompt as the single user message API providers expect.
    pub fn to_api_messages(&self) -> Vec<ApiMessage> {
        vec![ApiMessage {
            role: "user".to_string(),
            content: self.current_message.clone(),
        }]
    }
}
