use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// WhatsApp Cloud API config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default)]
    pub phone_number_id: String,
    #[serde(default)]
    pub access_token: String,
    /// Recipient number in any notation (`+880 1700-000000`); only digits are used.
    #[serde(default)]
    pub recipient: String,
    #[serde(default = "default_whatsapp_api_version")]
    pub api_version: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            phone_number_id: String::new(),
            access_token: String::new(),
            recipient: String::new(),
            api_version: default_whatsapp_api_version(),
        }
    }
}

impl WhatsAppConfig {
    /// Recipient reduced to its digits.
    pub fn recipient_phone(&self) -> String {
        self.recipient.chars().filter(|c| c.is_ascii_digit()).collect()
    }
}
