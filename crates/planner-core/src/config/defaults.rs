// --- Default value functions ---

pub(super) fn default_name() -> String {
    "Planner".to_string()
}
pub(super) fn default_data_dir() -> String {
    "~/.planner".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_timezone() -> String {
    "Asia/Dhaka".to_string()
}
pub(super) fn default_recipient_name() -> String {
    "Ziban".to_string()
}
pub(super) fn default_http_timeout_secs() -> u64 {
    30
}
pub(super) fn default_routine_range() -> String {
    "Sheet1!A1:G30".to_string()
}
pub(super) fn default_provider() -> String {
    "openrouter".to_string()
}
pub(super) fn default_true() -> bool {
    true
}
pub(super) fn default_openrouter_model() -> String {
    "google/gemini-2.5-flash-lite-preview-09-2025".to_string()
}
pub(super) fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}
pub(super) fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
pub(super) fn default_whatsapp_api_version() -> String {
    "v21.0".to_string()
}
pub(super) fn default_cron() -> String {
    "00 8 * * *".to_string()
}
pub(super) fn default_api_host() -> String {
    "0.0.0.0".to_string()
}
pub(super) fn default_api_port() -> u16 {
    3000
}
