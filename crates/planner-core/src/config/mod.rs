mod channels;
mod defaults;
mod providers;


pub use channels::*;
pub use providers::*;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PlannerError;
use defaults::*;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// IANA zone used for "today", the current weekday and timestamps.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Name used to address the recipient in messages.
    #[serde(default = "default_recipient_name")]
    pub recipient_name: String,
    /// Timeout applied to every outbound HTTP call.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            timezone: default_timezone(),
            recipient_name: default_recipient_name(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Spreadsheet locations and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Spreadsheet holding the task list.
    #[serde(default)]
    pub spreadsheet_id: String,
    /// Explicit task range (e.g. `Tasks!A2:D`). Takes precedence over `sheet_name`.
    #[serde(default)]
    pub range: String,
    /// Tab name for the task list; the range becomes `<sheet_name>!A2:D`.
    #[serde(default)]
    pub sheet_name: String,
    /// Spreadsheet holding the routine grid. Empty = same as `spreadsheet_id`.
    #[serde(default)]
    pub routine_spreadsheet_id: String,
    #[serde(default = "default_routine_range")]
    pub routine_range: String,
    /// Base64-encoded service-account JSON.
    #[serde(default)]
    pub credentials: String,
    /// Path to a service-account JSON file. Used when `credentials` is empty.
    #[serde(default)]
    pub credentials_file: String,
    /// API key for publicly readable sheets. Used when no service account is set.
    #[serde(default)]
    pub api_key: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            range: String::new(),
            sheet_name: String::new(),
            routine_spreadsheet_id: String::new(),
            routine_range: default_routine_range(),
            credentials: String::new(),
            credentials_file: String::new(),
            api_key: String::new(),
        }
    }
}

impl SheetsConfig {
    /// Task range from configuration alone, without consulting the spreadsheet.
    pub fn configured_task_range(&self) -> Option<String> {
        let range = self.range.trim();
        if !range.is_empty() {
            return Some(range.to_string());
        }
        let sheet = self.sheet_name.trim();
        if !sheet.is_empty() {
            return Some(task_range_for(sheet));
        }
        None
    }

    pub fn routine_spreadsheet_id(&self) -> &str {
        if self.routine_spreadsheet_id.trim().is_empty() {
            &self.spreadsheet_id
        } else {
            &self.routine_spreadsheet_id
        }
    }
}

/// `<sheet>!A2:D`, the task columns below the header row.
pub fn task_range_for(sheet: &str) -> String {
    format!("{sheet}!A2:D")
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Five-field cron expression evaluated in `planner.timezone`.
    #[serde(default = "default_cron")]
    pub cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: default_cron(),
        }
    }
}

/// Inspection HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Shared secret for the run trigger. Empty = no check.
    #[serde(default)]
    pub secret: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_api_host(),
            port: default_api_port(),
            secret: String::new(),
        }
    }
}

impl Config {
    /// Parsed `planner.timezone`.
    pub fn timezone(&self) -> Result<Tz, PlannerError> {
        self.planner
            .timezone
            .trim()
            .parse::<Tz>()
            .map_err(|e| PlannerError::Config(format!("invalid timezone: {e}")))
    }

    /// Override file values with well-known environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Override file values from `lookup`. Empty values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let string_overrides: [(&str, &mut String); 13] = [
            ("SPREADSHEET_ID", &mut self.sheets.spreadsheet_id),
            ("SHEET_RANGE", &mut self.sheets.range),
            ("SHEET_NAME", &mut self.sheets.sheet_name),
            (
                "ROUTINE_SPREADSHEET_ID",
                &mut self.sheets.routine_spreadsheet_id,
            ),
            ("GOOGLE_CREDENTIALS", &mut self.sheets.credentials),
            ("GOOGLE_API_KEY", &mut self.sheets.api_key),
            (
                "PHONE_NUMBER_ID",
                &mut self.channel.whatsapp.phone_number_id,
            ),
            ("WHATSAPP_TOKEN", &mut self.channel.whatsapp.access_token),
            ("YOUR_PHONE", &mut self.channel.whatsapp.recipient),
            ("TIMEZONE", &mut self.planner.timezone),
            ("CRON_SCHEDULE", &mut self.scheduler.cron),
            ("CRON_SECRET", &mut self.api.secret),
            ("RECIPIENT_NAME", &mut self.planner.recipient_name),
        ];
        for (key, slot) in string_overrides {
            if let Some(value) = get(key) {
                *slot = value;
            }
        }

        if let Some(key) = get("OPENROUTER_API_KEY") {
            self.provider
                .openrouter
                .get_or_insert_with(OpenRouterConfig::default)
                .api_key = key;
        }

        if let Some(port) = get("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.api.port = port,
                Err(_) => tracing::warn!("config: ignoring invalid PORT {port:?}"),
            }
        }
    }

    /// Every problem that prevents a pass from running.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let required = [
            ("sheets.spreadsheet_id", &self.sheets.spreadsheet_id),
            (
                "channel.whatsapp.phone_number_id",
                &self.channel.whatsapp.phone_number_id,
            ),
            (
                "channel.whatsapp.access_token",
                &self.channel.whatsapp.access_token,
            ),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                problems.push(format!("missing {name}"));
            }
        }
        if self.channel.whatsapp.recipient_phone().is_empty() {
            problems.push("missing channel.whatsapp.recipient".to_string());
        }
        let sheets = &self.sheets;
        if [&sheets.credentials, &sheets.credentials_file, &sheets.api_key]
            .iter()
            .all(|v| v.trim().is_empty())
        {
            problems.push(
                "missing Google credentials (sheets.credentials, sheets.credentials_file or sheets.api_key)"
                    .to_string(),
            );
        }

        if let Err(e) = self.timezone() {
            problems.push(e.to_string());
        }
        if let Err(e) = parse_cron(&self.scheduler.cron) {
            problems.push(e.to_string());
        }

        problems
    }

    /// `Ok` when [`problems`](Self::problems) is empty.
    pub fn validate(&self) -> Result<(), PlannerError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(PlannerError::Config(problems.join("; ")))
        }
    }
}

/// Parse a five-field cron expression.
///
/// `str::parse` on `croner::Cron` yields a pattern that never matches, so
/// every caller goes through here.
pub fn parse_cron(expr: &str) -> Result<croner::Cron, PlannerError> {
    croner::Cron::new(expr.trim())
        .parse()
        .map_err(|e| PlannerError::Config(format!("invalid scheduler.cron {expr:?}: {e}")))
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Environment overrides
/// are not applied here; see [`Config::apply_env_overrides`]. Nothing is
/// logged because tracing is configured from the result.
pub fn load(path: &str) -> Result<Config, PlannerError> {
    let path = Path::new(path);
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| PlannerError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| PlannerError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
