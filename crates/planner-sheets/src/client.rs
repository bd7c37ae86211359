//! Sheets v4 `values` and metadata reads.

use async_trait::async_trait;
use planner_core::{config::SheetsConfig, error::PlannerError, traits::TabularSource};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::auth::Credentials;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Google Sheets reader.
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

#[derive(Deserialize)]
pub(crate) struct ValueRange {
    #[serde(default)]
    pub values: Option<Vec<Vec<serde_json::Value>>>,
}

#[derive(Deserialize)]
pub(crate) struct SpreadsheetMeta {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
pub(crate) struct SheetEntry {
    pub properties: Option<SheetProperties>,
}

#[derive(Deserialize)]
pub(crate) struct SheetProperties {
    pub title: Option<String>,
}

impl GoogleSheetsClient {
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, PlannerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlannerError::Source(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            credentials,
            base_url: SHEETS_BASE_URL.to_string(),
        })
    }

    /// Build from the `[sheets]` config section.
    pub fn from_config(cfg: &SheetsConfig, timeout: Duration) -> Result<Self, PlannerError> {
        Self::new(Credentials::from_config(cfg)?, timeout)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    pub(crate) fn meta_url(&self, spreadsheet_id: &str) -> String {
        format!(
            "{}/{}?fields=sheets(properties(title))",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(spreadsheet_id)
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, PlannerError> {
        let mut req = self.client.get(url);
        req = match &self.credentials {
            Credentials::ServiceAccount(auth) => {
                req.bearer_auth(auth.access_token(&self.client).await?)
            }
            Credentials::ApiKey(key) => req.query(&[("key", key.as_str())]),
        };

        debug!("sheets: GET {url}");
        let resp = req
            .send()
            .await
            .map_err(|e| PlannerError::Source(format!("sheets request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PlannerError::Source(format!(
                "sheets returned {status}: {text}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| PlannerError::Source(format!("sheets: failed to parse response: {e}")))
    }
}

/// Render one cell as the string a person sees in the sheet.
pub(crate) fn cell_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn rows_from(range: ValueRange) -> Vec<Vec<String>> {
    range
        .values
        .unwrap_or_default()
        .iter()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect()
}

pub(crate) fn first_title(meta: SpreadsheetMeta) -> Option<String> {
    meta.sheets
        .into_iter()
        .next()
        .and_then(|s| s.properties)
        .and_then(|p| p.title)
        .filter(|t| !t.trim().is_empty())
}

#[async_trait]
impl TabularSource for GoogleSheetsClient {
    fn name(&self) -> &str {
        "google-sheets"
    }

    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, PlannerError> {
        let range_body: ValueRange = self.get_json(&self.values_url(spreadsheet_id, range)).await?;
        let rows = rows_from(range_body);
        debug!("sheets: {range} returned {} row(s)", rows.len());
        Ok(rows)
    }

    async fn first_sheet_title(
        &self,
        spreadsheet_id: &str,
    ) -> Result<Option<String>, PlannerError> {
        let meta: SpreadsheetMeta = self.get_json(&self.meta_url(spreadsheet_id)).await?;
        Ok(first_title(meta))
    }
}
