//! Test doubles for the gateway's seams.

use super::Gateway;
use async_trait::async_trait;
use planner_core::{
    compose::Composer,
    config::SheetsConfig,
    context::Context,
    error::PlannerError,
    message::OutgoingMessage,
    traits::{Channel, Provider, TabularSource},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const TASK_SHEET: &str = "tasks-sheet";
pub(crate) const ROUTINE_SHEET: &str = "routine-sheet";

pub(crate) fn rows(cells: &[&[&str]]) -> Vec<Vec<String>> {
    cells
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

/// In-memory sheets keyed by `spreadsheet_id/range`.
#[derive(Default)]
pub(crate) struct MockSource {
    pub(crate) ranges: Mutex<HashMap<String, Vec<Vec<String>>>>,
    pub(crate) failing: Mutex<Vec<String>>,
    pub(crate) first_title: Option<String>,
    pub(crate) delay: Option<Duration>,
    pub(crate) in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

impl MockSource {
    pub(crate) fn set(&self, spreadsheet_id: &str, range: &str, rows: Vec<Vec<String>>) {
        self.ranges
            .lock()
            .unwrap()
            .insert(format!("{spreadsheet_id}/{range}"), rows);
    }

    pub(crate) fn fail(&self, spreadsheet_id: &str) {
        self.failing.lock().unwrap().push(spreadsheet_id.to_string());
    }
}

#[async_trait]
impl TabularSource for MockSource {
    fn name(&self) -> &str {
        "mock-sheets"
    }

    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, PlannerError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().iter().any(|s| s == spreadsheet_id) {
            return Err(PlannerError::Source(format!("{spreadsheet_id} unavailable")));
        }
        Ok(self
            .ranges
            .lock()
            .unwrap()
            .get(&format!("{spreadsheet_id}/{range}"))
            .cloned()
            .unwrap_or_default())
    }

    async fn first_sheet_title(
        &self,
        _spreadsheet_id: &str,
    ) -> Result<Option<String>, PlannerError> {
        Ok(self.first_title.clone())
    }
}

/// Provider that returns fixed text, or fails.
pub(crate) struct MockProvider {
    pub(crate) reply: Option<String>,
    pub(crate) prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub(crate) fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, PlannerError> {
        self.prompts
            .lock()
            .unwrap()
            .push(context.current_message.clone());
        match &self.reply {
            Some(text) => {
                let mut msg = OutgoingMessage::text(text.clone());
                msg.metadata.provider_used = "mock-provider".to_string();
                Ok(msg)
            }
            None => Err(PlannerError::Provider("mock outage".to_string())),
        }
    }
}

/// Channel that records every message it is asked to send.
#[derive(Default)]
pub(crate) struct MockChannel {
    pub(crate) sent: Arc<Mutex<Vec<OutgoingMessage>>>,
    pub(crate) fail_send: bool,
}

impl MockChannel {
    pub(crate) fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.text.clone())
            .collect()
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), PlannerError> {
        self.sent.lock().unwrap().push(message);
        if self.fail_send {
            return Err(PlannerError::Channel("mock send failure".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn sheets_config() -> SheetsConfig {
    SheetsConfig {
        spreadsheet_id: TASK_SHEET.to_string(),
        range: "Tasks!A2:D".to_string(),
        routine_spreadsheet_id: ROUTINE_SHEET.to_string(),
        ..Default::default()
    }
}

pub(crate) fn gateway(
    source: Arc<MockSource>,
    provider: Option<Arc<MockProvider>>,
    channel: Arc<MockChannel>,
    sheets: SheetsConfig,
) -> Gateway {
    Gateway::new(
        source,
        provider.map(|p| p as Arc<dyn Provider>),
        channel,
        sheets,
        Composer::new("Ziban", chrono_tz::Asia::Dhaka),
    )
}
