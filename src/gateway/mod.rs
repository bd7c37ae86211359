//! Gateway: reads the sheets, runs the engine, and delivers notifications.
//!
//! A pass has two independent paths. The task path classifies today's and
//! overdue tasks and sends a summary. The routine path diffs the routine grid
//! against the previous pass, announces changes, and sends today's classes.

#[cfg(test)]
pub(crate) mod mocks;
mod pass;
mod prose;
mod scheduler;


pub use pass::PassReport;
pub use scheduler::next_run;

use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use planner_core::{
    change::ChangeDetector,
    compose::Composer,
    config::{task_range_for, SheetsConfig},
    error::PlannerError,
    routine::{self, ClassEntry},
    tasks::{self, ClassifiedTasks},
    traits::{Channel, Provider, TabularSource},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Change-detector key for the routine grid.
pub(crate) const ROUTINE_DATASET: &str = "routine_sheet";

/// The central gateway connecting the sheet source, prose provider, and channel.
pub struct Gateway {
    pub(super) source: Arc<dyn TabularSource>,
    pub(super) provider: Option<Arc<dyn Provider>>,
    pub(super) channel: Arc<dyn Channel>,
    pub(super) sheets: SheetsConfig,
    pub(super) composer: Composer,
    pub(super) detector: ChangeDetector,
    /// Serializes passes from the scheduler, the API, and the CLI.
    pub(super) pass_lock: Mutex<()>,
    pub(super) last_pass: Mutex<Option<PassReport>>,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        source: Arc<dyn TabularSource>,
        provider: Option<Arc<dyn Provider>>,
        channel: Arc<dyn Channel>,
        sheets: SheetsConfig,
        composer: Composer,
    ) -> Self {
        Self {
            source,
            provider,
            channel,
            sheets,
            composer,
            detector: ChangeDetector::default(),
            pass_lock: Mutex::new(()),
            last_pass: Mutex::new(None),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.composer.timezone()
    }

    /// Today's civil date in the configured zone.
    pub fn today(&self) -> NaiveDate {
        tasks::today_in(self.timezone())
    }

    /// The forced weekday, else today's weekday in the configured zone.
    pub fn weekday(&self, forced: Option<Weekday>) -> Weekday {
        forced.unwrap_or_else(|| routine::weekday_in(self.timezone()))
    }

    /// Report from the most recent completed pass.
    pub async fn last_pass(&self) -> Option<PassReport> {
        self.last_pass.lock().await.clone()
    }

    /// The task range: explicit, then `<sheet_name>!A2:D`, then the first tab.
    pub async fn task_range(&self) -> Result<String, PlannerError> {
        if let Some(range) = self.sheets.configured_task_range() {
            return Ok(range);
        }
        let title = self
            .source
            .first_sheet_title(&self.sheets.spreadsheet_id)
            .await?
            .ok_or_else(|| {
                PlannerError::Source("spreadsheet has no sheets to read tasks from".to_string())
            })?;
        debug!("gateway: task range from first sheet {title:?}");
        Ok(task_range_for(&title))
    }

    /// Fetch the task sheet and classify it against today.
    pub async fn classified_tasks(&self) -> Result<ClassifiedTasks, PlannerError> {
        let range = self.task_range().await?;
        let rows = self
            .source
            .read_range(&self.sheets.spreadsheet_id, &range)
            .await?;
        let classified = tasks::classify_tasks(&rows, self.today());
        info!(
            "gateway: {} task(s) for today, {} overdue",
            classified.today.len(),
            classified.overdue.len()
        );
        Ok(classified)
    }

    /// Fetch the raw routine grid.
    pub async fn routine_grid(&self) -> Result<Vec<Vec<String>>, PlannerError> {
        self.source
            .read_range(
                self.sheets.routine_spreadsheet_id(),
                &self.sheets.routine_range,
            )
            .await
    }

    /// Classes for the forced weekday, else for today.
    pub async fn todays_classes(
        &self,
        forced: Option<Weekday>,
    ) -> Result<(Weekday, Vec<ClassEntry>), PlannerError> {
        let day = self.weekday(forced);
        let grid = self.routine_grid().await?;
        Ok((day, routine::parse_day_classes(&grid, day)))
    }
}
