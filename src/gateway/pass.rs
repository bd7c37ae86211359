//! One end-to-end pass: fetch, classify, diff, compose, deliver.

use super::{Gateway, ROUTINE_DATASET};
use chrono::{DateTime, Utc, Weekday};
use planner_core::{
    change::ChangeReport,
    message::OutgoingMessage,
    routine::{self, weekday_name},
};
use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Counts from the task path.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub today: usize,
    pub overdue: usize,
}

/// Counts and change state from the routine path.
#[derive(Debug, Clone, Serialize)]
pub struct RoutineOutcome {
    pub classes: usize,
    pub change: ChangeReport,
}

/// One attempted delivery.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    /// `tasks`, `no_tasks`, `routine_update` or `routine`.
    pub kind: &'static str,
    /// Provider that wrote the text, or `fallback`.
    pub provider_used: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a pass did. A failed path leaves its outcome empty and adds an error.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub weekday: String,
    pub tasks: Option<TaskOutcome>,
    pub routine: Option<RoutineOutcome>,
    pub deliveries: Vec<Delivery>,
    pub errors: Vec<String>,
}

impl PassReport {
    fn new(weekday: Weekday) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            weekday: weekday_name(weekday).to_string(),
            tasks: None,
            routine: None,
            deliveries: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Both paths completed and every message was delivered.
    pub fn success(&self) -> bool {
        self.errors.is_empty() && self.deliveries.iter().all(|d| d.delivered)
    }
}

impl Gateway {
    /// Run one pass. Never fails; problems are recorded in the report.
    ///
    /// Concurrent callers wait for the pass in progress to finish.
    pub async fn run_pass(&self, forced_weekday: Option<Weekday>) -> PassReport {
        let _guard = self.pass_lock.lock().await;

        let weekday = self.weekday(forced_weekday);
        let mut report = PassReport::new(weekday);
        let span = info_span!("pass", id = %report.id);

        async {
            info!("pass: starting for {}", report.weekday);
            self.task_path(weekday, &mut report).await;
            self.routine_path(weekday, &mut report).await;
            report.finished_at = Utc::now();

            if report.success() {
                info!("pass: finished, {} message(s) delivered", report.deliveries.len());
            } else {
                warn!(
                    "pass: finished with {} error(s), {} failed delivery(ies)",
                    report.errors.len(),
                    report.deliveries.iter().filter(|d| !d.delivered).count()
                );
            }
        }
        .instrument(span)
        .await;

        *self.last_pass.lock().await = Some(report.clone());
        report
    }

    async fn task_path(&self, weekday: Weekday, report: &mut PassReport) {
        let classified = match self.classified_tasks().await {
            Ok(c) => c,
            Err(e) => {
                error!("pass: task path aborted: {e}");
                report.errors.push(format!("tasks: {e}"));
                return;
            }
        };

        report.tasks = Some(TaskOutcome {
            today: classified.today.len(),
            overdue: classified.overdue.len(),
        });

        let (kind, message) = if classified.is_empty() {
            info!("pass: no tasks, sending default message");
            ("no_tasks", fallback(self.composer.no_tasks()))
        } else {
            (
                "tasks",
                self.format_tasks(&classified.today, &classified.overdue, weekday_name(weekday))
                    .await,
            )
        };
        self.deliver(kind, message, report).await;
    }

    async fn routine_path(&self, weekday: Weekday, report: &mut PassReport) {
        let grid = match self.routine_grid().await {
            Ok(g) => g,
            Err(e) => {
                error!("pass: routine path aborted: {e}");
                report.errors.push(format!("routine: {e}"));
                return;
            }
        };

        let change = self
            .detector
            .detect(ROUTINE_DATASET, &routine::normalize_grid(&grid));
        let classes = routine::parse_day_classes(&grid, weekday);
        let day = weekday_name(weekday);
        info!(
            "pass: {} class(es) for {day}, routine changed={}",
            classes.len(),
            change.changed
        );

        report.routine = Some(RoutineOutcome {
            classes: classes.len(),
            change: change.clone(),
        });

        if change.changed {
            let text = self
                .composer
                .routine_update_notice(day, &classes, Some(change.updated_at));
            self.deliver("routine_update", fallback(text), report).await;
        }

        if classes.is_empty() {
            info!("pass: no classes for {day}");
        } else {
            let message = self.format_routine(&classes, day).await;
            self.deliver("routine", message, report).await;
        }
    }

    async fn deliver(&self, kind: &'static str, message: OutgoingMessage, report: &mut PassReport) {
        let provider_used = message.metadata.provider_used.clone();
        let result = self.channel.send(message).await;
        if let Err(ref e) = result {
            error!("pass: {kind} delivery via {} failed: {e}", self.channel.name());
        } else {
            info!("pass: {kind} delivered via {}", self.channel.name());
        }
        report.deliveries.push(Delivery {
            kind,
            provider_used,
            delivered: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
        });
    }
}

/// Wrap composer text as a message.
pub(super) fn fallback(text: String) -> OutgoingMessage {
    let mut msg = OutgoingMessage::text(text);
    msg.metadata.provider_used = "fallback".to_string();
    msg
}
