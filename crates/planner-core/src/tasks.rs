//! Task list classification.
//!
//! Rows come from a four-column sheet: task, note, due date, status.
//! Only `pending` rows with a parseable due date take part; everything else
//! is silently skipped.

use crate::dates::parse_sheet_date;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};

/// Status value that marks a task as still open.
pub const PENDING_STATUS: &str = "pending";

/// One task row as it appears in the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task: String,
    pub note: String,
    /// Raw due-date cell, unnormalized.
    pub date: String,
    pub status: String,
}

impl TaskRecord {
    /// Build from a (possibly short) row; missing cells become empty strings.
    pub fn from_row(row: &[String]) -> Self {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        Self {
            task: cell(0),
            note: cell(1),
            date: cell(2),
            status: cell(3),
        }
    }

    /// Whether the status cell reads `pending` (trimmed, any case).
    pub fn is_pending(&self) -> bool {
        normalize_status(&self.status) == PENDING_STATUS
    }
}

/// A task together with its canonical due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedTask {
    #[serde(flatten)]
    pub record: TaskRecord,
    /// `None` when the date cell is absent or unparseable.
    #[serde(serialize_with = "serialize_canonical_date")]
    pub canonical_date: Option<NaiveDate>,
}

impl NormalizedTask {
    pub fn new(record: TaskRecord) -> Self {
        let canonical_date = parse_sheet_date(&record.date);
        Self {
            record,
            canonical_date,
        }
    }
}

fn serialize_canonical_date<S: Serializer>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
        None => serializer.serialize_str(""),
    }
}

/// Pending tasks split by due date relative to a reference day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedTasks {
    pub today: Vec<TaskRecord>,
    pub overdue: Vec<TaskRecord>,
}

impl ClassifiedTasks {
    pub fn is_empty(&self) -> bool {
        self.today.is_empty() && self.overdue.is_empty()
    }
}

/// Trim and lowercase a status cell.
pub fn normalize_status(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// The civil date right now in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Partition raw rows into today-pending and overdue-pending, keeping row order.
pub fn classify_tasks(rows: &[Vec<String>], today: NaiveDate) -> ClassifiedTasks {
    let mut out = ClassifiedTasks::default();

    for row in rows {
        let task = NormalizedTask::new(TaskRecord::from_row(row));
        if !task.record.is_pending() {
            continue;
        }
        match task.canonical_date {
            Some(due) if due == today => out.today.push(task.record),
            Some(due) if due < today => out.overdue.push(task.record),
            _ => {}
        }
    }

    out
}
