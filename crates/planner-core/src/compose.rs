//! Plain-text notification builders.
//!
//! These are the deterministic fallbacks used whenever the prose provider is
//! unavailable or fails. Output is plain text (the delivery channel does not
//! render markdown).

use crate::dates::format_display_date;
use crate::routine::ClassEntry;
use crate::tasks::TaskRecord;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Renders messages addressed to one recipient in one timezone.
#[derive(Debug, Clone)]
pub struct Composer {
    recipient_name: String,
    timezone: Tz,
}

impl Composer {
    pub fn new(recipient_name: impl Into<String>, timezone: Tz) -> Self {
        Self {
            recipient_name: recipient_name.into(),
            timezone,
        }
    }

    pub fn recipient_name(&self) -> &str {
        &self.recipient_name
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Today's tasks, then overdue tasks when there are any.
    pub fn task_summary(&self, today: &[TaskRecord], overdue: &[TaskRecord]) -> String {
        let lines: Vec<String> = today
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{}. {}{}", i + 1, t.task, note_suffix(&t.note)))
            .collect();
        let mut msg = format!("Your tasks for today:\n\n{}", lines.join("\n"));

        if !overdue.is_empty() {
            let lines: Vec<String> = overdue
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    format!(
                        "{}. {} (was due {}){}",
                        i + 1,
                        t.task,
                        format_display_date(&t.date),
                        note_suffix(&t.note)
                    )
                })
                .collect();
            msg.push_str(&format!("\n\nOverdue tasks:\n{}", lines.join("\n")));
        }

        msg.push_str("\n\nStay focused and productive!");
        msg
    }

    pub fn no_tasks(&self) -> String {
        format!("Hello {} there are no task today", self.recipient_name)
    }

    /// Notice sent when the routine sheet's content changed.
    pub fn routine_update_notice(
        &self,
        day: &str,
        classes: &[ClassEntry],
        updated_at: Option<DateTime<Utc>>,
    ) -> String {
        let day = match day.trim() {
            "" => "today",
            d => d,
        };
        let updated_line = updated_at
            .map(|t| {
                format!(
                    "Updated at: {} ({})\n",
                    self.format_update_time(t),
                    self.timezone.name()
                )
            })
            .unwrap_or_default();
        let head = format!(
            "Dear {},\n\nYour class routine has been updated by your university.\n\nDay: {day}\n{updated_line}",
            self.recipient_name
        );

        if classes.is_empty() {
            return format!(
                "{head}Classes: No classes scheduled for this day.\n\n\
                 Please review the latest routine sheet for details.\n\nBest regards."
            );
        }

        format!(
            "{head}Updated class schedule:\n{}\n\nPlease follow this updated timing.\n\nBest regards.",
            numbered_classes(classes).join("\n")
        )
    }

    /// Daily class listing.
    pub fn routine_summary(&self, day: &str, classes: &[ClassEntry]) -> String {
        format!(
            "Dear {},\n\nYour classes for {day}:\n\n{}\n\nWishing you a productive day.\n\nBest regards.",
            self.recipient_name,
            numbered_classes(classes).join("\n\n")
        )
    }

    /// `20 Feb 2026, 08:00 am` in the composer's timezone.
    pub fn format_update_time(&self, t: DateTime<Utc>) -> String {
        t.with_timezone(&self.timezone)
            .format("%d %b %Y, %I:%M %P")
            .to_string()
    }
}

fn note_suffix(note: &str) -> String {
    if note.is_empty() {
        String::new()
    } else {
        format!(" - {note}")
    }
}

fn numbered_classes(classes: &[ClassEntry]) -> Vec<String> {
    classes
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {} - {}", i + 1, c.slot_label, c.details))
        .collect()
}

/// Insert one blank line between consecutive numbered lines (`1. ...`).
///
/// Only applies between two numbered lines; text around the list is left
/// untouched. Line endings are normalized to `\n`.
pub fn space_numbered_items(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = String::with_capacity(text.len() + lines.len());

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            if is_numbered(lines[i - 1]) && is_numbered(line) {
                out.push('\n');
            }
        }
        out.push_str(line);
    }
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn is_numbered(line: &str) -> bool {
    let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
    digits > 0 && line.as_bytes().get(digits) == Some(&b'.')
}
