//! Provider-written message text, with the composer as fallback.

use super::pass::fallback;
use super::Gateway;
use chrono::Utc;
use planner_core::{
    compose::space_numbered_items, context::Context, dates::format_display_date,
    message::OutgoingMessage, routine::ClassEntry, tasks::TaskRecord,
};
use serde_json::json;
use tracing::{info, warn};

/// Tasks as the prompt shows them, with display dates.
fn task_json(tasks: &[TaskRecord]) -> String {
    let tasks: Vec<_> = tasks
        .iter()
        .map(|t| {
            json!({
                "task": t.task,
                "note": t.note,
                "date": format_display_date(&t.date),
                "status": t.status,
            })
        })
        .collect();
    serde_json::Value::Array(tasks).to_string()
}

pub(super) fn task_prompt(
    name: &str,
    day: &str,
    date: &str,
    today: &[TaskRecord],
    overdue: &[TaskRecord],
) -> String {
    let mut section = format!("Today's tasks:\n{}", task_json(today));
    if !overdue.is_empty() {
        section.push_str(&format!(
            "\n\nOverdue tasks (date has passed but still pending):\n{}",
            task_json(overdue)
        ));
    }

    format!(
        "You are {name}'s personal productivity assistant.\n\n\
         Day: {day}\n\
         Date: {date}\n\n\
         {section}\n\n\
         Each task has these fields: task (name), note (extra details), date (due date), status.\n\n\
         Rules:\n\
         - Address {name} by name.\n\
         - Use the day and date above exactly as given, on separate lines.\n\
         - First list today's tasks with numbers.\n\
         - If there are overdue tasks, list them separately under an \"Overdue\" section with a numbered list and their original due dates.\n\
         - If a task has a note, include it next to the task.\n\
         - End with a short motivational line.\n\
         - Keep it under 300 words.\n\
         - This message is sent on WhatsApp: no markdown, bold, italic, headers, tables or bullet symbols.\n\
         - Use plain text only with numbered lists and line breaks.\n\
         - Write in a warm, formal and professional tone.\n"
    )
}

pub(super) fn routine_prompt(name: &str, day: &str, classes: &[ClassEntry]) -> String {
    let classes = serde_json::to_string(classes).unwrap_or_else(|_| "[]".to_string());
    format!(
        "You are {name}'s personal class schedule assistant.\n\n\
         Today is {day}. Here are {name}'s classes for today:\n\
         {classes}\n\n\
         Each class has: time (slot time) and details (teacher, course code, section, room).\n\n\
         Rules:\n\
         - Address {name} by name.\n\
         - Show today's day.\n\
         - List each class with its time and details in numbered format.\n\
         - Add one blank line after each class item.\n\
         - Keep it concise and under 200 words.\n\
         - This message is sent on WhatsApp: no markdown, bold, italic, headers, tables or bullet symbols.\n\
         - Use plain text only with numbered lists and line breaks.\n\
         - Use a formal and professional tone and avoid casual slang.\n"
    )
}

impl Gateway {
    /// Ask the provider for text; `None` when there is no provider or it fails.
    async fn ask_provider(&self, prompt: String, what: &str) -> Option<OutgoingMessage> {
        let provider = self.provider.as_ref()?;
        info!("gateway: formatting {what} with {}", provider.name());
        match provider.complete(&Context::new(&prompt)).await {
            Ok(msg) => Some(msg),
            Err(e) => {
                warn!("gateway: {what} formatting failed, using plain format: {e}");
                None
            }
        }
    }

    pub(super) async fn format_tasks(
        &self,
        today: &[TaskRecord],
        overdue: &[TaskRecord],
        day: &str,
    ) -> OutgoingMessage {
        let date = Utc::now()
            .with_timezone(&self.timezone())
            .format("%d %b %Y")
            .to_string();
        let prompt = task_prompt(self.composer.recipient_name(), day, &date, today, overdue);

        match self.ask_provider(prompt, "tasks").await {
            Some(msg) => msg,
            None => fallback(self.composer.task_summary(today, overdue)),
        }
    }

    pub(super) async fn format_routine(&self, classes: &[ClassEntry], day: &str) -> OutgoingMessage {
        let prompt = routine_prompt(self.composer.recipient_name(), day, classes);

        match self.ask_provider(prompt, "routine").await {
            Some(mut msg) => {
                msg.text = space_numbered_items(&msg.text);
                msg
            }
            None => fallback(self.composer.routine_summary(day, classes)),
        }
    }
}
