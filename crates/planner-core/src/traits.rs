use crate::{context::Context, error::PlannerError, message::OutgoingMessage};
use async_trait::async_trait;

/// Tabular source: where rows come from.
///
/// Returns ordered rows of cell strings for a named A1 range. Rows may be
/// ragged; trailing empty cells are commonly omitted by the backend.
#[async_trait]
pub trait TabularSource: Send + Sync {
    /// Human-readable source name.
    fn name(&self) -> &str;

    /// Read the cells of `range` in `spreadsheet_id`.
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, PlannerError>;

    /// Title of the first sheet tab, if the spreadsheet has any.
    async fn first_sheet_title(&self, spreadsheet_id: &str)
        -> Result<Option<String>, PlannerError>;
}

/// Prose provider: turns a prompt into human-friendly text.
///
/// Callers must always keep a deterministic fallback; a failure here is
/// never fatal.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Send a context to the provider and get generated text back.
    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, PlannerError>;
}

/// Delivery channel: the outbound transport.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Deliver a message. `reply_target: None` uses the configured recipient.
    async fn send(&self, message: OutgoingMessage) -> Result<(), PlannerError>;
}
