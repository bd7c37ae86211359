use planner_core::error::PlannerError;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

/// Delays before each retry of a failed send.
pub(crate) const RETRY_DELAYS_MS: [u64; 3] = [500, 1000, 2000];

/// Cloud API limit on a text body.
pub(crate) const MAX_TEXT_LEN: usize = 4096;

/// Request body for a plain text message.
pub(crate) fn text_payload(to: &str, body: &str) -> serde_json::Value {
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "text",
        "text": {
            "preview_url": false,
            "body": body,
        }
    })
}

/// Reduce a phone number in any notation to its digits.
pub(crate) fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Split on newline boundaries into chunks of at most `max_len` bytes.
/// Never cuts inside a UTF-8 character.
pub(crate) fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let break_at = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .map(|i| start + i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }

    chunks
}

/// Strip markdown that WhatsApp would show literally.
///
/// Headers lose their `#` markers, `**bold**` becomes WhatsApp `*bold*`,
/// and `[label](url)` becomes `label (url)`.
pub(crate) fn sanitize_for_whatsapp(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let line = if trimmed.starts_with('#') {
                trimmed.trim_start_matches('#').trim_start()
            } else {
                line
            };
            replace_links(&line.replace("**", "*"))
        })
        .collect();
    let mut out = lines.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn replace_links(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('[') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find("](") else {
            break;
        };
        let after_paren = &after_open[close + 2..];
        let Some(end) = after_paren.find(')') else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&after_open[..close]);
        out.push_str(" (");
        out.push_str(&after_paren[..end]);
        out.push(')');
        rest = &after_paren[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Whether a failed HTTP status is worth retrying.
pub(crate) fn is_retryable(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

/// POST `body`, retrying transport errors, 5xx and 429 with backoff.
/// Other 4xx responses fail immediately.
pub(crate) async fn retry_send(
    client: &reqwest::Client,
    url: &str,
    token: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value, PlannerError> {
    let mut last_err = String::new();

    for attempt in 0..=RETRY_DELAYS_MS.len() {
        if attempt > 0 {
            let delay = RETRY_DELAYS_MS[attempt - 1];
            warn!("whatsapp: send failed ({last_err}), retry {attempt} in {delay}ms");
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let resp = match client.post(url).bearer_auth(token).json(body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                last_err = format!("request failed: {e}");
                continue;
            }
        };

        let status = resp.status();
        if status.is_success() {
            return resp
                .json()
                .await
                .map_err(|e| PlannerError::Channel(format!("whatsapp: bad response body: {e}")));
        }

        let text = resp.text().await.unwrap_or_default();
        last_err = format!("whatsapp returned {status}: {text}");
        if !is_retryable(status) {
            return Err(PlannerError::Channel(last_err));
        }
    }

    Err(PlannerError::Channel(last_err))
}
