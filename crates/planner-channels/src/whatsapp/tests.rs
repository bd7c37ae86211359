use super::send::{
    digits_only, is_retryable, sanitize_for_whatsapp, split_message, text_payload,
    RETRY_DELAYS_MS,
};
use super::WhatsAppChannel;
use planner_core::{config::WhatsAppConfig, message::OutgoingMessage, traits::Channel};
use std::time::Duration;

fn channel(recipient: &str) -> WhatsAppChannel {
    WhatsAppChannel::new(
        WhatsAppConfig {
            phone_number_id: "10001".into(),
            access_token: "tok".into(),
            recipient: recipient.into(),
            ..Default::default()
        },
        Duration::from_secs(5),
    )
    .unwrap()
}

#[test]
fn test_split_short_message() {
    let chunks = split_message("hello", 4096);
    assert_eq!(chunks, vec!["hello"]);
}

#[test]
fn test_split_long_message() {
    let text = "line of text\n".repeat(500);
    let chunks = split_message(&text, 4096);
    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.len() <= 4096);
        assert!(chunk.ends_with('\n'), "breaks on newline boundaries");
    }
    assert_eq!(chunks.concat(), text);
}

#[test]
fn test_split_respects_char_boundaries() {
    let text = "é".repeat(3000);
    let chunks = split_message(&text, 4095);
    assert_eq!(chunks.concat(), text);
    assert!(chunks.iter().all(|c| c.len() <= 4095));
}

#[test]
fn test_text_payload_shape() {
    let body = text_payload("8801700000000", "Hi");
    assert_eq!(body["messaging_product"], "whatsapp");
    assert_eq!(body["recipient_type"], "individual");
    assert_eq!(body["to"], "8801700000000");
    assert_eq!(body["type"], "text");
    assert_eq!(body["text"]["preview_url"], false);
    assert_eq!(body["text"]["body"], "Hi");
}

#[test]
fn test_digits_only() {
    assert_eq!(digits_only("+880 1700-000000"), "8801700000000");
    assert_eq!(digits_only("(555) 010 9999"), "5550109999");
    assert_eq!(digits_only("none"), "");
}

#[test]
fn test_sanitize_headers_and_bold() {
    assert_eq!(sanitize_for_whatsapp("## Today"), "Today");
    assert_eq!(
        sanitize_for_whatsapp("this is **bold** text"),
        "this is *bold* text"
    );
}

#[test]
fn test_sanitize_links() {
    assert_eq!(
        sanitize_for_whatsapp("see [the sheet](https://example.com/s) now"),
        "see the sheet (https://example.com/s) now"
    );
    assert_eq!(sanitize_for_whatsapp("array[0] stays"), "array[0] stays");
}

#[test]
fn test_sanitize_preserves_plain_text() {
    let text = "Dear Ziban,\n\n1. Slot 1 > 9:00 - CSE101\n\n2. Slot 2 > 10:00 - MAT201\n";
    assert_eq!(sanitize_for_whatsapp(text), text);
}

#[test]
fn test_retry_delays_exponential() {
    assert_eq!(RETRY_DELAYS_MS.len(), 3, "should have 3 retry attempts");
    assert_eq!(RETRY_DELAYS_MS[0], 500, "first delay 500ms");
    assert_eq!(RETRY_DELAYS_MS[1], RETRY_DELAYS_MS[0] * 2);
    assert_eq!(RETRY_DELAYS_MS[2], RETRY_DELAYS_MS[1] * 2);
}

#[test]
fn test_retryable_statuses() {
    assert!(is_retryable(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
    assert!(is_retryable(reqwest::StatusCode::TOO_MANY_REQUESTS));
    assert!(!is_retryable(reqwest::StatusCode::UNAUTHORIZED));
    assert!(!is_retryable(reqwest::StatusCode::BAD_REQUEST));
}

#[test]
fn test_messages_url() {
    let ch = channel("123").with_base_url("http://localhost:9999/");
    assert_eq!(ch.messages_url(), "http://localhost:9999/v21.0/10001/messages");
    assert_eq!(
        channel("123").messages_url(),
        "https://graph.facebook.com/v21.0/10001/messages"
    );
}

#[test]
fn test_recipient_resolution() {
    let ch = channel("+880 1700-000000");
    let msg = OutgoingMessage::text("hi");
    assert_eq!(ch.recipient_for(&msg).unwrap(), "8801700000000");

    let msg = OutgoingMessage {
        reply_target: Some("+1 555 0100".into()),
        ..OutgoingMessage::text("hi")
    };
    assert_eq!(ch.recipient_for(&msg).unwrap(), "15550100");
}

#[tokio::test]
async fn test_send_without_recipient_fails_before_network() {
    let ch = channel("");
    let err = ch.send(OutgoingMessage::text("hi")).await.unwrap_err();
    assert!(err.to_string().contains("no recipient"));
}

#[tokio::test]
async fn test_send_without_token_fails_before_network() {
    let ch = WhatsAppChannel::new(
        WhatsAppConfig {
            phone_number_id: "10001".into(),
            recipient: "123".into(),
            ..Default::default()
        },
        Duration::from_secs(5),
    )
    .unwrap();
    let err = ch.send(OutgoingMessage::text("hi")).await.unwrap_err();
    assert!(err.to_string().contains("access token"));
}
