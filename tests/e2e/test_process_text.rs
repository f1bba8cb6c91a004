use crate::e2e::helpers;

use dialogcast_backend::domain::dialogue::{DegradationLevel, SpeakerCode};
use helpers::TestContext;
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_narrate_a_short_dialogue(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            "/process-text",
            &json!({ "text": "Speaker 1: Hello there\nSpeaker 2: Hi!" }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);

    let audio_url = response.str_field("audioUrl").expect("Missing audioUrl");
    let expected_prefix = format!("{}/download/narration_", ctx.client.base_url());
    assert!(
        audio_url.starts_with(&expected_prefix),
        "unexpected audio url: {}",
        audio_url
    );

    let logs = response.str_field("logs").expect("Missing logs");
    assert!(logs.contains("Parsed 2 turns"));
    assert!(logs.contains("Split input into 1 chunks"));
    assert!(logs.contains("Audio concatenation successful."));

    // One provider request carrying both speakers in order
    let requests = ctx.tts.requests();
    assert_eq!(requests.len(), 1);
    let speakers: Vec<SpeakerCode> = requests[0].turns().iter().map(|t| t.speaker).collect();
    assert_eq!(speakers, vec![SpeakerCode::R, SpeakerCode::S]);

    // The link serves the narration
    let path = audio_url.trim_start_matches(ctx.client.base_url());
    let download = ctx.client.get(path).await.unwrap();
    download.assert_status(StatusCode::OK);
    assert_eq!(
        String::from_utf8(download.body_bytes.clone()).unwrap(),
        "[R: Hello there\nS: Hi!]"
    );

    assert!(ctx.scratch_entries().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_dialogue_order_across_chunks(ctx: &TestContext) {
    let script = (1..=7)
        .map(|i| format!("Speaker {}: Line number {}", (i - 1) % 2 + 1, i))
        .collect::<Vec<_>>()
        .join("\n");

    let response = ctx
        .client
        .post("/process-text", &json!({ "text": script }))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);

    // Three turns per request at most
    let requests = ctx.tts.requests();
    assert_eq!(
        requests.iter().map(|b| b.len()).collect::<Vec<_>>(),
        vec![3, 3, 1]
    );

    let audio_url = response.str_field("audioUrl").unwrap();
    let path = audio_url.trim_start_matches(ctx.client.base_url());
    let narration = String::from_utf8(ctx.client.get(path).await.unwrap().body_bytes).unwrap();
    let positions: Vec<usize> = (1..=7)
        .map(|i| narration.find(&format!("Line number {}", i)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_recover_from_rejections_by_degrading(ctx: &TestContext) {
    ctx.tts.reject_next(2);

    let response = ctx
        .client
        .post("/process-text", &json!({ "text": "Speaker 1: Hello, world!" }))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);

    let requests = ctx.tts.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].level(), DegradationLevel::SingleTurnSplit);
    assert_eq!(requests[2].turns()[0].text, "Hello world");

    let logs = response.str_field("logs").unwrap();
    assert!(logs.contains("Retry 1 for chunk 1 failed"));
    assert!(logs.contains("degraded from original to punctuation_stripped"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fail_with_logs_when_a_chunk_is_exhausted(ctx: &TestContext) {
    ctx.tts.reject_containing("doomed");

    let response = ctx
        .client
        .post(
            "/process-text",
            &json!({ "text": "Speaker 1: Fine line\nSpeaker 2: A doomed line" }),
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_error_message("failed to synthesize chunk 1");

    let logs = response.str_field("logs").expect("Missing logs");
    assert!(logs.contains("Retry 3 for chunk 1 failed"));
    assert!(logs.contains("Narration failed"));

    assert!(ctx.scratch_entries().is_empty());
    assert!(ctx.output_entries().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_empty_text(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/process-text", &json!({ "text": "   " }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("No valid text input provided.");
    assert!(response.str_field("logs").is_some());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_missing_text_field(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/process-text", &json!({}))
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(ctx.tts.requests().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_answer_malformed_json_with_message_and_logs(ctx: &TestContext) {
    let response = ctx
        .client
        .post_raw("/process-text", "application/json", "{\"text\": ")
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Invalid request body");
    let logs = response.str_field("logs").expect("Missing logs");
    assert!(logs.contains("Invalid request body"));
    assert!(ctx.tts.requests().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_answer_non_json_body_with_message_and_logs(ctx: &TestContext) {
    let response = ctx
        .client
        .post_raw("/process-text", "text/plain", "Speaker 1: Hello")
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Invalid request body");
    assert!(response.str_field("logs").is_some());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_text_without_dialogue(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            "/process-text",
            &json!({ "text": "Once upon a time.\nNobody spoke." }),
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("no valid dialogue structure");

    let logs = response.str_field("logs").unwrap();
    assert!(logs.contains("no speaker label"));
    assert!(ctx.tts.requests().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_oversized_text(ctx: &TestContext) {
    let text = format!("Speaker 1: {}", "a".repeat(ctx.config.max_input_chars));

    let response = ctx
        .client
        .post("/process-text", &json!({ "text": text }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE)
        .assert_error_message("characters or less");
    assert!(ctx.tts.requests().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_responses(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/process-text", &json!({ "text": "" }))
        .await
        .unwrap();

    response.assert_header_exists("x-request-id");
}
