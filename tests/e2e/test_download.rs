use crate::e2e::helpers;

use helpers::TestContext;
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_serve_narration_as_attachment(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/process-text", &json!({ "text": "Speaker 2: Just me" }))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);

    let audio_url = response.str_field("audioUrl").unwrap();
    let file_name = audio_url.rsplit('/').next().unwrap().to_string();

    let download = ctx
        .client
        .get(&format!("/download/{}", file_name))
        .await
        .unwrap();

    download
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/mpeg")
        .assert_header(
            "content-disposition",
            &format!("attachment; filename=\"{}\"", file_name),
        );
    assert_eq!(download.body_bytes, b"[S: Just me]".to_vec());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_for_unknown_files(ctx: &TestContext) {
    let response = ctx.client.get("/download/narration_missing.mp3").await.unwrap();

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_message("File not found");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refuse_path_traversal(ctx: &TestContext) {
    // A file outside the output directory that must stay unreachable
    let outside = ctx.output_dir().parent().unwrap().join("secret.mp3");
    std::fs::write(&outside, b"secret").unwrap();

    let response = ctx.client.get("/download/..%2Fsecret.mp3").await.unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = ctx.client.get("/download/.hidden.mp3").await.unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);
}
