use std::io::Write;
use std::sync::{Arc, Mutex};

use docchat_core::{
    resolve_upload, BackendClient, ChatMode, ChatSession, ClientError, FileLimits, Role,
    SelectedFile, TransferState, UploadFailurePolicy, UploadProgress, FALLBACK_ANSWER,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn sample_file(dir: &tempfile::TempDir, name: &str, bytes: usize) -> SelectedFile {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(&vec![b'x'; bytes]).unwrap();
    SelectedFile::from_path(&path, &FileLimits::default()).unwrap()
}

#[tokio::test]
async fn chat_posts_question_and_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({ "question": "What is the refund policy?", "mode": "rag" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "X" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri());
    let answer = client
        .chat("What is the refund policy?", ChatMode::Rag)
        .await
        .unwrap();

    assert_eq!(answer, "X");
}

#[tokio::test]
async fn chat_reads_response_field_when_answer_missing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "from response" })))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri());
    let answer = client.chat("q", ChatMode::FileOnly).await.unwrap();
    assert_eq!(answer, "from response");
}

#[tokio::test]
async fn chat_without_answer_fields_renders_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sources": [] })))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri());
    let mut session = ChatSession::new(ChatMode::Rag);
    let pending = session.begin_send("anything?").unwrap();

    let outcome = client.chat(&pending.question, pending.mode).await;
    assert!(matches!(outcome, Err(ClientError::MissingAnswer)));

    session.settle(pending.request_id, outcome);
    let last = session.messages().last().unwrap();
    assert_eq!(last.role, Role::Error);
    assert_eq!(last.content, FALLBACK_ANSWER);
}

#[tokio::test]
async fn chat_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "answer": "ignored" })))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri());
    match client.chat("q", ChatMode::Rag).await {
        Err(ClientError::Status(status)) => assert_eq!(status.as_u16(), 503),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn chat_non_json_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri());
    assert!(matches!(
        client.chat("q", ChatMode::Rag).await,
        Err(ClientError::Decode(_))
    ));
}

#[tokio::test]
async fn chat_unreachable_backend_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = BackendClient::new(&format!("http://{}", addr));
    assert!(matches!(
        client.chat("q", ChatMode::Rag).await,
        Err(ClientError::Network(_))
    ));
}

#[tokio::test]
async fn upload_sends_multipart_file_field_and_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header_exists("content-type"))
        .and(|req: &Request| {
            let body = String::from_utf8_lossy(&req.body);
            body.contains("name=\"file\"") && body.contains("filename=\"handbook.pdf\"")
        })
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = sample_file(&dir, "handbook.pdf", 200 * 1024);

    let seen: Arc<Mutex<Vec<UploadProgress>>> = Arc::default();
    let sink = seen.clone();
    let client = BackendClient::new(&server.uri());
    client
        .upload(&file, move |p| sink.lock().unwrap().push(p))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.first().map(|p| p.percent()), Some(0));
    assert_eq!(seen.last().map(|p| p.percent()), Some(100));
    assert_eq!(seen.last().map(|p| p.sent), Some(200 * 1024));
    assert!(seen.windows(2).all(|w| w[0].sent <= w[1].sent));
}

#[tokio::test]
async fn upload_server_error_is_masked_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = sample_file(&dir, "notes.txt", 16);
    let client = BackendClient::new(&server.uri());

    let outcome = client.upload(&file, |_| {}).await;
    assert!(matches!(outcome, Err(ClientError::Status(s)) if s.as_u16() == 500));

    assert_eq!(
        resolve_upload(&outcome, UploadFailurePolicy::default()),
        TransferState::Uploaded
    );
    assert!(matches!(
        resolve_upload(&outcome, UploadFailurePolicy::Report),
        TransferState::Failed { .. }
    ));
}
