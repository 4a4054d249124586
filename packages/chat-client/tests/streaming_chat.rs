use chat_client::{
    Accumulator, Callbacks, ChatClientError, ChatHandler, ChatRequest, Message, SessionOutcome,
    StreamingChatClient,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HELLO_STREAM: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
data: [DONE]\n\n";

/// Records every callback in order.
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl ChatHandler for Recorder {
    fn on_delta(&mut self, text: &str) {
        self.events.push(format!("delta:{text}"));
    }

    fn on_done(&mut self) {
        self.events.push("done".into());
    }

    fn on_error(&mut self, message: &str) {
        self.events.push(format!("error:{message}"));
    }
}

async fn chat_server(response: ResponseTemplate) -> (MockServer, StreamingChatClient) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/workflow-chat"))
        .respond_with(response)
        .mount(&server)
        .await;
    let client = StreamingChatClient::new(format!("{}/functions/v1/workflow-chat", server.uri()));
    (server, client)
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

fn hi() -> ChatRequest {
    ChatRequest::new(vec![Message::user("Hi")])
}

#[tokio::test]
async fn test_end_to_end_hello() {
    let (_server, client) = chat_server(sse(HELLO_STREAM)).await;

    let mut recorder = Recorder::default();
    let outcome = client.stream_chat(&hi(), &mut recorder).await;

    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(recorder.events, vec!["delta:Hel", "delta:lo", "done"]);
}

#[tokio::test]
async fn test_closure_callbacks_accumulate() {
    let (_server, client) = chat_server(sse(HELLO_STREAM)).await;

    let mut text = String::new();
    let mut done = 0;
    let mut errors = 0;
    client
        .stream_chat(
            &hi(),
            &mut Callbacks::new(|t| text.push_str(t), || done += 1, |_| errors += 1),
        )
        .await;

    assert_eq!(text, "Hello");
    assert_eq!((done, errors), (1, 0));
}

#[tokio::test]
async fn test_request_body_and_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("authorization", "Bearer anon-key"))
        .and(body_json(json!({
            "messages": [{"role": "user", "content": "Hi"}],
            "systemPrompt": "Be brief",
            "model": "google/gemini-2.5-flash",
            "documentIds": ["d1"],
        })))
        .respond_with(sse(HELLO_STREAM))
        .expect(1)
        .mount(&server)
        .await;

    let client = StreamingChatClient::new(format!("{}/chat", server.uri())).with_api_key("anon-key");
    let request = hi()
        .system_prompt("Be brief")
        .model("google/gemini-2.5-flash")
        .document_ids(["d1"]);

    assert_eq!(client.complete(&request).await.unwrap(), "Hello");
}

#[tokio::test]
async fn test_rate_limited() {
    let (_server, client) = chat_server(
        ResponseTemplate::new(429).set_body_json(json!({"error": "Rate limits exceeded"})),
    )
    .await;

    let mut recorder = Recorder::default();
    client.stream_chat(&hi(), &mut recorder).await;

    assert_eq!(
        recorder.events,
        vec!["error:Rate limit exceeded. Please try again later."]
    );
}

#[tokio::test]
async fn test_payment_required() {
    let (_server, client) = chat_server(ResponseTemplate::new(402)).await;

    let mut recorder = Recorder::default();
    let outcome = client.stream_chat(&hi(), &mut recorder).await;

    assert_eq!(
        outcome,
        SessionOutcome::Failed("Payment required. Please add credits.".into())
    );
    assert_eq!(recorder.events.len(), 1);
}

#[tokio::test]
async fn test_other_failure_is_generic() {
    let (_server, client) = chat_server(
        ResponseTemplate::new(500).set_body_json(json!({"error": "AI gateway error"})),
    )
    .await;

    let mut recorder = Recorder::default();
    client.stream_chat(&hi(), &mut recorder).await;
    assert_eq!(recorder.events, vec!["error:Failed to start chat stream"]);

    assert_eq!(
        client.complete(&hi()).await,
        Err(ChatClientError::StreamUnavailable)
    );
}

#[tokio::test]
async fn test_done_before_close_drains_cleanly() {
    let body = format!(
        "{HELLO_STREAM}data: {{\"choices\":[{{\"delta\":{{\"content\":\"after\"}}}}]}}\n\n: trailing noise\n"
    );
    let (_server, client) = chat_server(sse(&body)).await;

    let mut acc = Accumulator::default();
    client.stream_chat(&hi(), &mut acc).await;

    assert_eq!(acc.text, "Hello");
    assert_eq!(acc.deltas, 2);
    assert_eq!(acc.outcome, Some(SessionOutcome::Completed));
}

#[tokio::test]
async fn test_empty_delta_frames_do_not_abort() {
    let body = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n\
data: [DONE]\n\n";
    let (_server, client) = chat_server(sse(body)).await;

    let mut recorder = Recorder::default();
    client.stream_chat(&hi(), &mut recorder).await;
    assert_eq!(recorder.events, vec!["delta:ok", "done"]);
}

#[tokio::test]
async fn test_stream_without_done_still_completes() {
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}";
    let (_server, client) = chat_server(sse(body)).await;

    let mut recorder = Recorder::default();
    client.stream_chat(&hi(), &mut recorder).await;
    assert_eq!(recorder.events, vec!["delta:partial", "done"]);
}

#[tokio::test]
async fn test_transport_failure_reports_once() {
    // Nothing listens on the discard port.
    let client = StreamingChatClient::new("http://127.0.0.1:9/functions/v1/workflow-chat");

    let mut recorder = Recorder::default();
    let outcome = client.stream_chat(&hi(), &mut recorder).await;

    assert_eq!(recorder.events.len(), 1);
    assert!(recorder.events[0].starts_with("error:"));
    assert!(matches!(outcome, SessionOutcome::Failed(message) if !message.is_empty()));
}
