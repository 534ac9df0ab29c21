//! End-to-end checks of request shape and response accumulation against a
//! local [`wiremock`][] server standing in for the completion endpoint.
//!
//! [`wiremock`]: https://docs.rs/wiremock

use serde_json::{json, Value};
use sillage::core::chat_stream::{ChatClient, TransportError};
use sillage::core::conversation::ContextPolicy;
use sillage::core::message::Role;
use sillage::core::render::Renderers;
use sillage::core::session::{ChatSession, SessionSettings, StreamOutcome};
use sillage::ui::html::HtmlView;
use sillage::ui::view::{ElementClass, NoticeKind};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "sk-test";

fn sse(deltas: &[Value], done: bool) -> String {
    let mut body = String::new();
    for delta in deltas {
        body.push_str(&format!(
            "data: {}\n\n",
            json!({ "id": "c1", "choices": [{ "index": 0, "delta": delta }] })
        ));
    }
    if done {
        body.push_str("data: [DONE]\n\n");
    }
    body
}

async fn mount_stream(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw(body, "text/event-stream"),
        )
        .mount(server)
        .await;
}

fn session(policy: ContextPolicy) -> ChatSession {
    ChatSession::new(
        SessionSettings {
            model: "deepseek-ai/DeepSeek-R1".to_string(),
            max_tokens: 512,
            policy,
        },
        Renderers::standard(),
    )
}

fn client(server: &MockServer) -> ChatClient {
    ChatClient::new(
        reqwest::Client::new(),
        format!("{}/v1/", server.uri()),
        API_KEY,
    )
}

#[tokio::test]
async fn streams_reasoning_and_content_into_one_turn() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        sse(
            &[
                json!({ "role": "assistant", "content": null, "reasoning_content": "Let me think" }),
                json!({ "content": null, "reasoning_content": " briefly." }),
                json!({ "content": "Use `x = 1`" }),
                json!({ "content": "." }),
                json!({}),
            ],
            true,
        ),
    )
    .await;

    let client = client(&server);
    let mut session = session(ContextPolicy::FullHistory);
    let mut view = HtmlView::new("chat");

    let request = session.submit("How?", &mut view).expect("submit");
    let slot = session.current_slot().expect("slot");
    let body = client.start(&request).await.expect("stream starts");
    let outcome = session
        .consume(body, &mut view, &CancellationToken::new())
        .await;

    assert!(matches!(outcome, StreamOutcome::Completed { committed: true }));
    let turns = session.conversation().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, "Use `x = 1`.");

    let markup = view.slot_markup(slot).expect("slot markup");
    assert!(markup.starts_with("<p>AI:"));
    assert!(markup.contains("&lt;reasoning&gt;"));
    assert!(markup.contains("Let me think briefly."));
    assert!(markup.contains("<code>x = 1</code>"));

    let received = server.received_requests().await.expect("recording on");
    assert_eq!(received.len(), 1);
    let request = &received[0];
    assert_eq!(
        request
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    let body: Value = request.body_json().expect("json body");
    assert_eq!(
        body,
        json!({
            "model": "deepseek-ai/DeepSeek-R1",
            "messages": [{ "role": "user", "content": "How?" }],
            "stream": true,
            "max_tokens": 512
        })
    );
}

#[tokio::test]
async fn second_request_carries_the_history() {
    let server = MockServer::start().await;
    mount_stream(&server, sse(&[json!({ "content": "Hi!" })], true)).await;

    let client = client(&server);
    let mut session = session(ContextPolicy::FullHistory);
    let mut view = HtmlView::new("chat");

    for text in ["Hello", "And again"] {
        let request = session.submit(text, &mut view).expect("submit");
        let body = client.start(&request).await.expect("stream starts");
        session
            .consume(body, &mut view, &CancellationToken::new())
            .await;
    }

    let received = server.received_requests().await.expect("recording on");
    let body: Value = received[1].body_json().expect("json body");
    let roles: Vec<&str> = body["messages"]
        .as_array()
        .expect("messages")
        .iter()
        .filter_map(|m| m["role"].as_str())
        .collect();
    assert_eq!(roles, ["user", "assistant", "user"]);
    assert_eq!(body["messages"][1]["content"], "Hi!");
    assert_eq!(session.conversation().len(), 4);
}

#[tokio::test]
async fn error_status_is_reported_and_commits_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Invalid token", "type": "auth_error" }
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let mut session = session(ContextPolicy::FullHistory);
    let mut view = HtmlView::new("chat");

    let request = session.submit("Hello", &mut view).expect("submit");
    let err = match client.start(&request).await {
        Ok(_) => panic!("401 should not start a stream"),
        Err(err) => err,
    };
    match &err {
        TransportError::Status { status, message } => {
            assert_eq!(status.as_u16(), 401);
            assert!(message.starts_with("API Error: Invalid token"), "{message}");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    session.fail(&err, &mut view);
    assert_eq!(session.conversation().len(), 1);
    assert_eq!(session.current_slot(), None);
    let notice = view.elements().last().expect("notice");
    assert_eq!(notice.class, ElementClass::Notice(NoticeKind::Error));
    assert!(notice.markup.contains("Invalid token"));
}

#[tokio::test]
async fn body_ending_without_done_keeps_partial_reply() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        sse(&[json!({ "content": "Partial " }), json!({ "content": "reply" })], false),
    )
    .await;

    let client = client(&server);
    let mut session = session(ContextPolicy::SingleTurn);
    let mut view = HtmlView::new("chat");

    let request = session.submit("Go", &mut view).expect("submit");
    let body = client.start(&request).await.expect("stream starts");
    let outcome = session
        .consume(body, &mut view, &CancellationToken::new())
        .await;

    assert!(matches!(outcome, StreamOutcome::Ended { committed: true }));
    assert_eq!(
        session.conversation().last().expect("turn").content,
        "Partial reply"
    );
}
