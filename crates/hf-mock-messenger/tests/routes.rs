// SPDX-License-Identifier: MIT OR Apache-2.0
use axum::body::Body;
use axum::http::{Request, StatusCode};
use hf_mock_messenger::{
    FibiScript, MockState, OutboundEvent, RunningMock, Silent, WELCOME, build_app,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn silent_state() -> Arc<MockState> {
    Arc::new(MockState::new(Arc::new(Silent)))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn send_body(text: &str) -> Value {
    json!({
        "to": "+1337",
        "message": text,
        "timestamp": 1_700_000_000,
        "source": "+100",
        "sourceUuid": "u-1",
        "sourceName": "Ann",
        "sourceDevice": 1
    })
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn send_is_recorded_and_created() {
    let state = silent_state();
    let app = build_app(state.clone(), "/signal/api/v1");
    let resp = app
        .oneshot(post_json("/signal/api/v1/send", send_body("Hello")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["message"], "success");
    let sends = state.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].message, "Hello");
    assert_eq!(sends[0].source_uuid, "u-1");
}

#[tokio::test]
async fn send_without_source_uuid_is_rejected() {
    let state = silent_state();
    let app = build_app(state.clone(), "/signal/api/v1");
    let resp = app
        .oneshot(post_json(
            "/signal/api/v1/send",
            json!({ "source": "+100", "message": "Hello" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].as_str().unwrap().contains("sourceUuid"));
    assert!(state.sends().is_empty());
}

#[tokio::test]
async fn react_is_recorded() {
    let state = silent_state();
    let app = build_app(state.clone(), "/signal/api/v1");
    let resp = app
        .oneshot(post_json(
            "/signal/api/v1/react",
            json!({
                "to": "+1337",
                "from": "+100",
                "reaction": { "emoji": "👍", "targetAuthor": "fibi", "targetSentTimestamp": 3 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "reaction received");
    assert_eq!(state.reactions()[0].reaction.target_sent_timestamp, 3);
}

#[tokio::test]
async fn incomplete_reaction_is_rejected() {
    let app = build_app(silent_state(), "/signal/api/v1");
    let resp = app
        .oneshot(post_json("/signal/api/v1/react", json!({ "to": "+1337" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_prefix_is_not_found() {
    let app = build_app(silent_state(), "/signal/api/v1");
    let resp = app
        .oneshot(post_json("/send", send_body("Hello")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn event_stream_carries_emitted_events() {
    let state = silent_state();
    let app = build_app(state.clone(), "");
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/all_events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    assert_eq!(state.subscribers(), 1);

    state.emit(OutboundEvent::Send {
        to: "+100".into(),
        message: "Hi".into(),
        timestamp: 1,
    });
    let mut body = resp.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains("event: send"));
    assert!(text.contains(r#""message":"Hi""#));
}

#[tokio::test]
async fn disconnect_ends_open_streams() {
    let state = silent_state();
    let app = build_app(state.clone(), "");
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/all_events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    state.disconnect_all();
    let collected = tokio::time::timeout(Duration::from_secs(5), resp.into_body().collect()).await;
    assert!(collected.is_ok(), "stream should end after disconnect");
}

#[tokio::test]
async fn scripted_replies_reach_subscribers() {
    let script = FibiScript::new().with_reply_delay(Duration::from_millis(10));
    let state = Arc::new(MockState::new(Arc::new(script)));
    let app = build_app(state.clone(), "/signal/api/v1");
    let events = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/signal/api/v1/all_events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    app.oneshot(post_json("/signal/api/v1/send", send_body("Hello")))
        .await
        .unwrap();

    let mut body = events.into_body();
    let mut seen = String::new();
    while !seen.contains("I’m Fibi") {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Ok(data) = frame.into_data() {
            seen.push_str(&String::from_utf8_lossy(&data));
        }
    }
    assert!(seen.contains("event: sendReceipt"));
    assert!(seen.contains(r#""timestamps":[1700000000]"#));
    assert!(WELCOME.starts_with("Hello! I’m Fibi"));
}

#[tokio::test]
async fn running_mock_binds_a_local_port() {
    let mock = RunningMock::start(Arc::new(Silent)).await.unwrap();
    assert_eq!(
        mock.base_url(),
        format!("http://{}/signal/api/v1", mock.addr())
    );
    assert_eq!(mock.subscribers(), 0);
    assert_eq!(mock.emit_send("+100", "nobody listens"), 0);
    mock.shutdown().await;
}
