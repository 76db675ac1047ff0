//! One-shot HTTP surface and forwarder tests.

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::http::StatusCode;
use futures_util::future::join_all;
use game_bridge::net::BackendTarget;
use game_bridge::protocol::FrameError;
use game_bridge::relay::{BridgeError, Forwarder};
use serde_json::{json, Value};

mod common;

fn forwarder_for(addr: std::net::SocketAddr) -> Forwarder {
    Forwarder::new(BackendTarget::new(addr.ip().to_string(), addr.port()))
        .with_timeouts(Duration::from_secs(2), Duration::from_secs(2))
}

#[tokio::test]
async fn concurrent_forwards_get_their_own_replies() {
    let (addr, connections) =
        common::start_oneshot_backend(|request| format!(r#"{{"echo":{}}}"#, request)).await;
    let forwarder = forwarder_for(addr);

    let requests: Vec<String> = (0..16).map(|n| json!({ "action": "move", "n": n }).to_string()).collect();
    let replies = join_all(requests.iter().map(|r| forwarder.forward(r))).await;

    for (n, reply) in replies.into_iter().enumerate() {
        let reply: Value = serde_json::from_str(&reply.unwrap()).unwrap();
        assert_eq!(reply, json!({ "echo": { "action": "move", "n": n } }));
    }
    assert_eq!(connections.load(Ordering::SeqCst), 16);
}

#[tokio::test]
async fn forward_returns_first_frame() {
    let (addr, connections) =
        common::start_oneshot_backend(|request| format!(r#"{{"reply":{}}}"#, request)).await;

    let response = forwarder_for(addr)
        .forward(r#"{"action":"signup","username":"ana"}"#)
        .await
        .unwrap();

    assert_eq!(response, r#"{"reply":{"action":"signup","username":"ana"}}"#);
    assert_eq!(connections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn forward_ignores_bytes_after_first_frame() {
    let mut reply = common::frame(r#"{"n":1}"#);
    reply.extend(common::frame(r#"{"n":2}"#));
    reply.extend([0, 0, 0]);
    let addr = common::start_raw_backend(reply).await;

    let response = forwarder_for(addr).forward(r#"{"action":"ping"}"#).await.unwrap();
    assert_eq!(response, r#"{"n":1}"#);
}

#[tokio::test]
async fn forward_to_closed_port_fails_once() {
    let addr = common::unused_addr().await;
    let err = forwarder_for(addr).forward(r#"{"action":"ping"}"#).await.unwrap_err();
    assert!(err.is_connect_failure(), "unexpected error: {err}");
    assert_eq!(err.kind(), "backend_unreachable");
}

#[tokio::test]
async fn forward_reports_incomplete_response() {
    // Declares 16 bytes, delivers 3, then closes.
    let addr = common::start_raw_backend(vec![0, 0, 0, 16, b'{', b'"', b'a']).await;

    let err = forwarder_for(addr).forward(r#"{"action":"ping"}"#).await.unwrap_err();
    match err {
        BridgeError::IncompleteResponse { buffered } => assert_eq!(buffered, 7),
        other => panic!("expected incomplete response, got {other}"),
    }
}

#[tokio::test]
async fn forward_rejects_malformed_payload() {
    let addr = common::start_raw_backend(common::frame("not json")).await;

    let err = forwarder_for(addr).forward(r#"{"action":"ping"}"#).await.unwrap_err();
    assert!(matches!(err, BridgeError::Frame(FrameError::InvalidJson(_))));
}

#[tokio::test]
async fn forward_refuses_oversized_message_without_connecting() {
    let (addr, connections) = common::start_oneshot_backend(|_| "{}".to_string()).await;

    let err = forwarder_for(addr)
        .with_max_frame_size(8)
        .forward(r#"{"action":"signup"}"#)
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Frame(FrameError::TooLarge { .. })));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(connections.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn http_send_relays_backend_response() {
    let (addr, _) = common::start_oneshot_backend(|request| {
        let value: Value = serde_json::from_str(request).unwrap();
        json!({ "status": "created", "user": value["username"] }).to_string()
    })
    .await;
    let bridge = common::start_bridge(common::test_config(addr)).await;

    let client = reqwest::Client::new();
    let res = client
        .post(bridge.http_url("/api/send"))
        .json(&json!({ "message": r#"{"action":"signup","username":"ana"}"# }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    let inner: Value = serde_json::from_str(body["backendResponse"].as_str().unwrap()).unwrap();
    assert_eq!(inner, json!({ "status": "created", "user": "ana" }));

    bridge.shutdown.trigger();
}

#[tokio::test]
async fn http_send_validates_body() {
    let (addr, connections) = common::start_oneshot_backend(|_| "{}".to_string()).await;
    let bridge = common::start_bridge(common::test_config(addr)).await;
    let client = reqwest::Client::new();

    for body in [json!({}), json!({ "message": null }), json!({ "message": "" })] {
        let res = client
            .post(bridge.http_url("/api/send"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Missing message field" }));
    }

    let res = client
        .post(bridge.http_url("/api/send"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid JSON body" }));

    assert_eq!(connections.load(Ordering::SeqCst), 0);
    bridge.shutdown.trigger();
}

#[tokio::test]
async fn http_send_backend_down_is_500() {
    let addr = common::unused_addr().await;
    let bridge = common::start_bridge(common::test_config(addr)).await;

    let res = reqwest::Client::new()
        .post(bridge.http_url("/api/send"))
        .json(&json!({ "message": r#"{"action":"signup"}"# }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("unreachable"));

    bridge.shutdown.trigger();
}

#[tokio::test]
async fn http_send_oversized_message_is_413() {
    let (addr, _) = common::start_oneshot_backend(|_| "{}".to_string()).await;
    let mut config = common::test_config(addr);
    config.limits.max_frame_bytes = 16;
    let bridge = common::start_bridge(config).await;

    let res = reqwest::Client::new()
        .post(bridge.http_url("/api/send"))
        .json(&json!({ "message": r#"{"action":"signup","username":"someone"}"# }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    bridge.shutdown.trigger();
}

#[tokio::test]
async fn http_body_over_limit_is_json_413() {
    let (addr, connections) = common::start_oneshot_backend(|_| "{}".to_string()).await;
    let mut config = common::test_config(addr);
    config.limits.max_body_bytes = 64;
    let bridge = common::start_bridge(config).await;

    let res = reqwest::Client::new()
        .post(bridge.http_url("/api/send"))
        .json(&json!({ "message": "x".repeat(256) }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string(), "got {body}");
    assert_eq!(connections.load(Ordering::SeqCst), 0);
    bridge.shutdown.trigger();
}

#[tokio::test]
async fn health_and_admin_routes() {
    let addr = common::unused_addr().await;
    let mut config = common::test_config(addr);
    config.admin.enabled = true;
    config.admin.api_key = "secret".into();
    let bridge = common::start_bridge(config).await;
    let client = reqwest::Client::new();

    let res = client.get(bridge.http_url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "status": "ok" }));

    let res = client.get(bridge.http_url("/admin/status")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(bridge.http_url("/admin/status"))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let status: Value = res.json().await.unwrap();
    assert_eq!(status["active_sessions"], 0);
    assert_eq!(status["backend"], addr.to_string());

    let res = client
        .get(bridge.http_url("/admin/sessions"))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!([]));

    bridge.shutdown.trigger();
}

#[tokio::test]
async fn admin_hidden_when_disabled() {
    let bridge = common::start_bridge(common::test_config(common::unused_addr().await)).await;

    let res = reqwest::Client::new()
        .get(bridge.http_url("/admin/sessions"))
        .bearer_auth("anything")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    bridge.shutdown.trigger();
}

#[tokio::test]
async fn config_update_retargets_new_requests() {
    let (first, _) = common::start_oneshot_backend(|_| r#"{"from":"first"}"#.to_string()).await;
    let (second, _) = common::start_oneshot_backend(|_| r#"{"from":"second"}"#.to_string()).await;
    let bridge = common::start_bridge(common::test_config(first)).await;
    let client = reqwest::Client::new();

    let send = || {
        client
            .post(bridge.http_url("/api/send"))
            .json(&json!({ "message": r#"{"action":"ping"}"# }))
            .send()
    };

    let body: Value = send().await.unwrap().json().await.unwrap();
    assert_eq!(body["backendResponse"], r#"{"from":"first"}"#);

    bridge.config_tx.send(common::test_config(second)).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let body: Value = send().await.unwrap().json().await.unwrap();
    assert_eq!(body["backendResponse"], r#"{"from":"second"}"#);

    bridge.shutdown.trigger();
}
