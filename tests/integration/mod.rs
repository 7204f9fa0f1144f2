//! Integration tests for the contact relay.
//!
//! Each test drives the full router with `tower::ServiceExt::oneshot` and
//! points the relay at a local mockito server standing in for the upstream.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use mockito::{Matcher, Mock, Server, ServerGuard};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use contact_relay::api::{create_router, AppState};
use contact_relay::config::Config;
use contact_relay::upstream::API_KEY_HEADER;

const API_KEY: &str = "test-api-key";
const UPSTREAM_PATH: &str = "/prod/contact";

fn config_for(server: &ServerGuard) -> Config {
    Config::for_upstream(format!("{}{}", server.url(), UPSTREAM_PATH), API_KEY)
}

fn relay(config: &Config) -> Router {
    create_router(AppState::new(config).expect("app state"))
}

async fn post_json(app: Router, path: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).expect("relay always answers with JSON");
    (status, value)
}

/// Upstream mock that must never be called.
async fn untouched_upstream(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", UPSTREAM_PATH)
        .expect(0)
        .create_async()
        .await
}

#[tokio::test]
async fn forwards_escaped_submission_with_secret_header() {
    let mut server = Server::new_async().await;
    let upstream = server
        .mock("POST", UPSTREAM_PATH)
        .match_header(API_KEY_HEADER, API_KEY)
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "name": "Jo&lt;e&gt;",
            "email": "a@b.com",
            "phone": "1234567890",
            "message": "hi"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"messageId":"abc-123"}"#)
        .expect(1)
        .create_async()
        .await;

    let app = relay(&config_for(&server));
    let (status, body) = post_json(
        app,
        "/api/contact",
        r#"{"name":"Jo<e>","email":"a@b.com","phone":"1234567890","message":"hi"}"#,
    )
    .await;

    upstream.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "response": {"messageId": "abc-123"}})
    );
}

#[tokio::test]
async fn never_forwards_raw_markup() {
    let mut server = Server::new_async().await;
    let upstream = server
        .mock("POST", UPSTREAM_PATH)
        .match_body(Matcher::Json(json!({
            "name": "&quot;Tom&quot; &amp; &#039;Jerry&#039;",
            "email": "&lt;script&gt;@x.io",
            "phone": "&lt;b&gt;",
            "message": "a &lt; b &amp;&amp; c &gt; d"
        })))
        .with_status(200)
        .with_body("stored")
        .expect(1)
        .create_async()
        .await;

    let submission = json!({
        "name": "\"Tom\" & 'Jerry'",
        "email": "<script>@x.io",
        "phone": "<b>",
        "message": "a < b && c > d"
    });
    let (status, body) = post_json(
        relay(&config_for(&server)),
        "/api/contact",
        submission.to_string(),
    )
    .await;

    upstream.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "response": "stored"}));
}

#[tokio::test]
async fn empty_object_is_rejected_without_upstream_call() {
    let mut server = Server::new_async().await;
    let upstream = untouched_upstream(&mut server).await;

    let (status, body) = post_json(relay(&config_for(&server)), "/api/contact", "{}").await;

    upstream.assert_async().await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "message": "Invalid input"}));
}

#[tokio::test]
async fn each_missing_field_is_rejected() {
    let complete = json!({
        "name": "Jo",
        "email": "a@b.com",
        "phone": "1234567890",
        "message": "hi"
    });

    for field in ["name", "email", "phone", "message"] {
        let mut server = Server::new_async().await;
        let upstream = untouched_upstream(&mut server).await;

        let mut partial = complete.clone();
        partial.as_object_mut().unwrap().remove(field);

        let (status, body) = post_json(
            relay(&config_for(&server)),
            "/api/contact",
            partial.to_string(),
        )
        .await;

        upstream.assert_async().await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {field}");
        assert_eq!(body, json!({"success": false, "message": "Invalid input"}));
    }
}

#[tokio::test]
async fn unparsable_body_is_rejected() {
    let mut server = Server::new_async().await;
    let upstream = untouched_upstream(&mut server).await;

    for raw in ["", "name=Jo&email=a@b.com", "[1,2,3]", "{\"name\":"] {
        let (status, body) = post_json(relay(&config_for(&server)), "/api/contact", raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {raw:?}");
        assert_eq!(body["success"], json!(false));
    }

    upstream.assert_async().await;
}

#[tokio::test]
async fn oversized_body_is_rejected_with_json_envelope() {
    let mut server = Server::new_async().await;
    let upstream = untouched_upstream(&mut server).await;

    let mut config = config_for(&server);
    config.max_body_bytes = 1024;

    let submission = json!({
        "name": "Jo",
        "email": "a@b.com",
        "phone": "1234567890",
        "message": "x".repeat(4096)
    });
    let (status, body) = post_json(relay(&config), "/api/contact", submission.to_string()).await;

    upstream.assert_async().await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "message": "Invalid input"}));
}

#[tokio::test]
async fn fractional_numbers_are_rejected() {
    let mut server = Server::new_async().await;
    let upstream = untouched_upstream(&mut server).await;

    for phone in ["1e3", "1.5"] {
        let raw = format!(r#"{{"name":"Jo","email":"a@b.com","phone":{phone},"message":"hi"}}"#);
        let (status, body) = post_json(relay(&config_for(&server)), "/api/contact", raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "phone {phone}");
        assert_eq!(body, json!({"success": false, "message": "Invalid input"}));
    }

    upstream.assert_async().await;
}

#[tokio::test]
async fn empty_strings_count_as_present() {
    let mut server = Server::new_async().await;
    let upstream = server
        .mock("POST", UPSTREAM_PATH)
        .match_body(Matcher::Json(json!({
            "name": "",
            "email": "",
            "phone": "",
            "message": ""
        })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let (status, _) = post_json(
        relay(&config_for(&server)),
        "/api/contact",
        r#"{"name":"","email":"","phone":"","message":""}"#,
    )
    .await;

    upstream.assert_async().await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_email_and_phone_pass_through() {
    let mut server = Server::new_async().await;
    let upstream = server
        .mock("POST", UPSTREAM_PATH)
        .match_body(Matcher::PartialJson(json!({
            "email": "not-an-email",
            "phone": "call me maybe"
        })))
        .with_status(200)
        .with_body("ok")
        .expect(1)
        .create_async()
        .await;

    let (status, _) = post_json(
        relay(&config_for(&server)),
        "/api/contact",
        r#"{"name":"Jo","email":"not-an-email","phone":"call me maybe","message":"hi"}"#,
    )
    .await;

    upstream.assert_async().await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn upstream_error_status_is_reported_as_failure() {
    let mut server = Server::new_async().await;
    let _upstream = server
        .mock("POST", UPSTREAM_PATH)
        .with_status(500)
        .with_body(r#"{"error":"internal"}"#)
        .create_async()
        .await;

    let (status, body) = post_json(
        relay(&config_for(&server)),
        "/api/contact",
        r#"{"name":"Jo","email":"a@b.com","phone":"1234567890","message":"hi"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        json!({"success": false, "message": "upstream returned HTTP 500"})
    );
}

#[tokio::test]
async fn masked_mode_reports_upstream_error_as_success() {
    let mut server = Server::new_async().await;
    let _upstream = server
        .mock("POST", UPSTREAM_PATH)
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.mask_upstream_errors = true;

    let (status, body) = post_json(
        relay(&config),
        "/api/contact",
        r#"{"name":"Jo","email":"a@b.com","phone":"1234567890","message":"hi"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "response": "upstream exploded"})
    );
}

#[tokio::test]
async fn unresponsive_upstream_fails_visibly() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    });

    let mut config = Config::for_upstream(format!("http://{addr}/contact"), API_KEY);
    config.upstream_timeout_ms = 200;

    let (status, body) = post_json(
        relay(&config),
        "/api/contact",
        r#"{"name":"Jo","email":"a@b.com","phone":"1234567890","message":"hi"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        body,
        json!({"success": false, "message": "upstream timed out"})
    );
}

#[tokio::test]
async fn unreachable_upstream_is_a_bad_gateway() {
    // Bind then drop so the port is known to be closed.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let config = Config::for_upstream(format!("http://{addr}/contact"), API_KEY);

    let (status, body) = post_json(
        relay(&config),
        "/api/contact",
        r#"{"name":"Jo","email":"a@b.com","phone":"1234567890","message":"hi"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], json!(false));
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("upstream request failed"), "{message}");
    assert!(!message.contains(API_KEY));
}

#[tokio::test]
async fn oversized_upstream_reply_is_a_bad_gateway() {
    let mut server = Server::new_async().await;
    let _upstream = server
        .mock("POST", UPSTREAM_PATH)
        .with_status(200)
        .with_body("y".repeat(4096))
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.max_upstream_body_bytes = 1024;

    let (status, body) = post_json(
        relay(&config),
        "/api/contact",
        r#"{"name":"Jo","email":"a@b.com","phone":"1234567890","message":"hi"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        json!({"success": false, "message": "upstream reply exceeds 1024 bytes"})
    );
}

#[tokio::test]
async fn custom_relay_path_is_honoured() {
    let mut server = Server::new_async().await;
    let upstream = server
        .mock("POST", UPSTREAM_PATH)
        .with_status(200)
        .with_body("ok")
        .expect(1)
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.relay_path = "/forms/contact".to_string();

    let (status, _) = post_json(
        relay(&config),
        "/forms/contact",
        r#"{"name":"Jo","email":"a@b.com","phone":"1234567890","message":"hi"}"#,
    )
    .await;

    upstream.assert_async().await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn secret_never_reaches_the_page() {
    let server = Server::new_async().await;
    let app = relay(&config_for(&server));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(page.contains(r#"data-relay-path="/api/contact""#));
    assert!(!page.contains(API_KEY));
    assert!(!page.contains(&server.url()));
}
