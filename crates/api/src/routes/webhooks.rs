//! Webhook routes

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::HeaderMap,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::WebhookError;
use crate::state::AppState;
use github::{verify_signature, SIGNATURE_HEADER};

pub const WEBHOOK_RECEIVED: &str = "Webhook received";

pub async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<&'static str, WebhookError> {
    let body = body.map_err(|e| {
        warn!("Error reading request body: {}", e);
        WebhookError::UnreadableBody
    })?;

    // Missing header reads as an empty signature
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(state.config.webhook_secret.as_deref(), &body, signature) {
        warn!("Invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!("Error parsing webhook JSON: {}", e);
        WebhookError::InvalidJson
    })?;

    info!("Webhook payload:\n{}", render_payload(&payload, &body));

    // Relay the bytes GitHub signed, not our re-encoding
    state.relay.publish(&body).await;

    Ok(WEBHOOK_RECEIVED)
}

pub async fn method_not_allowed() -> WebhookError {
    WebhookError::MethodNotAllowed
}

/// Pretty-print the payload, falling back to the raw body
fn render_payload(payload: &Value, raw: &[u8]) -> String {
    match serde_json::to_string_pretty(payload) {
        Ok(pretty) => pretty,
        Err(e) => {
            warn!("Error formatting JSON: {}", e);
            String::from_utf8_lossy(raw).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::routes::router;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use common::Config;
    use relay::testing::{FailingPublisher, RecordingPublisher, StallingPublisher};
    use relay::Relay;
    use std::io;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};
    use tower::ServiceExt;

    const SECRET: &[u8] = b"topsecret";
    const BODY: &str = r#"{"a":1}"#;

    fn config(secret: Option<&[u8]>) -> Config {
        Config {
            webhook_secret: secret.map(|s| s.to_vec()),
            ..Default::default()
        }
    }

    fn app(config: Config, relay: Relay) -> Router {
        router(Arc::new(AppState::new(config, relay)))
    }

    fn post(body: impl Into<Body>, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("Content-Type", "application/json")
            .header("X-GitHub-Event", "push");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(body.into()).unwrap()
    }

    /// Log sink shared with a scoped `tracing` subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_signature_accepted() {
        let app = app(config(Some(SECRET)), Relay::disabled());
        let signature = github::sign(SECRET, BODY.as_bytes()).unwrap();

        let (status, body) = send(app, post(BODY, Some(&signature))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Webhook received");
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let publisher = Arc::new(RecordingPublisher::default());
        let relay = Relay::new(publisher.clone(), "github-webhook", Duration::from_secs(5));
        let app = app(config(Some(SECRET)), relay);

        let (status, body) = send(app, post(BODY, Some("sha256=deadbeef"))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Invalid signature");
        assert!(publisher.messages().is_empty());
    }

    #[tokio::test]
    async fn test_missing_signature_rejected_when_secret_set() {
        let app = app(config(Some(SECRET)), Relay::disabled());

        let (status, _) = send(app, post(BODY, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_no_secret_still_requires_json() {
        let app = app(config(None), Relay::disabled());

        let (status, body) = send(app, post("not-json", None)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Error parsing JSON");
    }

    #[tokio::test]
    async fn test_no_secret_empty_body_rejected() {
        let app = app(config(None), Relay::disabled());

        let (status, _) = send(app, post(Body::empty(), Some("garbage"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_no_secret_accepts_unsigned_json() {
        let app = app(config(None), Relay::disabled());

        let (status, body) = send(app, post(r#"[1, "two", {"three": null}]"#, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, WEBHOOK_RECEIVED);
    }

    #[tokio::test]
    async fn test_signed_invalid_json_rejected() {
        let app = app(config(Some(SECRET)), Relay::disabled());
        let signature = github::sign(SECRET, b"{oops").unwrap();

        let (status, _) = send(app, post("{oops", Some(&signature))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_not_allowed() {
        let app = app(config(Some(SECRET)), Relay::disabled());
        let request = Request::builder()
            .method("GET")
            .uri("/webhook")
            .header(SIGNATURE_HEADER, github::sign(SECRET, BODY.as_bytes()).unwrap())
            .body(Body::from(BODY))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["allow"], "POST");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Method not allowed");
    }

    #[tokio::test]
    async fn test_put_not_allowed() {
        let app = app(config(None), Relay::disabled());
        let request = Request::builder()
            .method("PUT")
            .uri("/webhook")
            .body(Body::from(BODY))
            .unwrap();

        let (status, _) = send(app, request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let config = Config {
            max_body_bytes: 8,
            ..config(None)
        };
        let app = app(config, Relay::disabled());

        let (status, body) = send(app, post(r#"{"key":"a long enough value"}"#, None)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Error reading request body");
    }

    #[tokio::test]
    async fn test_relays_raw_body() {
        let publisher = Arc::new(RecordingPublisher::default());
        let relay = Relay::new(publisher.clone(), "github-webhook", Duration::from_secs(5));
        let app = app(config(Some(SECRET)), relay);
        // Whitespace that a re-encode would drop
        let raw = "{ \"a\" :  1 }\n";
        let signature = github::sign(SECRET, raw.as_bytes()).unwrap();

        let (status, _) = send(app, post(raw, Some(&signature))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            publisher.messages(),
            vec![("github-webhook".to_string(), raw.as_bytes().to_vec())]
        );
    }

    #[tokio::test]
    async fn test_relay_error_does_not_change_response() {
        let relay = Relay::new(
            Arc::new(FailingPublisher),
            "github-webhook",
            Duration::from_secs(5),
        );
        let app = app(config(Some(SECRET)), relay);
        let signature = github::sign(SECRET, BODY.as_bytes()).unwrap();

        let (status, body) = send(app, post(BODY, Some(&signature))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, WEBHOOK_RECEIVED);
    }

    #[tokio::test]
    async fn test_relay_timeout_does_not_change_response() {
        let timeout = Duration::from_millis(100);
        let relay = Relay::new(Arc::new(StallingPublisher), "github-webhook", timeout);
        let app = app(config(Some(SECRET)), relay);
        let signature = github::sign(SECRET, BODY.as_bytes()).unwrap();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let started = Instant::now();
        let (status, body) = send(app, post(BODY, Some(&signature))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, WEBHOOK_RECEIVED);
        assert!(started.elapsed() >= timeout);
        assert!(started.elapsed() < Duration::from_secs(5));

        let logs = logs.contents();
        assert!(
            logs.contains("Error publishing to Redis channel github-webhook"),
            "{}",
            logs
        );
        assert!(logs.contains("timed out"), "{}", logs);
    }

    #[tokio::test]
    async fn test_replays_publish_every_time() {
        let publisher = Arc::new(RecordingPublisher::default());
        let relay = Relay::new(publisher.clone(), "github-webhook", Duration::from_secs(5));
        let app = app(config(Some(SECRET)), relay);
        let signature = github::sign(SECRET, BODY.as_bytes()).unwrap();

        for _ in 0..3 {
            let (status, _) = send(app.clone(), post(BODY, Some(&signature))).await;
            assert_eq!(status, StatusCode::OK);
        }

        assert_eq!(publisher.messages().len(), 3);
    }

    #[test]
    fn test_render_payload_is_indented() {
        let payload: Value = serde_json::from_str(BODY).unwrap();

        assert_eq!(render_payload(&payload, BODY.as_bytes()), "{\n  \"a\": 1\n}");
    }
}
