//! End-to-end tests for `/api/forms` over a real socket.

use std::time::Duration;

use serde_json::json;
use site_forms::config::AppConfig;

mod common;

use common::{reply, spawn_app};

#[tokio::test]
async fn test_quote_is_stored_and_admin_notified() {
    let app = spawn_app(AppConfig::default()).await;

    let (status, body) = reply(
        app.submit(
            "quote",
            &[
                ("name", "Jane Doe"),
                ("email", "jane@example.com"),
                ("phone", "+254 700 000000"),
                ("message", "Two-storey extension, Q3."),
            ],
        )
        .await,
    )
    .await;

    assert_eq!(status, 200);
    assert!(body.success);
    assert_eq!(body.message, "Thank you! We will contact you soon.");

    let quotes = app.store.quotes();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].quote.name, "Jane Doe");

    let sent = app.mailer.attempts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, AppConfig::default().notifications.admin_email);
    assert_eq!(sent[0].reply_to.as_deref(), Some("jane@example.com"));
    assert!(sent[0].body.contains("Two-storey extension, Q3."));
}

#[tokio::test]
async fn test_quote_survives_notification_failure() {
    let app = spawn_app(AppConfig::default()).await;
    app.mailer.set_failing(true);

    let (status, _) = reply(
        app.submit("quote", &[("name", "Jane"), ("email", "jane@example.com")])
            .await,
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(app.store.quotes().len(), 1);
    assert_eq!(app.mailer.attempts().len(), 1);
}

#[tokio::test]
async fn test_quote_fields_are_escaped_before_storage() {
    let app = spawn_app(AppConfig::default()).await;

    let (status, _) = reply(
        app.submit(
            "quote",
            &[
                ("name", "  <b>Jane</b>  "),
                ("email", "jane@example.com"),
                ("message", "Tom's \"deck\" & stairs"),
            ],
        )
        .await,
    )
    .await;

    assert_eq!(status, 200);
    let stored = &app.store.quotes()[0].quote;
    assert_eq!(stored.name, "&lt;b&gt;Jane&lt;/b&gt;");
    assert_eq!(stored.message, "Tom&#039;s &quot;deck&quot; &amp; stairs");
}

#[tokio::test]
async fn test_quote_without_name_is_rejected() {
    let app = spawn_app(AppConfig::default()).await;

    let (status, body) = reply(
        app.submit("quote", &[("name", "   "), ("email", "jane@example.com")])
            .await,
    )
    .await;

    assert_eq!(status, 400);
    assert!(!body.success);
    assert_eq!(body.message, "Name and email are required.");
    assert!(app.store.quotes().is_empty());
    assert!(app.mailer.attempts().is_empty());
}

#[tokio::test]
async fn test_quote_with_bad_email_is_rejected() {
    let app = spawn_app(AppConfig::default()).await;

    let (status, body) = reply(
        app.submit("quote", &[("name", "Jane"), ("email", "not-an-address")])
            .await,
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body.message, "Invalid email address.");
}

#[tokio::test]
async fn test_eleventh_quote_in_a_minute_is_limited() {
    let app = spawn_app(AppConfig::default()).await;

    for i in 0..10 {
        let response = app
            .submit("quote", &[("name", "Jane"), ("email", "jane@example.com")])
            .await;
        assert_eq!(response.status().as_u16(), 200, "request {} should pass", i + 1);
    }

    let (status, body) = reply(
        app.submit("quote", &[("name", "Jane"), ("email", "jane@example.com")])
            .await,
    )
    .await;
    assert_eq!(status, 429);
    assert_eq!(body.message, "Too many requests. Please try again later.");
    assert_eq!(app.store.quotes().len(), 10);

    // Subscriptions are limited separately.
    let response = app.submit("subscribe", &[("email", "reader@example.com")]).await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_subscribe_then_duplicate() {
    let app = spawn_app(AppConfig::default()).await;

    let (status, body) = reply(app.submit("subscribe", &[("email", "reader@example.com")]).await).await;
    assert_eq!(status, 200);
    assert_eq!(body.message, "Welcome! Check your email for confirmation.");

    let welcome = app.mailer.attempts();
    assert_eq!(welcome.len(), 1);
    assert_eq!(welcome[0].to, "reader@example.com");

    let (status, body) = reply(app.submit("subscribe", &[("email", "reader@example.com")]).await).await;
    assert_eq!(status, 400);
    assert_eq!(body.message, "Already subscribed.");
    assert_eq!(app.store.subscribers().len(), 1);
    assert_eq!(app.mailer.attempts().len(), 1);
}

#[tokio::test]
async fn test_subscribe_without_email() {
    let app = spawn_app(AppConfig::default()).await;

    let (status, body) = reply(app.submit("subscribe", &[]).await).await;
    assert_eq!(status, 400);
    assert_eq!(body.message, "Email is required.");
}

#[tokio::test]
async fn test_unknown_and_missing_action() {
    let app = spawn_app(AppConfig::default()).await;

    let (status, body) = reply(app.submit("unsubscribe", &[("email", "a@b.com")]).await).await;
    assert_eq!(status, 400);
    assert_eq!(body.message, "Invalid action");

    let response = app
        .client
        .post(app.url("/api/forms"))
        .form(&[("email", "a@b.com")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.store.event_count(), 0);
}

#[tokio::test]
async fn test_json_body_with_action_field() {
    let app = spawn_app(AppConfig::default()).await;

    let response = app
        .client
        .post(app.url("/api/forms"))
        .json(&json!({
            "action": "quote",
            "name": "Jane",
            "email": "jane@example.com",
            "message": "Sent from a fetch() call",
        }))
        .send()
        .await
        .unwrap();

    let (status, _) = reply(response).await;
    assert_eq!(status, 200);
    assert_eq!(app.store.quotes()[0].quote.message, "Sent from a fetch() call");
}

#[tokio::test]
async fn test_multipart_form_data() {
    let app = spawn_app(AppConfig::default()).await;

    let form = reqwest::multipart::Form::new()
        .text("action", "subscribe")
        .text("email", "formdata@example.com");
    let response = app
        .client
        .post(app.url("/api/forms"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    let (status, _) = reply(response).await;
    assert_eq!(status, 200);
    assert_eq!(app.store.subscribers()[0].email, "formdata@example.com");
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = spawn_app(AppConfig::default()).await;

    let response = app
        .client
        .request(reqwest::Method::OPTIONS, app.url("/api/forms"))
        .header("Origin", "https://rivernilleconstruction.co.ke")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"));
    assert_eq!(app.store.event_count(), 0);
}

#[tokio::test]
async fn test_every_reply_has_request_id() {
    let app = spawn_app(AppConfig::default()).await;

    let ok = app.client.get(app.url("/health")).send().await.unwrap();
    assert!(ok.headers().contains_key("x-request-id"));

    let rejected = app.submit("bogus", &[]).await;
    assert!(rejected.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_csrf_header_required_when_enabled() {
    let mut config = AppConfig::default();
    config.security.csrf_enabled = true;
    let app = spawn_app(config).await;

    let (status, body) = reply(app.submit("subscribe", &[("email", "reader@example.com")]).await).await;
    assert_eq!(status, 403);
    assert_eq!(body.message, "Invalid request token.");
    assert!(app.store.subscribers().is_empty());

    let response = app
        .client
        .post(app.url("/api/forms?action=subscribe"))
        .header("X-CSRF-Token", "abc123")
        .form(&[("email", "reader@example.com")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_concurrent_subscribers() {
    let mut config = AppConfig::default();
    config.rate_limits.subscribe.max_calls = 1_000;
    let app = spawn_app(config).await;

    let mut handles = Vec::new();
    for i in 0..50 {
        let client = app.client.clone();
        let url = app.url("/api/forms?action=subscribe");
        handles.push(tokio::spawn(async move {
            let email = format!("reader{i}@example.com");
            client
                .post(url)
                .form(&[("email", email.as_str())])
                .send()
                .await
                .unwrap()
                .status()
                .as_u16()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }
    assert_eq!(app.store.subscribers().len(), 50);
    assert_eq!(app.mailer.attempts().len(), 50);
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let app = spawn_app(AppConfig::default()).await;
    let health = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(health.status().as_u16(), 200);

    app.shutdown.trigger();

    let mut refused = false;
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let fresh = reqwest::Client::new();
        if fresh.get(app.url("/health")).send().await.is_err() {
            refused = true;
            break;
        }
    }
    assert!(refused, "server kept accepting after shutdown");
}
