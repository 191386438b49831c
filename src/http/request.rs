//! Request extraction for form submissions.
//!
//! # Responsibilities
//! - Resolve the client IP (peer address, or `X-Forwarded-For` behind a trusted proxy)
//! - Read the `action` from the query string, overridden by a body field
//! - Decode the body: urlencoded, multipart or a JSON object
//!
//! # Design Decisions
//! - Body size is bounded by `DefaultBodyLimit` before any decoding
//! - File parts of a multipart body are ignored
//! - Non-string JSON scalars are kept in their textual form

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, FromRef, FromRequest, FromRequestParts, Multipart, Request},
    http::{header, HeaderMap, StatusCode},
};
use serde_json::Value;

use crate::http::response::ApiError;
use crate::submissions::FormFields;

/// Request ID header, set by the middleware stack on every request.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Forwarded client address header.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Fallback when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// How the client IP is resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIpPolicy {
    pub trust_forwarded_for: bool,
}

/// A decoded `/api/forms` request.
#[derive(Debug, Clone)]
pub struct FormSubmission {
    pub client_ip: String,
    /// Raw action name, body first, then query.
    pub action: Option<String>,
    /// Body fields, without `action`.
    pub fields: FormFields,
}

impl<S> FromRequest<S> for FormSubmission
where
    S: Send + Sync,
    ClientIpPolicy: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let policy = ClientIpPolicy::from_ref(state);
        let (mut parts, body) = req.into_parts();

        let peer = ConnectInfo::<SocketAddr>::from_request_parts(&mut parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr);
        let client_ip = client_ip(&parts.headers, peer, policy.trust_forwarded_for);
        let query_action = parts.uri.query().and_then(action_from_query);

        let mut fields = read_fields(Request::from_parts(parts, body), state).await?;
        let action = fields.remove("action").or(query_action);

        Ok(Self {
            client_ip,
            action,
            fields,
        })
    }
}

/// Resolve the address rate limits are keyed on.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn action_from_query(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "action")
        .map(|(_, value)| value.into_owned())
}

enum BodyKind {
    UrlEncoded,
    Multipart,
    Json,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let essence = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match essence.as_str() {
        "multipart/form-data" => BodyKind::Multipart,
        "application/json" => BodyKind::Json,
        _ => BodyKind::UrlEncoded,
    }
}

async fn read_fields<S>(req: Request, state: &S) -> Result<FormFields, ApiError>
where
    S: Send + Sync,
{
    match body_kind(req.headers()) {
        BodyKind::Multipart => {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| body_error(e.status(), &e))?;
            let mut fields = FormFields::new();
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| body_error(e.status(), &e))?
            {
                let Some(name) = field.name().map(str::to_owned) else {
                    continue;
                };
                if field.file_name().is_some() {
                    continue;
                }
                let value = field.text().await.map_err(|e| body_error(e.status(), &e))?;
                fields.insert(name, value);
            }
            Ok(fields)
        }
        BodyKind::Json => {
            let bytes = read_bytes(req, state).await?;
            if bytes.is_empty() {
                return Ok(FormFields::new());
            }
            let object: serde_json::Map<String, Value> =
                serde_json::from_slice(&bytes).map_err(|e| body_error(StatusCode::BAD_REQUEST, &e))?;
            Ok(object
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::String(s) => Some((key, s)),
                    Value::Number(n) => Some((key, n.to_string())),
                    Value::Bool(b) => Some((key, b.to_string())),
                    _ => None,
                })
                .collect())
        }
        BodyKind::UrlEncoded => {
            let bytes = read_bytes(req, state).await?;
            Ok(url::form_urlencoded::parse(&bytes)
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect())
        }
    }
}

async fn read_bytes<S>(req: Request, state: &S) -> Result<Bytes, ApiError>
where
    S: Send + Sync,
{
    Bytes::from_request(req, state)
        .await
        .map_err(|e| body_error(e.status(), &e))
}

fn body_error(status: StatusCode, error: &dyn std::fmt::Display) -> ApiError {
    tracing::debug!(status = %status, error = %error, "Unreadable form body");
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PAYLOAD_TOO_LARGE
    } else {
        ApiError::INVALID_BODY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Method;

    async fn extract(req: Request, trust_forwarded_for: bool) -> Result<FormSubmission, ApiError> {
        let policy = ClientIpPolicy { trust_forwarded_for };
        FormSubmission::from_request(req, &policy).await
    }

    fn post(uri: &str, content_type: &str, body: impl Into<Body>) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_urlencoded_body() {
        let req = post(
            "/api/forms?action=quote",
            "application/x-www-form-urlencoded",
            "name=Jane+Doe&email=jane%40example.com&message=Hi%21",
        );
        let submission = extract(req, false).await.unwrap();

        assert_eq!(submission.action.as_deref(), Some("quote"));
        assert_eq!(submission.fields.get("name"), "Jane Doe");
        assert_eq!(submission.fields.get("email"), "jane@example.com");
        assert_eq!(submission.fields.get("message"), "Hi!");
        assert_eq!(submission.client_ip, UNKNOWN_CLIENT);
    }

    #[tokio::test]
    async fn test_body_action_overrides_query() {
        let req = post(
            "/api/forms?action=quote",
            "application/x-www-form-urlencoded",
            "action=subscribe&email=a%40b.com",
        );
        let submission = extract(req, false).await.unwrap();

        assert_eq!(submission.action.as_deref(), Some("subscribe"));
        assert_eq!(submission.fields.get("action"), "");
    }

    #[tokio::test]
    async fn test_json_body() {
        let req = post(
            "/api/forms",
            "application/json; charset=utf-8",
            r#"{"action":"quote","name":"Jane","email":"jane@example.com","phone":254700000000,"extra":{"x":1}}"#,
        );
        let submission = extract(req, false).await.unwrap();

        assert_eq!(submission.action.as_deref(), Some("quote"));
        assert_eq!(submission.fields.get("name"), "Jane");
        assert_eq!(submission.fields.get("phone"), "254700000000");
        assert_eq!(submission.fields.get("extra"), "");
    }

    #[tokio::test]
    async fn test_json_array_is_rejected() {
        let req = post("/api/forms", "application/json", "[1,2,3]");
        let err = extract(req, false).await.unwrap_err();
        assert_eq!(err, ApiError::INVALID_BODY);
    }

    #[tokio::test]
    async fn test_multipart_body() {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"action\"\r\n\r\nsubscribe\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"email\"\r\n\r\nreader@example.com\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
             Content-Type: text/plain\r\n\r\nignored\r\n\
             --{b}--\r\n",
            b = boundary
        );
        let req = post(
            "/api/forms",
            &format!("multipart/form-data; boundary={boundary}"),
            body,
        );
        let submission = extract(req, false).await.unwrap();

        assert_eq!(submission.action.as_deref(), Some("subscribe"));
        assert_eq!(submission.fields.get("email"), "reader@example.com");
        assert_eq!(submission.fields.get("upload"), "");
    }

    #[tokio::test]
    async fn test_get_has_no_fields() {
        let req = Request::builder()
            .uri("/api/forms?action=quote&name=ignored")
            .body(Body::empty())
            .unwrap();
        let submission = extract(req, false).await.unwrap();

        assert_eq!(submission.action.as_deref(), Some("quote"));
        assert!(submission.fields.is_empty());
    }

    #[tokio::test]
    async fn test_peer_address_from_connect_info() {
        let mut req = post("/api/forms", "application/x-www-form-urlencoded", "");
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 40000))));

        let submission = extract(req, false).await.unwrap();
        assert_eq!(submission.client_ip, "10.0.0.7");
    }

    #[test]
    fn test_forwarded_for_only_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, "203.0.113.9, 10.0.0.1".parse().unwrap());
        let peer = Some(SocketAddr::from(([10, 0, 0, 1], 5000)));

        assert_eq!(client_ip(&headers, peer, false), "10.0.0.1");
        assert_eq!(client_ip(&headers, peer, true), "203.0.113.9");
        assert_eq!(client_ip(&HeaderMap::new(), None, true), UNKNOWN_CLIENT);
    }
}
