//! One-shot HTTP endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::relay::{Envelope, Forwarder};

#[derive(Debug, Deserialize)]
struct SendRequest {
    #[serde(default)]
    message: Option<Value>,
}

/// `POST /api/send`: forward `message` to the backend and return its reply.
pub async fn send_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Envelope>, ApiError> {
    let request: SendRequest = serde_json::from_slice(&body).map_err(|_| ApiError::InvalidBody)?;
    let message = message_text(request.message)?;

    let forwarder = Forwarder::from_config(&state.config.load());
    tracing::debug!(
        request_id = %request_id(&headers),
        backend = %forwarder.target(),
        message_len = message.len(),
        "Forwarding one-shot message"
    );

    let response = forwarder.forward(&message).await?;
    Ok(Json(Envelope::BackendResponse(response)))
}

/// Falsy values count as missing. Strings pass through verbatim; any other
/// JSON value is re-serialized.
fn message_text(message: Option<Value>) -> Result<String, ApiError> {
    match message {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Err(ApiError::MissingMessage),
        Some(Value::String(s)) if s.is_empty() => Err(ApiError::MissingMessage),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(ApiError::MissingMessage),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Ok(other.to_string()),
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_text_rules() {
        assert!(matches!(message_text(None), Err(ApiError::MissingMessage)));
        assert!(matches!(message_text(Some(Value::Null)), Err(ApiError::MissingMessage)));
        assert!(matches!(message_text(Some(json!(""))), Err(ApiError::MissingMessage)));
        assert!(matches!(message_text(Some(json!(false))), Err(ApiError::MissingMessage)));
        assert!(matches!(message_text(Some(json!(0))), Err(ApiError::MissingMessage)));
        assert!(matches!(message_text(Some(json!(0.0))), Err(ApiError::MissingMessage)));

        assert_eq!(message_text(Some(json!(true))).unwrap(), "true");
        assert_eq!(message_text(Some(json!(7))).unwrap(), "7");

        let text = r#"{"action":"signup"}"#;
        assert_eq!(message_text(Some(json!(text))).unwrap(), text);
        assert_eq!(
            message_text(Some(json!({"action": "ping"}))).unwrap(),
            r#"{"action":"ping"}"#
        );
    }

    #[test]
    fn send_request_tolerates_missing_field() {
        let request: SendRequest = serde_json::from_str("{}").unwrap();
        assert!(request.message.is_none());
        assert!(serde_json::from_str::<SendRequest>("[1,2]").is_err());
    }
}
