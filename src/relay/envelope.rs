//! JSON envelopes delivered to web clients.
//!
//! Both surfaces speak the same two shapes:
//! ```text
//! { "backendResponse": "<backend JSON as text>" }
//! { "error": "<description>" }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Envelope {
    /// A backend frame, carried as an opaque JSON string.
    BackendResponse(String),
    /// A relay or transport failure.
    Error(String),
}

const FALLBACK_ERROR_JSON: &str = r#"{"error":"failed to serialize message"}"#;

impl Envelope {
    pub fn error(description: impl Into<String>) -> Self {
        Envelope::Error(description.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Envelope::Error(_))
    }

    /// Serialize for a WebSocket text frame.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| FALLBACK_ERROR_JSON.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_response_shape() {
        let env = Envelope::BackendResponse(r#"{"action":"ping"}"#.into());
        assert_eq!(env.to_json(), r#"{"backendResponse":"{\"action\":\"ping\"}"}"#);
    }

    #[test]
    fn error_shape() {
        assert_eq!(Envelope::error("boom").to_json(), r#"{"error":"boom"}"#);
    }

    #[test]
    fn parses_back() {
        let env: Envelope = serde_json::from_str(r#"{"error":"x"}"#).unwrap();
        assert!(env.is_error());
    }
}
