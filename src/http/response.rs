//! Error responses for the HTTP surface.
//!
//! Every failure is a JSON `{"error": "..."}` body; the status depends on
//! whose fault it was.

use axum::{
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};

use crate::protocol::FrameError;
use crate::relay::{BridgeError, Envelope};

#[derive(Debug)]
pub enum ApiError {
    /// `message` absent, null or empty.
    MissingMessage,
    /// Body was not a JSON object.
    InvalidBody,
    Backend(BridgeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingMessage | ApiError::InvalidBody => StatusCode::BAD_REQUEST,
            ApiError::Backend(BridgeError::Frame(FrameError::TooLarge { .. })) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ApiError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::MissingMessage => "Missing message field".to_string(),
            ApiError::InvalidBody => "Invalid JSON body".to_string(),
            ApiError::Backend(e) => e.to_string(),
        }
    }
}

impl From<BridgeError> for ApiError {
    fn from(e: BridgeError) -> Self {
        ApiError::Backend(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(Envelope::error(self.message()))).into_response()
    }
}

/// Rewrite rejections produced by the body-limit and timeout layers so
/// they carry the same `{"error": ..}` body as handler errors.
pub async fn json_rejection(response: Response) -> Response {
    let message = match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => "Request body too large",
        StatusCode::REQUEST_TIMEOUT => "Request timed out",
        _ => return response,
    };
    if is_json(&response) {
        return response;
    }

    let (parts, _) = response.into_parts();
    let mut rebuilt = (parts.status, Json(Envelope::error(message))).into_response();
    for (name, value) in parts.headers.iter() {
        if name != CONTENT_LENGTH && name != CONTENT_TYPE {
            rebuilt.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rebuilt
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
