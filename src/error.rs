// HTTP API Error Types
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Last-resort body when the error itself cannot be serialized.
const FALLBACK_BODY: &str = r#"{"errcode":"M_UNKNOWN","error":"Unknown error marshalling error"}"#;

/// Matrix-style error codes surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Unsupported route or method
    Unrecognized,
    /// Any internal failure
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unrecognized => "M_UNRECOGNIZED",
            ErrorCode::Unknown => "M_UNKNOWN",
        }
    }
}

/// HTTP API error with a status code and a client-safe message.
///
/// Internal causes are logged where they happen and never carried in here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub errcode: ErrorCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    errcode: &'a str,
    error: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, errcode: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            errcode,
            message: message.into(),
        }
    }

    /// 404 for any path the proxy does not serve
    pub fn unrecognized_route() -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::Unrecognized, "Not found")
    }

    /// 405 for anything but GET on the power levels path
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, ErrorCode::Unrecognized, "Method not allowed")
    }

    /// 500 with a short human-readable message
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Unknown, message)
    }

    /// Serialize to the `{errcode, error}` wire shape
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&ErrorBody {
            errcode: self.errcode.as_str(),
            error: &self.message,
        })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.errcode.as_str(), self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.to_body() {
            Ok(body) => (self.status, body),
            Err(e) => {
                tracing::error!("Error marshalling error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_BODY.as_bytes().to_vec())
            }
        };

        (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn body_json(err: &ApiError) -> Value {
        serde_json::from_slice(&err.to_body().unwrap()).unwrap()
    }

    #[test]
    fn test_route_errors_use_unrecognized() {
        let not_found = ApiError::unrecognized_route();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(body_json(&not_found), json!({"errcode": "M_UNRECOGNIZED", "error": "Not found"}));

        let not_allowed = ApiError::method_not_allowed();
        assert_eq!(not_allowed.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(&not_allowed)["errcode"], "M_UNRECOGNIZED");
    }

    #[test]
    fn test_unknown_error_body() {
        let err = ApiError::unknown("Failed to get room version");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(&err),
            json!({"errcode": "M_UNKNOWN", "error": "Failed to get room version"})
        );
    }

    #[test]
    fn test_into_response_sets_status_and_content_type() {
        let response = ApiError::method_not_allowed().into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_fallback_body_is_valid_json() {
        let v: Value = serde_json::from_str(FALLBACK_BODY).unwrap();
        assert_eq!(v["errcode"], "M_UNKNOWN");
    }
}
