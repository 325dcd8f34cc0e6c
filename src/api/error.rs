use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// 400/422 - the server rejected the request payload (bad credential,
    /// invalid code, malformed field). Retryable after user correction.
    #[error("{0}")]
    Rejected(String),

    /// 401 - carries the server's message (bad credential, bad TOTP
    /// code, expired token) so the rejection reason reaches the user.
    #[error("{0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 300;

impl ApiError {
    /// Pull the human-readable message out of an error body.
    ///
    /// The backend embeds it at varying depths depending on which layer
    /// produced the failure: `{"message": ...}`, `{"detail": ...}` (the
    /// FastAPI default), or `{"error": {"message": ...}}`. Falls back to
    /// the truncated raw body so callers always get something printable.
    fn extract_message(body: &str) -> String {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            for candidate in [
                value.get("message"),
                value.get("detail"),
                value.get("error").and_then(|e| e.get("message")),
            ]
            .into_iter()
            .flatten()
            {
                if let Some(s) = candidate.as_str() {
                    return s.to_string();
                }
            }
        }
        Self::truncate_body(body)
    }

    /// Truncate a response body to avoid carrying excessive data.
    /// The cut backs up to a char boundary so multi-byte text is safe.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..end],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::extract_message(body);
        match status.as_u16() {
            400 | 422 => ApiError::Rejected(message),
            401 if message.is_empty() => {
                ApiError::Unauthorized("Unauthorized - token may be expired".to_string())
            }
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_extract_message_top_level() {
        assert_eq!(
            ApiError::extract_message(r#"{"message":"Invalid credentials"}"#),
            "Invalid credentials"
        );
    }

    #[test]
    fn test_extract_message_detail_field() {
        assert_eq!(
            ApiError::extract_message(r#"{"detail":"User already registered"}"#),
            "User already registered"
        );
    }

    #[test]
    fn test_extract_message_nested_error() {
        assert_eq!(
            ApiError::extract_message(r#"{"error":{"message":"Invalid code"}}"#),
            "Invalid code"
        );
    }

    #[test]
    fn test_extract_message_falls_back_to_body() {
        assert_eq!(
            ApiError::extract_message("gateway timeout"),
            "gateway timeout"
        );
    }

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"message":"nope"}"#),
            ApiError::Rejected(m) if m == "nope"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "boom"),
            ApiError::ServerError(_)
        ));
    }

    #[test]
    fn test_unauthorized_carries_server_message() {
        let err = ApiError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"detail":"Invalid login credentials"}"#,
        );
        assert!(matches!(&err, ApiError::Unauthorized(m) if m == "Invalid login credentials"));
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn test_unauthorized_without_body_keeps_generic_message() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.to_string(), "Unauthorized - token may be expired");
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(1000);
        let truncated = ApiError::extract_message(&body);
        assert!(truncated.contains("truncated"));
        assert!(truncated.len() < body.len());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // 1 ASCII byte then 150 three-byte chars puts the cut mid-char
        let body = format!("a{}", "€".repeat(150));
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, &body);
        let message = err.to_string();
        assert!(message.contains("truncated"));
        assert!(message.starts_with("Server error: a€"));
    }
}
