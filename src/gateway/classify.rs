//! Provider failure classification
//!
//! Status code first; for 429 the provider's error text decides between a
//! billing/quota problem and plain throttling.

use super::protocol::ProviderErrorBody;
use crate::error::ReplyError;

/// Extract a human-readable message from a provider error body
pub fn provider_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ProviderErrorBody>(body) {
        if !parsed.error.message.trim().is_empty() {
            return parsed.error.message.trim().to_string();
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.chars().take(300).collect()
    }
}

/// Whether a 429 body is about quota/billing rather than throttling
fn mentions_quota(body: &str, message: &str) -> bool {
    if message.to_lowercase().contains("quota") {
        return true;
    }
    serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .map(|parsed| {
            let code = parsed
                .error
                .code
                .as_ref()
                .and_then(|c| c.as_str().map(str::to_string))
                .unwrap_or_default();
            let error_type = parsed.error.error_type.unwrap_or_default();
            code.contains("quota") || error_type.contains("quota")
        })
        .unwrap_or(false)
}

/// Map a non-success response to a typed error
pub fn classify_failure(status: u16, body: &str) -> ReplyError {
    let message = provider_message(status, body);
    match status {
        401 => ReplyError::AuthError { message },
        429 if mentions_quota(body, &message) => ReplyError::QuotaExceeded { message },
        429 => ReplyError::ProviderRateLimited { message },
        400 => ReplyError::BadRequest { message },
        403 => ReplyError::Forbidden { message },
        _ => ReplyError::ProviderError { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn body(message: &str, error_type: &str) -> String {
        serde_json::json!({"error": {"message": message, "type": error_type}}).to_string()
    }

    #[test]
    fn test_status_classification() {
        let cases = [
            (401, ErrorKind::AuthError),
            (400, ErrorKind::BadRequest),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::ProviderError),
            (500, ErrorKind::ProviderError),
            (503, ErrorKind::ProviderError),
        ];
        for (status, kind) in cases {
            assert_eq!(classify_failure(status, &body("x", "y")).kind(), kind, "status {}", status);
        }
    }

    #[test]
    fn test_429_quota_by_message() {
        let err = classify_failure(
            429,
            &body("You exceeded your current quota, please check your plan", "requests"),
        );
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_429_quota_by_type() {
        let err = classify_failure(429, &body("Billing hard limit reached", "insufficient_quota"));
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_429_throttle() {
        let err = classify_failure(429, &body("Rate limit reached for requests", "requests"));
        assert_eq!(
            err,
            ReplyError::ProviderRateLimited {
                message: "Rate limit reached for requests".to_string()
            }
        );
    }

    #[test]
    fn test_message_fallbacks() {
        assert_eq!(provider_message(502, ""), "HTTP 502");
        assert_eq!(provider_message(502, "Bad Gateway"), "Bad Gateway");
        assert_eq!(provider_message(401, &body("Incorrect API key provided", "invalid_request_error")), "Incorrect API key provided");
    }

    #[test]
    fn test_provider_error_keeps_status() {
        let err = classify_failure(500, "internal");
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(
            err,
            ReplyError::ProviderError {
                status: 500,
                message: "internal".to_string()
            }
        );
    }
}
