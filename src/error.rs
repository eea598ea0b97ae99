//! Reply Error Types
//!
//! Every failure a caller can observe from the reply core. Each variant maps to
//! exactly one [`ErrorKind`], which is the stable, serialisable tag UI code
//! branches on.

use serde::{Deserialize, Serialize};

/// Error types for reply generation and its collaborators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplyError {
    /// Input was blank after trimming
    #[error("Please enter the email text you want to reply to")]
    EmptyInput,

    /// Input shorter than the policy floor
    #[error("Input is too short: {actual} characters, at least {min} required")]
    InputTooShort { min: usize, actual: usize },

    /// Tone outside the closed set, or outside the active tone mode
    #[error("Unsupported tone: {0}")]
    UnsupportedTone(String),

    /// Consent missing or expired
    #[error("Consent is required before email text can be sent to the AI provider")]
    ConsentRequired,

    /// No credential configured
    #[error("No API key configured")]
    MissingCredential,

    /// Credential present but does not match the provider's shape
    #[error("API key format is invalid")]
    InvalidCredentialFormat,

    /// Local request cap exceeded
    #[error("Rate limit reached, try again in {} seconds", .reset_time_ms.div_ceil(1000))]
    RateLimited { reset_time_ms: u64 },

    /// Provider rejected the credential (401)
    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    /// Provider reported exhausted quota or billing problem (429)
    #[error("API quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// Provider throttled the request (429)
    #[error("Provider rate limit hit: {message}")]
    ProviderRateLimited { message: String },

    /// Provider rejected the request body (400)
    #[error("Bad request (400): {message}")]
    BadRequest { message: String },

    /// Provider refused access (403)
    #[error("Forbidden (403): {message}")]
    Forbidden { message: String },

    /// Any other non-success provider response
    #[error("Provider error ({status}): {message}")]
    ProviderError { status: u16, message: String },

    /// Provider returned no usable text
    #[error("The AI provider returned an empty reply")]
    EmptyCompletion,

    /// Transport-level failure, no response received
    #[error("Network error: {0}")]
    NetworkFailure(String),

    /// Key-value store failed
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Closed set of failure kinds exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyInput,
    InputTooShort,
    UnsupportedTone,
    ConsentRequired,
    MissingCredential,
    InvalidCredentialFormat,
    RateLimited,
    AuthError,
    QuotaExceeded,
    ProviderRateLimited,
    BadRequest,
    Forbidden,
    ProviderError,
    EmptyCompletion,
    NetworkFailure,
    Storage,
}

impl ErrorKind {
    /// Label used for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::InputTooShort => "input_too_short",
            ErrorKind::UnsupportedTone => "unsupported_tone",
            ErrorKind::ConsentRequired => "consent_required",
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::InvalidCredentialFormat => "invalid_credential_format",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::AuthError => "auth_error",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::ProviderRateLimited => "provider_rate_limited",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::ProviderError => "provider_error",
            ErrorKind::EmptyCompletion => "empty_completion",
            ErrorKind::NetworkFailure => "network_failure",
            ErrorKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ReplyError {
    /// The stable kind tag for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReplyError::EmptyInput => ErrorKind::EmptyInput,
            ReplyError::InputTooShort { .. } => ErrorKind::InputTooShort,
            ReplyError::UnsupportedTone(_) => ErrorKind::UnsupportedTone,
            ReplyError::ConsentRequired => ErrorKind::ConsentRequired,
            ReplyError::MissingCredential => ErrorKind::MissingCredential,
            ReplyError::InvalidCredentialFormat => ErrorKind::InvalidCredentialFormat,
            ReplyError::RateLimited { .. } => ErrorKind::RateLimited,
            ReplyError::AuthError { .. } => ErrorKind::AuthError,
            ReplyError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            ReplyError::ProviderRateLimited { .. } => ErrorKind::ProviderRateLimited,
            ReplyError::BadRequest { .. } => ErrorKind::BadRequest,
            ReplyError::Forbidden { .. } => ErrorKind::Forbidden,
            ReplyError::ProviderError { .. } => ErrorKind::ProviderError,
            ReplyError::EmptyCompletion => ErrorKind::EmptyCompletion,
            ReplyError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            ReplyError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Milliseconds until the local limiter admits again (rate-limited only)
    pub fn reset_time_ms(&self) -> Option<u64> {
        match self {
            ReplyError::RateLimited { reset_time_ms } => Some(*reset_time_ms),
            _ => None,
        }
    }

    /// HTTP status of the provider response, for provider-side failures
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ReplyError::AuthError { .. } => Some(401),
            ReplyError::QuotaExceeded { .. } | ReplyError::ProviderRateLimited { .. } => Some(429),
            ReplyError::BadRequest { .. } => Some(400),
            ReplyError::Forbidden { .. } => Some(403),
            ReplyError::ProviderError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Structured failure as seen by callers: kind plus a human message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&ReplyError> for Failure {
    fn from(err: &ReplyError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            reset_time: err.reset_time_ms(),
            status: err.status_code(),
        }
    }
}

impl From<ReplyError> for Failure {
    fn from(err: ReplyError) -> Self {
        Failure::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message_rounds_up_seconds() {
        let err = ReplyError::RateLimited { reset_time_ms: 1200 };
        assert_eq!(err.to_string(), "Rate limit reached, try again in 2 seconds");
        assert_eq!(err.reset_time_ms(), Some(1200));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ReplyError::AuthError { message: "x".into() }.status_code(),
            Some(401)
        );
        assert_eq!(
            ReplyError::ProviderError { status: 503, message: "down".into() }.status_code(),
            Some(503)
        );
        assert_eq!(ReplyError::EmptyCompletion.status_code(), None);
    }

    #[test]
    fn test_failure_serialization() {
        let failure = Failure::from(ReplyError::RateLimited { reset_time_ms: 42_000 });
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "rate_limited");
        assert_eq!(json["resetTime"], 42_000);
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_kind_labels_match_serde() {
        let kind = ErrorKind::ProviderRateLimited;
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json, kind.as_str());
    }
}
