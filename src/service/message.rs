//! Message surface
//!
//! Closed request/response enums for hosts that talk to the service over a
//! message channel (`{"type": ..., "data": ...}`). Every request kind is
//! matched exhaustively in [`EmailReplyService::handle`].

use serde::{Deserialize, Serialize};

use super::EmailReplyService;
use crate::consent::ConsentInfo;
use crate::error::{Failure, ReplyError};
use crate::rate_limit::UsageStats;
use crate::tone::Tone;

/// Incoming message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Request {
    /// Tone stays a string so an unknown tone is a reply failure, not a decode error
    GenerateReply { input: String, tone: String },
    GrantConsent,
    RevokeConsent,
    GetConsentInfo,
    GetUsageStats,
    SaveCredential { credential: String },
    TestConnection,
}

/// Outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Response {
    Reply(ReplyOutcome),
    ConsentInfo(ConsentInfo),
    ConsentRevoked,
    UsageStats(UsageStats),
    CredentialSaved,
    Connection { models: usize },
    Error(Failure),
}

/// Result of one `generate` call as UI code sees it
///
/// Serialises as `{"ok": true, "text": ...}` or
/// `{"ok": false, "kind": ..., "message": ..., "resetTime"?: ..., "status"?: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub failure: Option<Failure>,
}

impl ReplyOutcome {
    pub fn success(text: String) -> Self {
        Self {
            ok: true,
            text: Some(text),
            failure: None,
        }
    }

    pub fn failure(err: &ReplyError) -> Self {
        Self {
            ok: false,
            text: None,
            failure: Some(Failure::from(err)),
        }
    }
}

impl From<Result<String, ReplyError>> for ReplyOutcome {
    fn from(result: Result<String, ReplyError>) -> Self {
        match result {
            Ok(text) => Self::success(text),
            Err(err) => Self::failure(&err),
        }
    }
}

fn respond<T>(result: Result<T, ReplyError>, ok: impl FnOnce(T) -> Response) -> Response {
    match result {
        Ok(value) => ok(value),
        Err(err) => Response::Error(Failure::from(err)),
    }
}

impl EmailReplyService {
    /// Dispatch one message
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::GenerateReply { input, tone } => {
                let result = match tone.parse::<Tone>() {
                    Ok(tone) => self.generate(&input, tone).await,
                    Err(err) => Err(err),
                };
                Response::Reply(ReplyOutcome::from(result))
            }
            Request::GrantConsent => respond(self.grant_consent().await, Response::ConsentInfo),
            Request::RevokeConsent => respond(self.revoke_consent().await, |()| Response::ConsentRevoked),
            Request::GetConsentInfo => respond(self.consent_info().await, Response::ConsentInfo),
            Request::GetUsageStats => Response::UsageStats(self.usage_stats().await),
            Request::SaveCredential { credential } => {
                respond(self.save_credential(&credential).await, |()| Response::CredentialSaved)
            }
            Request::TestConnection => {
                respond(self.test_connection().await, |models| Response::Connection { models })
            }
        }
    }
}
