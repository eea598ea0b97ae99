//! Reply Assistant Library
//!
//! Core of an AI email-reply assistant: a consent gate, a client-side
//! sliding-window rate limiter and a chat-completions gateway, composed by
//! [`service::EmailReplyService`]. Storage, time and the completion backend are
//! injected, so hosts (the bundled CLI, a browser-extension bridge, tests)
//! decide where state lives.

pub mod clock;
pub mod config;
pub mod consent;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod rate_limit;
pub mod service;
pub mod storage;
pub mod tone;

pub use error::{ErrorKind, Failure, ReplyError};
pub use service::{EmailReplyService, ReplyOutcome, Request, Response};
pub use tone::{Tone, ToneMode};
