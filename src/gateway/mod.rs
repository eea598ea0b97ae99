//! Completion API Gateway
//!
//! # Architecture
//!
//! 1. **Credential** (`credential`): shape check against the provider prefix
//! 2. **Protocol** (`protocol`): prompt assembly and wire types
//! 3. **Classification** (`classify`): HTTP failure → typed error
//! 4. **Client** (`client`): one POST per reply, no retries

pub mod classify;
pub mod client;
pub mod config;
pub mod credential;
pub mod protocol;

pub use classify::classify_failure;
pub use client::{CompletionBackend, CompletionGateway};
pub use config::ApiConfig;
pub use credential::Credential;
pub use protocol::{CompletionRequest, USER_FRAMING};
