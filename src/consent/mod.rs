//! User Consent
//!
//! Gate in front of every outbound completion request: the user has to agree
//! that email text may be sent to the provider, and that agreement lapses after
//! the validity period (180 days by default). Revoking consent also deletes the
//! stored credential.

pub mod manager;
pub mod record;

pub use manager::ConsentManager;
pub use record::{ConsentConfig, ConsentInfo, ConsentRecord, ConsentState};
