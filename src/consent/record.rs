//! Consent Record
//!
//! The persisted consent state and the pure expiry rules over it. Expiry is
//! never stored: it is derived from `granted_at` and the validity period every
//! time it is asked for.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::storage::{keys, Values};

/// Default consent validity in days (six 30-day months)
pub const DEFAULT_VALIDITY_DAYS: u32 = 180;

/// Default consent policy version
pub const DEFAULT_POLICY_VERSION: &str = "1.0";

/// Consent policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    /// Days a grant stays valid
    pub validity_days: u32,

    /// Version recorded with each grant
    pub policy_version: String,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            validity_days: DEFAULT_VALIDITY_DAYS,
            policy_version: DEFAULT_POLICY_VERSION.to_string(),
        }
    }
}

impl ConsentConfig {
    /// Validity period as a duration
    pub fn validity(&self) -> Duration {
        Duration::days(i64::from(self.validity_days))
    }
}

/// Consent lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentState {
    NotGranted,
    Granted,
}

/// Persisted consent state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// Whether the user granted consent
    pub granted: bool,

    /// When consent was granted; set whenever `granted` is true
    pub granted_at: Option<DateTime<Utc>>,

    /// Policy version the grant applies to
    pub version: String,
}

impl ConsentRecord {
    /// Initial state
    pub fn not_granted(version: impl Into<String>) -> Self {
        Self {
            granted: false,
            granted_at: None,
            version: version.into(),
        }
    }

    /// A fresh grant
    pub fn granted(at: DateTime<Utc>, version: impl Into<String>) -> Self {
        Self {
            granted: true,
            granted_at: Some(at),
            version: version.into(),
        }
    }

    /// Stored state, ignoring expiry
    pub fn state(&self) -> ConsentState {
        match (self.granted, self.granted_at) {
            (true, Some(_)) => ConsentState::Granted,
            _ => ConsentState::NotGranted,
        }
    }

    /// When the grant stops counting, if granted
    pub fn expires_at(&self, validity: Duration) -> Option<DateTime<Utc>> {
        match self.state() {
            ConsentState::Granted => self.granted_at.map(|at| at + validity),
            ConsentState::NotGranted => None,
        }
    }

    /// Effective consent at `now`; the validity boundary is inclusive
    pub fn is_active_at(&self, now: DateTime<Utc>, validity: Duration) -> bool {
        match (self.state(), self.granted_at) {
            (ConsentState::Granted, Some(at)) => now - at <= validity,
            _ => false,
        }
    }

    /// Decode from store values; absent keys mean "not granted"
    pub fn from_values(values: &Values, default_version: &str) -> Self {
        let granted = values
            .get(keys::CONSENT_GRANTED)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let granted_at = values.get(keys::CONSENT_GRANTED_AT).and_then(parse_timestamp);

        let version = values
            .get(keys::CONSENT_VERSION)
            .and_then(|v| v.as_str())
            .unwrap_or(default_version)
            .to_string();

        if granted && granted_at.is_none() {
            tracing::warn!("Stored consent is granted without a timestamp, treating as not granted");
        }

        Self {
            granted,
            granted_at,
            version,
        }
    }

    /// Encode the keys written on grant or revoke
    pub fn to_values(&self) -> Values {
        let mut values = Values::new();
        values.insert(keys::CONSENT_GRANTED.to_string(), json!(self.granted));
        values.insert(keys::CONSENT_VERSION.to_string(), json!(self.version));
        if let Some(at) = self.granted_at {
            values.insert(keys::CONSENT_GRANTED_AT.to_string(), json!(at.to_rfc3339()));
        }
        values
    }
}

/// Accepts RFC 3339 strings and epoch milliseconds
fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    if let Some(s) = value.as_str() {
        return DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }
    value
        .as_i64()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

/// Consent summary for callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentInfo {
    /// Stored grant flag
    pub granted: bool,

    /// When consent was granted
    pub timestamp: Option<DateTime<Utc>>,

    /// Policy version
    pub version: String,

    /// `timestamp + validity` when granted
    pub expires_at: Option<DateTime<Utc>>,

    /// Granted and not yet expired
    pub active: bool,
}
