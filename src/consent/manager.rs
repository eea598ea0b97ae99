//! Consent Manager
//!
//! Two-state machine (`NOT_GRANTED` → `GRANTED` → `NOT_GRANTED`) persisted
//! through the key-value store. Expiry is lazy: `has_consent` compares the grant
//! time against the clock on every call and never writes the result back.

use std::sync::Arc;
use tokio::sync::RwLock;

use super::record::{ConsentConfig, ConsentInfo, ConsentRecord, ConsentState};
use crate::clock::Clock;
use crate::storage::{keys, KeyValueStore, StoreError};

/// Tracks and persists the user's consent to send text to the provider
pub struct ConsentManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: ConsentConfig,
    /// Loaded lazily on first access
    cached: RwLock<Option<ConsentRecord>>,
}

impl ConsentManager {
    /// Create a new consent manager
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: ConsentConfig) -> Self {
        Self {
            store,
            clock,
            config,
            cached: RwLock::new(None),
        }
    }

    /// Cached record, loading it from the store the first time
    async fn record(&self) -> Result<ConsentRecord, StoreError> {
        if let Some(record) = self.cached.read().await.as_ref() {
            return Ok(record.clone());
        }

        let mut cached = self.cached.write().await;
        if let Some(record) = cached.as_ref() {
            return Ok(record.clone());
        }

        let values = self
            .store
            .get(&[
                keys::CONSENT_GRANTED,
                keys::CONSENT_GRANTED_AT,
                keys::CONSENT_VERSION,
            ])
            .await?;
        let record = ConsentRecord::from_values(&values, &self.config.policy_version);
        tracing::debug!("Loaded consent record: state={:?}", record.state());

        *cached = Some(record.clone());
        Ok(record)
    }

    /// Grant consent now under the current policy version
    pub async fn grant_consent(&self) -> Result<ConsentInfo, StoreError> {
        let record = ConsentRecord::granted(self.clock.now(), self.config.policy_version.clone());
        self.store.set(record.to_values()).await?;

        tracing::info!("Consent granted (policy version {})", record.version);
        *self.cached.write().await = Some(record.clone());
        Ok(self.info_for(&record))
    }

    /// Revoke consent and purge the stored credential
    ///
    /// The credential and grant time are removed before the not-granted record
    /// is written, so a failed revoke never leaves a stored key behind a
    /// "revoked" flag.
    pub async fn revoke_consent(&self) -> Result<(), StoreError> {
        self.store
            .remove(&[keys::API_KEY, keys::CONSENT_GRANTED_AT])
            .await?;

        let version = self
            .cached
            .write()
            .await
            .take()
            .map(|record| record.version)
            .unwrap_or_else(|| self.config.policy_version.clone());
        let record = ConsentRecord::not_granted(version);

        self.store.set(record.to_values()).await?;
        *self.cached.write().await = Some(record);

        tracing::info!("Consent revoked, stored credential removed");
        Ok(())
    }

    /// Whether consent is granted and unexpired right now
    pub async fn has_consent(&self) -> Result<bool, StoreError> {
        let record = self.record().await?;
        let active = record.is_active_at(self.clock.now(), self.config.validity());
        if record.granted && !active {
            tracing::debug!("Stored consent is present but expired or incomplete");
        }
        Ok(active)
    }

    /// Consent summary with derived expiry
    pub async fn get_consent_info(&self) -> Result<ConsentInfo, StoreError> {
        let record = self.record().await?;
        Ok(self.info_for(&record))
    }

    fn info_for(&self, record: &ConsentRecord) -> ConsentInfo {
        let validity = self.config.validity();
        ConsentInfo {
            granted: record.state() == ConsentState::Granted,
            timestamp: record.granted_at,
            version: record.version.clone(),
            expires_at: record.expires_at(validity),
            active: record.is_active_at(self.clock.now(), validity),
        }
    }
}
