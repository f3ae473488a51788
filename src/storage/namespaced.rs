use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{entry_size, migrate, namespaced_key, Envelope, KeyValueStore, SchemaVersion};
use crate::error::StorageResult;

/// Share of namespaced entries removed when a write hits the quota.
pub const CLEANUP_FRACTION: f64 = 0.25;

/// What happened to a [`NamespacedStorage::set_item`] write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Written on the first attempt.
    Stored,
    /// Written after evicting the oldest entries.
    StoredAfterCleanup {
        /// Number of entries evicted.
        removed: usize,
    },
    /// Not written. The reason has been logged.
    Dropped,
}

impl WriteOutcome {
    /// Whether the value made it into the store.
    pub fn is_stored(&self) -> bool {
        !matches!(self, WriteOutcome::Dropped)
    }
}

/// Only the timestamp is needed to rank entries for cleanup.
#[derive(Deserialize)]
struct EnvelopeStamp {
    timestamp: DateTime<Utc>,
}

/// Namespaced, versioned view over a [`KeyValueStore`].
///
/// Values are wrapped in an [`Envelope`] and stored under
/// `<namespace>:<key>`. Writes never fail from the caller's point of view:
/// quota overflow triggers a cleanup of the oldest entries and a single
/// retry, and anything else is logged and reported as
/// [`WriteOutcome::Dropped`]. Reads fall back to the caller's default.
#[derive(Clone)]
pub struct NamespacedStorage {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl NamespacedStorage {
    /// Create a view of `store` scoped to `namespace`.
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// The namespace prefix (without the trailing colon).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Another view over the same backend with a different namespace.
    pub fn scoped(&self, namespace: impl Into<String>) -> Self {
        Self::new(Arc::clone(&self.store), namespace)
    }

    fn full_key(&self, key: &str) -> String {
        namespaced_key(&self.namespace, key)
    }

    fn prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    /// Serialize `value` into an envelope and store it.
    pub async fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> WriteOutcome {
        let full_key = self.full_key(key);
        let payload = match serde_json::to_string(&Envelope::new(value)) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %full_key, error = %e, "Failed to serialize storage value");
                return WriteOutcome::Dropped;
            }
        };

        match self.store.set(&full_key, &payload).await {
            Ok(()) => {
                debug!(key = %full_key, bytes = payload.len(), "Stored item");
                WriteOutcome::Stored
            }
            Err(e) if e.is_quota_exceeded() => {
                warn!(
                    key = %full_key,
                    backend = self.store.backend_name(),
                    error = %e,
                    "Storage quota exceeded, evicting oldest entries"
                );
                let removed = match self.cleanup_oldest(CLEANUP_FRACTION).await {
                    Ok(removed) => removed,
                    Err(e) => {
                        warn!(namespace = %self.namespace, error = %e, "Cleanup failed");
                        0
                    }
                };
                if removed == 0 {
                    warn!(key = %full_key, "Nothing to evict, dropping write");
                    return WriteOutcome::Dropped;
                }

                match self.store.set(&full_key, &payload).await {
                    Ok(()) => WriteOutcome::StoredAfterCleanup { removed },
                    Err(e) => {
                        warn!(key = %full_key, error = %e, "Write still failing after cleanup, dropping");
                        WriteOutcome::Dropped
                    }
                }
            }
            Err(e) => {
                warn!(key = %full_key, error = %e, "Failed to write storage item");
                WriteOutcome::Dropped
            }
        }
    }

    /// Read a value, returning `default` when it is missing or unreadable.
    pub async fn get_item<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.read_item(key).await {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                warn!(
                    key = %self.full_key(key),
                    error = %e,
                    "Failed to read storage item, using default"
                );
                default
            }
        }
    }

    /// Read a value, surfacing parse, version and backend errors.
    ///
    /// Envelopes from older schema versions are migrated in memory; the stored
    /// copy is left untouched until the next write.
    pub async fn read_item<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let full_key = self.full_key(key);
        let Some(raw) = self.store.get(&full_key).await? else {
            return Ok(None);
        };

        let envelope: Envelope<Value> = serde_json::from_str(&raw)?;
        let version = SchemaVersion::try_from(envelope.version)?;
        if version != SchemaVersion::CURRENT {
            debug!(key = %full_key, from = %version, to = %SchemaVersion::CURRENT, "Migrating stored item");
        }
        let data = migrate(envelope.data, version, SchemaVersion::CURRENT)?;

        Ok(Some(serde_json::from_value(data)?))
    }

    /// Delete a value.
    pub async fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.store.remove(&self.full_key(key)).await
    }

    /// Keys in this namespace, without the namespace prefix.
    pub async fn keys(&self) -> StorageResult<Vec<String>> {
        let prefix = self.prefix();
        Ok(self
            .store
            .keys_with_prefix(&prefix)
            .await?
            .into_iter()
            .map(|k| k[prefix.len()..].to_string())
            .collect())
    }

    /// Delete every entry in this namespace. Returns the number removed.
    pub async fn clear(&self) -> StorageResult<usize> {
        let keys = self.store.keys_with_prefix(&self.prefix()).await?;
        for key in &keys {
            self.store.remove(key).await?;
        }
        info!(namespace = %self.namespace, removed = keys.len(), "Cleared namespace");
        Ok(keys.len())
    }

    /// Bytes used by this namespace, counted the way backends count quota.
    pub async fn usage_bytes(&self) -> StorageResult<usize> {
        let mut total = 0;
        for key in self.store.keys_with_prefix(&self.prefix()).await? {
            if let Some(value) = self.store.get(&key).await? {
                total += entry_size(&key, &value);
            }
        }
        Ok(total)
    }

    /// Evict the oldest `fraction` of entries in this namespace, rounded up.
    ///
    /// Entries are ranked by envelope timestamp; entries whose timestamp
    /// cannot be read rank oldest.
    pub async fn cleanup_oldest(&self, fraction: f64) -> StorageResult<usize> {
        let keys = self.store.keys_with_prefix(&self.prefix()).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut ranked = Vec::with_capacity(keys.len());
        for key in keys {
            let stamp = self
                .store
                .get(&key)
                .await?
                .and_then(|raw| serde_json::from_str::<EnvelopeStamp>(&raw).ok())
                .map(|s| s.timestamp)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            ranked.push((stamp, key));
        }
        ranked.sort();

        let count = ((ranked.len() as f64) * fraction.clamp(0.0, 1.0)).ceil() as usize;
        for (_, key) in ranked.iter().take(count) {
            self.store.remove(key).await?;
        }

        info!(namespace = %self.namespace, removed = count, "Evicted oldest entries");
        Ok(count)
    }

    /// Migrate a raw payload between schema versions.
    pub fn migrate_data(
        &self,
        data: Value,
        from: SchemaVersion,
        to: SchemaVersion,
    ) -> StorageResult<Value> {
        migrate(data, from, to)
    }
}
