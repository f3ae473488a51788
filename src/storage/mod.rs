//! Storage layer for assessment persistence.
//!
//! Raw key-value backends ([`SqliteStore`], [`MemoryStore`]) sit behind the
//! [`KeyValueStore`] trait. [`NamespacedStorage`] layers the versioned
//! `{data, version, timestamp}` envelope and quota cleanup on top of a backend,
//! and [`TieredSessionStore`] keeps in-progress calculator sessions alive when
//! a backend runs out of room.

mod memory;
mod namespaced;
mod sqlite;
mod tiered;

pub use memory::MemoryStore;
pub use namespaced::{NamespacedStorage, WriteOutcome, CLEANUP_FRACTION};
pub use sqlite::SqliteStore;
pub use tiered::{backup_key, session_key, SaveTier, SessionStub, TieredSessionStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StorageError, StorageResult};

/// Persisted wrapper around every namespaced value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The stored payload.
    pub data: T,
    /// Schema version the payload was written with.
    pub version: u32,
    /// When the value was written.
    pub timestamp: DateTime<Utc>,
}

impl<T> Envelope<T> {
    /// Wrap a payload with the current schema version and timestamp.
    pub fn new(data: T) -> Self {
        Self {
            data,
            version: SchemaVersion::CURRENT.as_u32(),
            timestamp: Utc::now(),
        }
    }
}

/// Envelope schema versions.
///
/// Every version except the current one has exactly one forward migration in
/// [`migrate_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SchemaVersion {
    /// Payload stored as a JSON-encoded string inside `data`.
    V1,
    /// Payload stored as structured JSON.
    V2,
}

impl SchemaVersion {
    /// Version written by this build.
    pub const CURRENT: SchemaVersion = SchemaVersion::V2;

    /// Numeric form used in the envelope.
    pub fn as_u32(self) -> u32 {
        match self {
            SchemaVersion::V1 => 1,
            SchemaVersion::V2 => 2,
        }
    }
}

impl TryFrom<u32> for SchemaVersion {
    type Error = StorageError;

    fn try_from(version: u32) -> Result<Self, Self::Error> {
        match version {
            1 => Ok(SchemaVersion::V1),
            2 => Ok(SchemaVersion::V2),
            _ => Err(StorageError::UnsupportedVersion { version }),
        }
    }
}

impl From<SchemaVersion> for u32 {
    fn from(version: SchemaVersion) -> Self {
        version.as_u32()
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.as_u32())
    }
}

/// Apply the single migration that moves `data` out of `from`.
///
/// Returns the version reached and the migrated payload. The current version
/// is a fixed point.
pub fn migrate_step(from: SchemaVersion, data: Value) -> StorageResult<(SchemaVersion, Value)> {
    match from {
        SchemaVersion::V1 => {
            let data = match data {
                Value::String(encoded) => serde_json::from_str(&encoded)?,
                other => other,
            };
            Ok((SchemaVersion::V2, data))
        }
        SchemaVersion::V2 => Ok((SchemaVersion::V2, data)),
    }
}

/// Migrate a payload forward from `from` to `to`, one version at a time.
///
/// Downgrades are rejected.
pub fn migrate(data: Value, from: SchemaVersion, to: SchemaVersion) -> StorageResult<Value> {
    if from > to {
        return Err(StorageError::UnsupportedVersion {
            version: from.as_u32(),
        });
    }

    let mut version = from;
    let mut data = data;
    while version < to {
        let (next, migrated) = migrate_step(version, data)?;
        version = next;
        data = migrated;
    }
    Ok(data)
}

/// Build the `<namespace>:<key>` form used for envelope entries.
pub fn namespaced_key(namespace: &str, key: &str) -> String {
    format!("{}:{}", namespace, key)
}

/// Raw string key-value backend.
///
/// Implementations report a full store as [`StorageError::QuotaExceeded`] so
/// callers can clean up or fall back to another tier.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short backend name for log fields.
    fn backend_name(&self) -> &'static str;

    /// Read a value.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Insert or replace a value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Delete a value. Missing keys are not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;
    /// List keys starting with `prefix`, in key order.
    async fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;
}

/// Bytes an entry counts against a quota.
pub(crate) fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
