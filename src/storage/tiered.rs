use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::KeyValueStore;
use crate::assessment::{AssessmentSession, AssessmentType, Locale};
use crate::error::{StorageError, StorageResult};

/// Storage key for a calculator session: `periodhub_<assessmentType>_<userId>`.
pub fn session_key(assessment_type: AssessmentType, user_id: &str) -> String {
    format!("periodhub_{}_{}", assessment_type.as_str(), user_id)
}

/// Key of the last-resort identifier stub for `key`.
pub fn backup_key(key: &str) -> String {
    format!("{}_backup", key)
}

/// Where a session ended up after [`TieredSessionStore::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveTier {
    /// Full session in the primary store.
    Primary,
    /// Full session in the secondary store.
    Secondary,
    /// Session without its result in the primary store.
    Minimal,
    /// Only the session identifiers, under the backup key.
    Backup,
}

impl SaveTier {
    /// Whether answers survived the save.
    pub fn keeps_answers(&self) -> bool {
        !matches!(self, SaveTier::Backup)
    }
}

/// Identifier-only record written when nothing else fits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStub {
    pub id: String,
    pub assessment_type: AssessmentType,
    pub started_at: DateTime<Utc>,
    pub locale: Locale,
}

impl From<&AssessmentSession> for SessionStub {
    fn from(session: &AssessmentSession) -> Self {
        Self {
            id: session.id.clone(),
            assessment_type: session.assessment_type,
            started_at: session.started_at,
            locale: session.locale,
        }
    }
}

impl From<SessionStub> for AssessmentSession {
    fn from(stub: SessionStub) -> Self {
        let mut session = AssessmentSession::new(stub.assessment_type, stub.locale);
        session.id = stub.id;
        session.started_at = stub.started_at;
        session
    }
}

/// Session persistence that degrades instead of losing progress.
///
/// Writes try, in order: the full session in the primary store, the full
/// session in the secondary store, the session without its result in the
/// primary store, and finally an identifier stub under [`backup_key`]. Only
/// quota errors move a write down a tier; other backend errors are returned
/// as-is. After a successful write, copies at the other tiers are removed so
/// a later [`load`](Self::load) cannot pick up stale data.
#[derive(Clone)]
pub struct TieredSessionStore {
    primary: Arc<dyn KeyValueStore>,
    secondary: Arc<dyn KeyValueStore>,
}

impl TieredSessionStore {
    /// Create a tiered store over a primary and a secondary backend.
    pub fn new(primary: Arc<dyn KeyValueStore>, secondary: Arc<dyn KeyValueStore>) -> Self {
        Self { primary, secondary }
    }

    /// Persist `session` under `key`, falling through tiers on quota errors.
    ///
    /// # Errors
    /// [`StorageError::TiersExhausted`] when every tier is full, or the first
    /// non-quota backend error.
    pub async fn save(&self, key: &str, session: &AssessmentSession) -> StorageResult<SaveTier> {
        let full = serde_json::to_string(session)?;
        let backup = backup_key(key);

        if self.try_tier(&self.primary, key, &full, SaveTier::Primary).await? {
            self.discard(&self.secondary, key).await;
            self.discard(&self.primary, &backup).await;
            return Ok(SaveTier::Primary);
        }

        if self.try_tier(&self.secondary, key, &full, SaveTier::Secondary).await? {
            self.discard(&self.primary, key).await;
            self.discard(&self.primary, &backup).await;
            return Ok(SaveTier::Secondary);
        }

        let minimal = serde_json::to_string(&session.without_result())?;
        if self.try_tier(&self.primary, key, &minimal, SaveTier::Minimal).await? {
            self.discard(&self.secondary, key).await;
            self.discard(&self.primary, &backup).await;
            return Ok(SaveTier::Minimal);
        }

        let stub = serde_json::to_string(&SessionStub::from(session))?;
        if self.try_tier(&self.primary, &backup, &stub, SaveTier::Backup).await? {
            self.discard(&self.primary, key).await;
            self.discard(&self.secondary, key).await;
            return Ok(SaveTier::Backup);
        }

        warn!(key = %key, session_id = %session.id, "Every storage tier is full, session not saved");
        Err(StorageError::TiersExhausted {
            key: key.to_string(),
        })
    }

    /// Load the session stored under `key`, checking tiers in save order.
    ///
    /// Unreadable copies are skipped. A stub comes back as a fresh session
    /// carrying the original id and start time.
    pub async fn load(&self, key: &str) -> StorageResult<Option<AssessmentSession>> {
        for store in [&self.primary, &self.secondary] {
            if let Some(raw) = store.get(key).await? {
                match serde_json::from_str::<AssessmentSession>(&raw) {
                    Ok(session) => {
                        debug!(key = %key, backend = store.backend_name(), "Loaded session");
                        return Ok(Some(session));
                    }
                    Err(e) => {
                        warn!(key = %key, backend = store.backend_name(), error = %e, "Skipping unreadable session");
                    }
                }
            }
        }

        if let Some(raw) = self.primary.get(&backup_key(key)).await? {
            match serde_json::from_str::<SessionStub>(&raw) {
                Ok(stub) => {
                    info!(key = %key, session_id = %stub.id, "Restored session from backup stub");
                    return Ok(Some(stub.into()));
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping unreadable session backup");
                }
            }
        }

        Ok(None)
    }

    /// Remove every tier's copy of `key`.
    pub async fn clear(&self, key: &str) -> StorageResult<()> {
        self.primary.remove(key).await?;
        self.secondary.remove(key).await?;
        self.primary.remove(&backup_key(key)).await?;
        Ok(())
    }

    /// `Ok(false)` means the tier is full and the next one should be tried.
    async fn try_tier(
        &self,
        store: &Arc<dyn KeyValueStore>,
        key: &str,
        payload: &str,
        tier: SaveTier,
    ) -> StorageResult<bool> {
        match store.set(key, payload).await {
            Ok(()) => {
                debug!(key = %key, tier = ?tier, bytes = payload.len(), "Saved session");
                Ok(true)
            }
            Err(e) if e.is_quota_exceeded() => {
                warn!(key = %key, tier = ?tier, backend = store.backend_name(), "Storage tier full, degrading");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn discard(&self, store: &Arc<dyn KeyValueStore>, key: &str) {
        if let Err(e) = store.remove(key).await {
            warn!(key = %key, backend = store.backend_name(), error = %e, "Failed to remove stale session copy");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{Answer, AnswerValue, AssessmentResult, Severity};
    use crate::storage::MemoryStore;

    fn session_with_result() -> AssessmentSession {
        let mut session = AssessmentSession::new(AssessmentType::PainImpact, Locale::Zh);
        session
            .record_answer(Answer::new("pain_intensity", AnswerValue::Text("high".to_string())))
            .unwrap();
        session
            .seal(AssessmentResult {
                score: 12.0,
                max_score: 20.5,
                percentage: 59,
                severity: Severity::Moderate,
                recommendations: (0..40)
                    .map(|i| crate::assessment::Recommendation::new(format!("padding_{i}")))
                    .collect(),
                emergency: false,
                message: "assessment.results.moderate.message".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();
        session
    }

    fn stores(primary: MemoryStore, secondary: MemoryStore) -> (Arc<MemoryStore>, Arc<MemoryStore>, TieredSessionStore) {
        let primary = Arc::new(primary);
        let secondary = Arc::new(secondary);
        let tiered = TieredSessionStore::new(primary.clone(), secondary.clone());
        (primary, secondary, tiered)
    }

    #[test]
    fn test_session_key_format() {
        assert_eq!(
            session_key(AssessmentType::PainImpact, "user-1"),
            "periodhub_pain_impact_user-1"
        );
        assert_eq!(backup_key("periodhub_pain_impact_u"), "periodhub_pain_impact_u_backup");
    }

    #[tokio::test]
    async fn test_primary_tier() {
        let (primary, secondary, tiered) = stores(MemoryStore::new(), MemoryStore::new());
        let session = session_with_result();

        assert_eq!(tiered.save("k", &session).await.unwrap(), SaveTier::Primary);
        assert!(primary.get("k").await.unwrap().is_some());
        assert!(secondary.is_empty());

        let loaded = tiered.load("k").await.unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        assert!(loaded.result.is_some());
    }

    #[tokio::test]
    async fn test_secondary_tier_when_primary_full() {
        let (primary, secondary, tiered) =
            stores(MemoryStore::with_quota(16), MemoryStore::new());
        let session = session_with_result();

        assert_eq!(tiered.save("k", &session).await.unwrap(), SaveTier::Secondary);
        assert!(primary.get("k").await.unwrap().is_none());
        assert!(secondary.get("k").await.unwrap().is_some());

        let loaded = tiered.load("k").await.unwrap().unwrap();
        assert_eq!(loaded.answers.len(), 1);
        assert!(loaded.result.is_some());
    }

    #[tokio::test]
    async fn test_minimal_tier_drops_result() {
        let session = session_with_result();
        let minimal_len = serde_json::to_string(&session.without_result()).unwrap().len();
        let (_, _, tiered) = stores(
            MemoryStore::with_quota(minimal_len + 1),
            MemoryStore::with_quota(16),
        );

        assert_eq!(tiered.save("k", &session).await.unwrap(), SaveTier::Minimal);
        let loaded = tiered.load("k").await.unwrap().unwrap();
        assert_eq!(loaded.answers.len(), 1);
        assert!(loaded.result.is_none());
    }

    #[tokio::test]
    async fn test_backup_tier_keeps_identifiers() {
        let session = session_with_result();
        let stub_len = serde_json::to_string(&SessionStub::from(&session)).unwrap().len();
        let (primary, _, tiered) = stores(
            MemoryStore::with_quota(stub_len + "k_backup".len()),
            MemoryStore::with_quota(16),
        );

        let tier = tiered.save("k", &session).await.unwrap();
        assert_eq!(tier, SaveTier::Backup);
        assert!(!tier.keeps_answers());
        assert!(primary.get("k_backup").await.unwrap().is_some());

        let loaded = tiered.load("k").await.unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.started_at, session.started_at);
        assert!(loaded.answers.is_empty());
        assert!(loaded.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_all_tiers_full_is_an_error() {
        let (_, _, tiered) = stores(MemoryStore::with_quota(4), MemoryStore::with_quota(4));
        let err = tiered.save("k", &session_with_result()).await.unwrap_err();
        assert!(matches!(err, StorageError::TiersExhausted { key } if key == "k"));
    }

    #[tokio::test]
    async fn test_successful_save_removes_stale_copies() {
        let (primary, secondary, tiered) = stores(MemoryStore::new(), MemoryStore::new());
        secondary.set("k", "stale").await.unwrap();
        primary.set("k_backup", "stale").await.unwrap();

        tiered.save("k", &session_with_result()).await.unwrap();
        assert!(secondary.get("k").await.unwrap().is_none());
        assert!(primary.get("k_backup").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_skips_unreadable_copy() {
        let (primary, secondary, tiered) = stores(MemoryStore::new(), MemoryStore::new());
        let session = session_with_result();
        primary.set("k", "{broken").await.unwrap();
        secondary
            .set("k", &serde_json::to_string(&session).unwrap())
            .await
            .unwrap();

        let loaded = tiered.load("k").await.unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
    }

    #[tokio::test]
    async fn test_clear_removes_every_tier() {
        let (primary, secondary, tiered) = stores(MemoryStore::new(), MemoryStore::new());
        primary.set("k", "1").await.unwrap();
        secondary.set("k", "2").await.unwrap();
        primary.set("k_backup", "3").await.unwrap();

        tiered.clear("k").await.unwrap();
        assert!(primary.is_empty());
        assert!(secondary.is_empty());
        assert!(tiered.load("k").await.unwrap().is_none());
    }
}
