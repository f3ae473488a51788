use tracing::{debug, info, warn};

use super::{
    default_rules, Answer, AnswerValue, AssessmentHistory, AssessmentResult, AssessmentSession,
    HistoryEntry, Locale, Questionnaire, RecommendationRule,
};
use crate::error::{AppResult, AssessmentError};
use crate::storage::{session_key, SaveTier, TieredSessionStore};

/// Pain-impact calculator: one user's session over a questionnaire.
///
/// Every mutation is persisted through the [`TieredSessionStore`] before the
/// call returns; the returned [`SaveTier`] tells how much of it survived.
pub struct PainImpactCalculator {
    questionnaire: Questionnaire,
    rules: Vec<RecommendationRule>,
    store: TieredSessionStore,
    history: Option<AssessmentHistory>,
    key: String,
    locale: Locale,
    session: AssessmentSession,
}

impl PainImpactCalculator {
    /// Resume the user's stored session, or start a new one.
    pub async fn load_or_start(
        questionnaire: Questionnaire,
        store: TieredSessionStore,
        user_id: &str,
        locale: Locale,
    ) -> AppResult<Self> {
        let key = session_key(questionnaire.assessment_type, user_id);
        let session = match store.load(&key).await? {
            Some(session) if session.assessment_type == questionnaire.assessment_type => {
                info!(key = %key, session_id = %session.id, answers = session.answers.len(), "Resumed assessment session");
                session
            }
            Some(session) => {
                warn!(key = %key, found = %session.assessment_type, "Stored session has another type, starting over");
                AssessmentSession::new(questionnaire.assessment_type, locale)
            }
            None => {
                debug!(key = %key, "Starting new assessment session");
                AssessmentSession::new(questionnaire.assessment_type, locale)
            }
        };

        Ok(Self {
            questionnaire,
            rules: default_rules(),
            store,
            history: None,
            key,
            locale,
            session,
        })
    }

    /// Replace the recommendation add-on rules.
    pub fn with_rules(mut self, rules: Vec<RecommendationRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Append completed results to `history`.
    pub fn with_history(mut self, history: AssessmentHistory) -> Self {
        self.history = Some(history);
        self
    }

    pub fn session(&self) -> &AssessmentSession {
        &self.session
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    /// Key the session is stored under.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Validate and record an answer, then persist the session.
    ///
    /// # Errors
    /// `UnknownQuestion` for ids outside the questionnaire, `Validation` for
    /// unacceptable values, `SessionCompleted` once sealed. The session is
    /// left untouched on error.
    pub async fn answer_question(
        &mut self,
        question_id: &str,
        value: impl Into<AnswerValue>,
    ) -> AppResult<SaveTier> {
        if self.session.is_completed() {
            return Err(AssessmentError::SessionCompleted {
                session_id: self.session.id.clone(),
            }
            .into());
        }

        let question = self.questionnaire.question(question_id).ok_or_else(|| {
            AssessmentError::UnknownQuestion {
                question_id: question_id.to_string(),
            }
        })?;
        let value = value.into();
        question.validate_answer(&value)?;

        let mut updated = self.session.clone();
        updated.record_answer(Answer::new(question_id, value))?;
        let tier = self.store.save(&self.key, &updated).await?;
        self.session = updated;
        debug!(session_id = %self.session.id, question_id = %question_id, tier = ?tier, "Recorded answer");

        Ok(tier)
    }

    /// Score the session, seal it and persist it.
    ///
    /// # Errors
    /// `Incomplete` listing unanswered required questions, or
    /// `SessionCompleted` when already sealed. The session stays open when
    /// it cannot be saved.
    pub async fn complete_assessment(&mut self) -> AppResult<AssessmentResult> {
        if self.session.is_completed() {
            return Err(AssessmentError::SessionCompleted {
                session_id: self.session.id.clone(),
            }
            .into());
        }

        let missing = self.session.missing_required(&self.questionnaire);
        if !missing.is_empty() {
            return Err(AssessmentError::Incomplete { missing }.into());
        }

        let result = AssessmentResult::evaluate(&self.questionnaire, &self.session.answers, &self.rules);
        let mut sealed = self.session.clone();
        sealed.seal(result.clone())?;

        let tier = self.store.save(&self.key, &sealed).await?;
        self.session = sealed;
        info!(
            session_id = %self.session.id,
            score = result.score,
            percentage = result.percentage,
            severity = %result.severity,
            tier = ?tier,
            "Assessment completed"
        );

        if let (Some(history), Some(entry)) = (&self.history, HistoryEntry::from_session(&self.session)) {
            history.record(entry).await;
        }

        Ok(result)
    }

    /// Drop stored progress and start a fresh session.
    pub async fn reset(&mut self) -> AppResult<()> {
        self.store.clear(&self.key).await?;
        self.session = AssessmentSession::new(self.questionnaire.assessment_type, self.locale);
        info!(key = %self.key, session_id = %self.session.id, "Assessment reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{pain_impact_questionnaire, Severity};
    use crate::error::AppError;
    use crate::error::{StorageError, StorageResult};
    use crate::storage::{KeyValueStore, MemoryStore, NamespacedStorage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Memory store that rejects every write while `full` is set.
    struct GatedStore {
        inner: MemoryStore,
        full: Arc<AtomicBool>,
    }

    #[async_trait]
    impl KeyValueStore for GatedStore {
        fn backend_name(&self) -> &'static str {
            "gated"
        }

        async fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            if self.full.load(Ordering::SeqCst) {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    requested: key.len() + value.len(),
                    limit: 0,
                });
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> StorageResult<()> {
            self.inner.remove(key).await
        }

        async fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
            self.inner.keys_with_prefix(prefix).await
        }
    }

    fn gated() -> (TieredSessionStore, Arc<AtomicBool>) {
        let full = Arc::new(AtomicBool::new(false));
        let store = |full: &Arc<AtomicBool>| -> Arc<dyn KeyValueStore> {
            Arc::new(GatedStore {
                inner: MemoryStore::new(),
                full: full.clone(),
            })
        };
        (TieredSessionStore::new(store(&full), store(&full)), full)
    }

    fn tiered() -> TieredSessionStore {
        TieredSessionStore::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    async fn calculator(store: TieredSessionStore) -> PainImpactCalculator {
        PainImpactCalculator::load_or_start(pain_impact_questionnaire(), store, "tester", Locale::En)
            .await
            .unwrap()
    }

    async fn answer_minimum(calc: &mut PainImpactCalculator) {
        calc.answer_question("pain_intensity", "low").await.unwrap();
        calc.answer_question("pain_duration", "less_than_day").await.unwrap();
        calc.answer_question("symptoms", vec!["none"]).await.unwrap();
        calc.answer_question("work_impact", "no_impact").await.unwrap();
    }

    #[tokio::test]
    async fn test_storage_key() {
        let calc = calculator(tiered()).await;
        assert_eq!(calc.storage_key(), "periodhub_pain_impact_tester");
    }

    #[tokio::test]
    async fn test_unknown_question_rejected() {
        let mut calc = calculator(tiered()).await;
        let err = calc.answer_question("favourite_colour", "blue").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Assessment(AssessmentError::UnknownQuestion { .. })
        ));
        assert!(calc.session().answers.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_value_leaves_session_unchanged() {
        let mut calc = calculator(tiered()).await;
        let err = calc.answer_question("pain_intensity", "unbearable").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Assessment(AssessmentError::Validation { .. })
        ));
        assert!(calc.session().answers.is_empty());
    }

    #[tokio::test]
    async fn test_complete_requires_answers() {
        let mut calc = calculator(tiered()).await;
        calc.answer_question("pain_intensity", "high").await.unwrap();
        let err = calc.complete_assessment().await.unwrap_err();
        match err {
            AppError::Assessment(AssessmentError::Incomplete { missing }) => {
                assert_eq!(missing, vec!["pain_duration", "symptoms", "work_impact"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_minimum_answers_are_mild() {
        let mut calc = calculator(tiered()).await;
        answer_minimum(&mut calc).await;
        let result = calc.complete_assessment().await.unwrap();
        assert_eq!(result.percentage, 0);
        assert_eq!(result.severity, Severity::Mild);
        assert!(calc.session().is_completed());

        let err = calc.answer_question("pain_intensity", "high").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Assessment(AssessmentError::SessionCompleted { .. })
        ));
    }

    #[tokio::test]
    async fn test_progress_survives_reload() {
        let store = tiered();
        let mut calc = calculator(store.clone()).await;
        calc.answer_question("pain_intensity", "moderate").await.unwrap();
        let session_id = calc.session().id.clone();

        let resumed = calculator(store).await;
        assert_eq!(resumed.session().id, session_id);
        assert_eq!(resumed.session().answers.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_clears_storage() {
        let store = tiered();
        let mut calc = calculator(store.clone()).await;
        calc.answer_question("pain_intensity", "moderate").await.unwrap();
        let old_id = calc.session().id.clone();

        calc.reset().await.unwrap();
        assert_ne!(calc.session().id, old_id);
        assert!(calc.session().answers.is_empty());
        assert!(store.load(calc.storage_key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unsaved_answer_is_not_kept() {
        let (store, full) = gated();
        let mut calc = calculator(store.clone()).await;
        full.store(true, Ordering::SeqCst);

        let err = calc.answer_question("pain_intensity", "high").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Storage(StorageError::TiersExhausted { .. })
        ));
        assert!(calc.session().answers.is_empty());
    }

    #[tokio::test]
    async fn test_unsaved_completion_can_be_retried() {
        let (store, full) = gated();
        let history = AssessmentHistory::new(
            NamespacedStorage::new(Arc::new(MemoryStore::new()), "medicalCareGuide"),
            10,
        );
        let mut calc = calculator(store.clone()).await.with_history(history.clone());
        answer_minimum(&mut calc).await;

        full.store(true, Ordering::SeqCst);
        let err = calc.complete_assessment().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Storage(StorageError::TiersExhausted { .. })
        ));
        assert!(!calc.session().is_completed());
        assert!(history.entries().await.is_empty());
        let stored = store.load(calc.storage_key()).await.unwrap().unwrap();
        assert!(!stored.is_completed());

        full.store(false, Ordering::SeqCst);
        let result = calc.complete_assessment().await.unwrap();
        assert_eq!(result.percentage, 0);
        assert!(calc.session().is_completed());
        assert_eq!(history.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_completion_recorded_in_history() {
        let history = AssessmentHistory::new(
            NamespacedStorage::new(Arc::new(MemoryStore::new()), "medicalCareGuide"),
            10,
        );
        let mut calc = calculator(tiered()).await.with_history(history.clone());
        answer_minimum(&mut calc).await;
        calc.complete_assessment().await.unwrap();

        let entries = history.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].session_id, calc.session().id);
    }
}
