use serde::{Deserialize, Serialize};
use tracing::info;

use super::{AssessmentResult, AssessmentSession, AssessmentType, Locale};
use crate::error::StorageResult;
use crate::storage::{NamespacedStorage, WriteOutcome};

/// Key of the history list inside its namespace.
pub const HISTORY_KEY: &str = "assessmentHistory";

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Slice `items` into 1-based pages.
///
/// Page 0 reads as page 1 and a page size of 0 as 1. Pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size).min(total_items);
    let end = start.saturating_add(page_size).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// A completed assessment kept for later review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub session_id: String,
    pub assessment_type: AssessmentType,
    pub locale: Locale,
    pub result: AssessmentResult,
}

impl HistoryEntry {
    /// Entry for a sealed session, `None` when it has no result.
    pub fn from_session(session: &AssessmentSession) -> Option<Self> {
        session.result.as_ref().map(|result| Self {
            session_id: session.id.clone(),
            assessment_type: session.assessment_type,
            locale: session.locale,
            result: result.clone(),
        })
    }
}

/// Bounded, newest-first list of completed assessments.
#[derive(Clone)]
pub struct AssessmentHistory {
    storage: NamespacedStorage,
    limit: usize,
}

impl AssessmentHistory {
    pub fn new(storage: NamespacedStorage, limit: usize) -> Self {
        Self {
            storage,
            limit: limit.max(1),
        }
    }

    /// All entries, newest first.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.storage.get_item(HISTORY_KEY, Vec::new()).await
    }

    /// Prepend an entry, dropping the oldest beyond the limit.
    ///
    /// An entry whose session is already recorded replaces the old one.
    pub async fn record(&self, entry: HistoryEntry) -> WriteOutcome {
        let mut entries = self.entries().await;
        entries.retain(|e| e.session_id != entry.session_id);
        entries.insert(0, entry);
        entries.truncate(self.limit);

        let outcome = self.storage.set_item(HISTORY_KEY, &entries).await;
        info!(entries = entries.len(), ?outcome, "Recorded assessment history");
        outcome
    }

    /// One page of entries, newest first.
    pub async fn page(&self, page: usize, page_size: usize) -> Page<HistoryEntry> {
        paginate(&self.entries().await, page, page_size)
    }

    /// Remove every entry.
    pub async fn clear(&self) -> StorageResult<()> {
        self.storage.remove_item(HISTORY_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{pain_impact_questionnaire, AssessmentResult};
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn history(limit: usize) -> AssessmentHistory {
        let storage = NamespacedStorage::new(Arc::new(MemoryStore::new()), "medicalCareGuide");
        AssessmentHistory::new(storage, limit)
    }

    fn entry() -> HistoryEntry {
        let mut session = AssessmentSession::new(AssessmentType::PainImpact, Locale::En);
        let result = AssessmentResult::evaluate(&pain_impact_questionnaire(), &[], &[]);
        session.seal(result).unwrap();
        HistoryEntry::from_session(&session).unwrap()
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=25).collect();

        let first = paginate(&items, 1, 10);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = paginate(&items, 3, 10);
        assert_eq!(last.items, vec![21, 22, 23, 24, 25]);
        assert!(!last.has_next());

        assert!(paginate(&items, 9, 10).items.is_empty());
        assert_eq!(paginate(&items, 0, 0).items, vec![1]);
    }

    #[test]
    fn test_paginate_empty() {
        let page = paginate::<u32>(&[], 1, 10);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next());
    }

    #[test]
    fn test_from_open_session_is_none() {
        let session = AssessmentSession::new(AssessmentType::PainImpact, Locale::En);
        assert!(HistoryEntry::from_session(&session).is_none());
    }

    #[tokio::test]
    async fn test_record_newest_first_and_bounded() {
        let history = history(2);
        let first = entry();
        let second = entry();
        let third = entry();

        history.record(first).await;
        history.record(second.clone()).await;
        assert!(history.record(third.clone()).await.is_stored());

        let entries = history.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].session_id, third.session_id);
        assert_eq!(entries[1].session_id, second.session_id);
    }

    #[tokio::test]
    async fn test_record_same_session_replaces() {
        let history = history(10);
        let entry = entry();
        history.record(entry.clone()).await;
        history.record(entry).await;
        assert_eq!(history.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let history = history(10);
        history.record(entry()).await;
        history.clear().await.unwrap();
        assert!(history.entries().await.is_empty());
        assert_eq!(history.page(1, 10).await.total_items, 0);
    }
}
