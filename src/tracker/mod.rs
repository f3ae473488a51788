//! Pain tracking: levels, persisted entries and statistics.

mod charts;
mod cycle;

pub use charts::*;
pub use cycle::*;

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::assessment::{paginate, Page, Severity};
use crate::error::{AssessmentError, EngineResult, StorageResult};
use crate::storage::{NamespacedStorage, WriteOutcome};

/// Namespace of the pain tracker.
pub const TRACKER_NAMESPACE: &str = "painTracker";

/// Key of the entry list inside [`TRACKER_NAMESPACE`].
pub const ENTRIES_KEY: &str = "entries";

/// Pain on a 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PainLevel(u8);

impl PainLevel {
    pub const MAX: u8 = 10;

    pub fn new(level: u8) -> EngineResult<Self> {
        if level > Self::MAX {
            return Err(AssessmentError::validation(
                "pain_level",
                format!("{} is outside 0..={}", level, Self::MAX),
            ));
        }
        Ok(Self(level))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// i18n key of the advice for this level.
    pub fn advice_key(&self) -> String {
        format!("painTool.levels.{}.advice", self.0)
    }

    pub fn severity(&self) -> Severity {
        Severity::from_pain_level(self.0)
    }
}

impl TryFrom<u8> for PainLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        PainLevel::new(level).map_err(|e| e.to_string())
    }
}

impl From<PainLevel> for u8 {
    fn from(level: PainLevel) -> Self {
        level.0
    }
}

impl std::fmt::Display for PainLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One day's pain record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainEntry {
    pub id: String,
    pub date: NaiveDate,
    pub level: PainLevel,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl PainEntry {
    pub fn new(date: NaiveDate, level: PainLevel) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            level,
            locations: Vec::new(),
            notes: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Summary over tracked entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainStatistics {
    pub total_entries: usize,
    /// Rounded to one decimal, `0.0` without entries.
    pub average_level: f64,
    pub max_level: Option<PainLevel>,
    /// Up to three locations, most frequent first.
    pub most_common_locations: Vec<(String, usize)>,
}

/// Count locations, most frequent first, ties by name.
pub(crate) fn location_counts(entries: &[PainEntry]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for location in entries.iter().flat_map(|e| e.locations.iter()) {
        *counts.entry(location.as_str()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(location, count)| (location.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Statistics over `entries`.
pub fn pain_statistics(entries: &[PainEntry]) -> PainStatistics {
    let total_entries = entries.len();
    let average_level = if total_entries == 0 {
        0.0
    } else {
        let sum: f64 = entries.iter().map(|e| f64::from(e.level.value())).sum();
        (sum / total_entries as f64 * 10.0).round() / 10.0
    };
    let mut most_common_locations = location_counts(entries);
    most_common_locations.truncate(3);

    PainStatistics {
        total_entries,
        average_level,
        max_level: entries.iter().map(|e| e.level).max(),
        most_common_locations,
    }
}

/// Pain entries persisted through [`NamespacedStorage`], kept sorted by date.
#[derive(Clone)]
pub struct PainTracker {
    storage: NamespacedStorage,
}

impl PainTracker {
    /// Tracker over `storage`'s backend, scoped to [`TRACKER_NAMESPACE`].
    pub fn new(storage: &NamespacedStorage) -> Self {
        Self {
            storage: storage.scoped(TRACKER_NAMESPACE),
        }
    }

    /// All entries, oldest first.
    pub async fn entries(&self) -> Vec<PainEntry> {
        self.storage.get_item(ENTRIES_KEY, Vec::new()).await
    }

    pub async fn add_entry(&self, entry: PainEntry) -> WriteOutcome {
        let mut entries = self.entries().await;
        let date = entry.date;
        entries.push(entry);
        entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.recorded_at.cmp(&b.recorded_at)));

        let outcome = self.storage.set_item(ENTRIES_KEY, &entries).await;
        info!(date = %date, entries = entries.len(), ?outcome, "Recorded pain entry");
        outcome
    }

    /// Remove an entry by id. `Ok(false)` when there was none.
    pub async fn remove_entry(&self, id: &str) -> StorageResult<bool> {
        let mut entries = self.entries().await;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        Ok(self.storage.set_item(ENTRIES_KEY, &entries).await.is_stored())
    }

    pub async fn statistics(&self) -> PainStatistics {
        pain_statistics(&self.entries().await)
    }

    /// One page of entries, newest first.
    pub async fn page(&self, page: usize, page_size: usize) -> Page<PainEntry> {
        let mut entries = self.entries().await;
        entries.reverse();
        paginate(&entries, page, page_size)
    }

    pub async fn clear(&self) -> StorageResult<()> {
        self.storage.remove_item(ENTRIES_KEY).await
    }
}
