//! Integration tests for the pain tracker and cycle phases

use std::sync::Arc;

use chrono::NaiveDate;

use periodhub_assessment::assessment::Severity;
use periodhub_assessment::storage::{NamespacedStorage, SqliteStore};
use periodhub_assessment::tracker::{
    cycle_status, location_distribution, pain_trend, CyclePhase, PainEntry, PainLevel,
    PainTracker,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
}

async fn create_tracker() -> PainTracker {
    let store = Arc::new(SqliteStore::new_in_memory().await.unwrap());
    PainTracker::new(&NamespacedStorage::new(store, "medicalCareGuide"))
}

#[cfg(test)]
mod tracker_tests {
    use super::*;

    #[tokio::test]
    async fn test_entries_persist_and_chart() {
        let tracker = create_tracker().await;
        for (d, level, location) in [(2, 6, "back"), (1, 8, "lower_abdomen"), (3, 3, "lower_abdomen")] {
            let entry = PainEntry::new(day(d), PainLevel::new(level).unwrap()).with_locations([location]);
            assert!(tracker.add_entry(entry).await.is_stored());
        }

        let entries = tracker.entries().await;
        let trend = pain_trend(&entries, 30);
        assert_eq!(trend.labels, vec!["2026-05-01", "2026-05-02", "2026-05-03"]);
        assert_eq!(trend.datasets[0].data, vec![8.0, 6.0, 3.0]);

        let locations = location_distribution(&entries);
        assert_eq!(locations.labels[0], "lower_abdomen");

        let stats = tracker.statistics().await;
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.average_level, 5.7);
        assert_eq!(stats.max_level.map(|l| l.severity()), Some(Severity::Emergency));
    }

    #[tokio::test]
    async fn test_clear() {
        let tracker = create_tracker().await;
        tracker.add_entry(PainEntry::new(day(1), PainLevel::new(2).unwrap())).await;
        tracker.clear().await.unwrap();
        assert!(tracker.entries().await.is_empty());
    }

    #[test]
    fn test_advice_per_level() {
        for level in 0..=10 {
            let level = PainLevel::new(level).unwrap();
            assert_eq!(level.advice_key(), format!("painTool.levels.{}.advice", level));
        }
        assert!(PainLevel::new(11).is_err());
    }
}

#[cfg(test)]
mod cycle_tests {
    use super::*;

    #[test]
    fn test_phase_through_cycle() {
        let phases: Vec<CyclePhase> = (1..=28)
            .map(|d| cycle_status(day(1), day(1) + chrono::Duration::days(d - 1), 28).unwrap().phase)
            .collect();

        assert!(phases[..5].iter().all(|p| *p == CyclePhase::Menstrual));
        assert_eq!(phases[5], CyclePhase::Follicular);
        assert_eq!(phases[13], CyclePhase::Ovulation);
        assert_eq!(phases[27], CyclePhase::Luteal);
    }

    #[test]
    fn test_tips_key() {
        let status = cycle_status(day(1), day(14), 28).unwrap();
        assert_eq!(status.phase, CyclePhase::Ovulation);
        assert_eq!(status.tips_key, "workplace.phases.ovulation.tips");
    }
}
