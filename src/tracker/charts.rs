use serde::{Deserialize, Serialize};

use super::{location_counts, PainEntry};

/// Chart-shaped data: one label per point and one or more series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// A named series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// i18n key of the series name.
    pub label: String,
    pub data: Vec<f64>,
}

/// Reduce `points` to at most `max_points` by averaging consecutive buckets.
///
/// Each bucket keeps the label of its first point. Buckets differ in size by
/// at most one.
pub fn downsample(points: &[(String, f64)], max_points: usize) -> Vec<(String, f64)> {
    let max_points = max_points.max(1);
    if points.len() <= max_points {
        return points.to_vec();
    }

    let n = points.len();
    (0..max_points)
        .map(|bucket| {
            let start = bucket * n / max_points;
            let end = (bucket + 1) * n / max_points;
            let slice = &points[start..end];
            let average = slice.iter().map(|(_, v)| v).sum::<f64>() / slice.len() as f64;
            (slice[0].0.clone(), average)
        })
        .collect()
}

/// Pain level over time, oldest first, down-sampled to `max_points`.
pub fn pain_trend(entries: &[PainEntry], max_points: usize) -> ChartData {
    let mut sorted: Vec<&PainEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);

    let points: Vec<(String, f64)> = sorted
        .iter()
        .map(|e| (e.date.format("%Y-%m-%d").to_string(), f64::from(e.level.value())))
        .collect();
    let (labels, data) = downsample(&points, max_points).into_iter().unzip();

    ChartData {
        labels,
        datasets: vec![Dataset {
            label: "painTracker.charts.painLevel".to_string(),
            data,
        }],
    }
}

/// How often each pain location was recorded, most frequent first.
pub fn location_distribution(entries: &[PainEntry]) -> ChartData {
    let (labels, data) = location_counts(entries)
        .into_iter()
        .map(|(location, count)| (location, count as f64))
        .unzip();

    ChartData {
        labels,
        datasets: vec![Dataset {
            label: "painTracker.charts.locations".to_string(),
            data,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::PainLevel;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn entry(day: u32, level: u8) -> PainEntry {
        PainEntry::new(
            NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            PainLevel::new(level).unwrap(),
        )
    }

    fn points(values: &[f64]) -> Vec<(String, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("p{i}"), *v))
            .collect()
    }

    #[test]
    fn test_downsample_short_input_unchanged() {
        let input = points(&[1.0, 2.0]);
        assert_eq!(downsample(&input, 5), input);
    }

    #[test]
    fn test_downsample_bucket_average() {
        let input = points(&[1.0, 3.0, 5.0, 7.0, 9.0, 11.0]);
        let out = downsample(&input, 3);
        assert_eq!(
            out,
            vec![
                ("p0".to_string(), 2.0),
                ("p2".to_string(), 6.0),
                ("p4".to_string(), 10.0)
            ]
        );
    }

    #[test]
    fn test_downsample_uneven() {
        let input = points(&[1.0; 7]);
        let out = downsample(&input, 3);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|(_, v)| *v == 1.0));
    }

    #[test]
    fn test_pain_trend_sorted_by_date() {
        let chart = pain_trend(&[entry(3, 6), entry(1, 2), entry(2, 4)], 30);
        assert_eq!(chart.labels, vec!["2026-01-01", "2026-01-02", "2026-01-03"]);
        assert_eq!(chart.datasets[0].data, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_pain_trend_respects_max_points() {
        let entries: Vec<PainEntry> = (1..=28).map(|d| entry(d, (d % 11) as u8)).collect();
        let chart = pain_trend(&entries, 7);
        assert_eq!(chart.labels.len(), 7);
        assert_eq!(chart.datasets[0].data.len(), 7);
    }

    #[test]
    fn test_location_distribution() {
        let entries = vec![
            entry(1, 3).with_locations(["back", "lower_abdomen"]),
            entry(2, 3).with_locations(["lower_abdomen"]),
        ];
        let chart = location_distribution(&entries);
        assert_eq!(chart.labels, vec!["lower_abdomen", "back"]);
        assert_eq!(chart.datasets[0].data, vec![2.0, 1.0]);
    }
}
