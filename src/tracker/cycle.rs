use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AssessmentError, EngineResult};

/// Shortest accepted cycle, in days.
pub const MIN_CYCLE_LENGTH: u32 = 21;
/// Longest accepted cycle, in days.
pub const MAX_CYCLE_LENGTH: u32 = 45;
/// Cycle length used when none is given.
pub const DEFAULT_CYCLE_LENGTH: u32 = 28;

const MENSTRUAL_DAYS: u32 = 5;
const LUTEAL_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl CyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::Menstrual => "menstrual",
            CyclePhase::Follicular => "follicular",
            CyclePhase::Ovulation => "ovulation",
            CyclePhase::Luteal => "luteal",
        }
    }

    /// i18n key of the workplace tips for this phase.
    pub fn tips_key(&self) -> String {
        format!("workplace.phases.{}.tips", self.as_str())
    }

    /// Phase on 1-based `day` of a cycle of `cycle_length` days.
    ///
    /// Days 1-5 are menstrual; ovulation is `cycle_length - 14` give or take a day.
    pub fn for_day(day: u32, cycle_length: u32) -> Self {
        let ovulation_day = cycle_length.saturating_sub(LUTEAL_DAYS);
        if day <= MENSTRUAL_DAYS {
            CyclePhase::Menstrual
        } else if day.abs_diff(ovulation_day) <= 1 {
            CyclePhase::Ovulation
        } else if day < ovulation_day {
            CyclePhase::Follicular
        } else {
            CyclePhase::Luteal
        }
    }
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where `today` falls in the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStatus {
    /// 1-based.
    pub day_of_cycle: u32,
    pub cycle_length: u32,
    pub phase: CyclePhase,
    pub next_period_start: NaiveDate,
    pub days_until_next_period: u32,
    pub tips_key: String,
}

/// Compute the cycle status from the start of the last period.
///
/// Dates past one full cycle wrap around, assuming regular cycles.
///
/// # Errors
/// Validation error when `cycle_length` is outside 21..=45 or `today` is
/// before `last_period_start`.
pub fn cycle_status(
    last_period_start: NaiveDate,
    today: NaiveDate,
    cycle_length: u32,
) -> EngineResult<CycleStatus> {
    if !(MIN_CYCLE_LENGTH..=MAX_CYCLE_LENGTH).contains(&cycle_length) {
        return Err(AssessmentError::validation(
            "cycle_length",
            format!(
                "{} is outside {}..={}",
                cycle_length, MIN_CYCLE_LENGTH, MAX_CYCLE_LENGTH
            ),
        ));
    }

    let elapsed = (today - last_period_start).num_days();
    if elapsed < 0 {
        return Err(AssessmentError::validation(
            "last_period_start",
            "must not be in the future",
        ));
    }

    let length = i64::from(cycle_length);
    let cycles_done = elapsed / length;
    let day_of_cycle = (elapsed % length) as u32 + 1;
    let next_period_start = last_period_start
        .checked_add_signed(Duration::days((cycles_done + 1) * length))
        .ok_or_else(|| {
            AssessmentError::validation("last_period_start", "next period is past the last supported date")
        })?;
    let phase = CyclePhase::for_day(day_of_cycle, cycle_length);

    Ok(CycleStatus {
        day_of_cycle,
        cycle_length,
        phase,
        next_period_start,
        days_until_next_period: (next_period_start - today).num_days() as u32,
        tips_key: phase.tips_key(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    #[test]
    fn test_phases_for_28_day_cycle() {
        assert_eq!(CyclePhase::for_day(1, 28), CyclePhase::Menstrual);
        assert_eq!(CyclePhase::for_day(5, 28), CyclePhase::Menstrual);
        assert_eq!(CyclePhase::for_day(6, 28), CyclePhase::Follicular);
        assert_eq!(CyclePhase::for_day(12, 28), CyclePhase::Follicular);
        assert_eq!(CyclePhase::for_day(13, 28), CyclePhase::Ovulation);
        assert_eq!(CyclePhase::for_day(15, 28), CyclePhase::Ovulation);
        assert_eq!(CyclePhase::for_day(16, 28), CyclePhase::Luteal);
        assert_eq!(CyclePhase::for_day(28, 28), CyclePhase::Luteal);
    }

    #[test]
    fn test_short_cycle_goes_straight_to_ovulation() {
        assert_eq!(CyclePhase::for_day(6, 21), CyclePhase::Ovulation);
        assert_eq!(CyclePhase::for_day(9, 21), CyclePhase::Luteal);
    }

    #[test]
    fn test_cycle_status_first_day() {
        let status = cycle_status(date(3, 1), date(3, 1), 28).unwrap();
        assert_eq!(status.day_of_cycle, 1);
        assert_eq!(status.phase, CyclePhase::Menstrual);
        assert_eq!(status.next_period_start, date(3, 29));
        assert_eq!(status.days_until_next_period, 28);
        assert_eq!(status.tips_key, "workplace.phases.menstrual.tips");
    }

    #[test]
    fn test_cycle_status_wraps() {
        let status = cycle_status(date(1, 1), date(2, 5), 30).unwrap();
        // 35 days elapsed
        assert_eq!(status.day_of_cycle, 6);
        assert_eq!(status.next_period_start, date(3, 2));
        assert_eq!(status.days_until_next_period, 25);
    }

    #[test]
    fn test_cycle_length_bounds() {
        assert!(cycle_status(date(3, 1), date(3, 2), 20).is_err());
        assert!(cycle_status(date(3, 1), date(3, 2), 46).is_err());
        assert!(cycle_status(date(3, 1), date(3, 2), 21).is_ok());
        assert!(cycle_status(date(3, 1), date(3, 2), 45).is_ok());
    }

    #[test]
    fn test_next_period_past_calendar_end_rejected() {
        let err = cycle_status(NaiveDate::MAX, NaiveDate::MAX, 28).unwrap_err();
        assert!(err.to_string().contains("last supported date"));
    }

    #[test]
    fn test_future_period_rejected() {
        let err = cycle_status(date(3, 10), date(3, 1), 28).unwrap_err();
        assert!(err.to_string().contains("last_period_start"));
    }
}
