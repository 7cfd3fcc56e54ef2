//! Recurrence validation for time-window filters.
//!
//! [`validate_time_window`] decides whether a time-window filter's recurrence
//! configuration is internally consistent. It reports *every* applicable
//! violation rather than stopping at the first one: a missing `daysOfWeek`
//! blocks the weekly-gap check but not, say, the overall-duration guard.

use chrono::{Datelike, Duration};

use crate::flags::{DayOfWeek, RecurrenceRangeType, RecurrenceType, TimeWindowSettings};

/// The long-duration guard: a recurring window must span less than this many
/// days (ten years).
const MAX_TIME_WINDOW_DAYS: i64 = 3650;

/// A single violation, attributed to the stored field it concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowViolation {
    /// Stored field name, camelCase as persisted, e.g. `"recurrenceInterval"`.
    pub field: &'static str,
    pub kind: TimeWindowViolationKind,
}

impl std::fmt::Display for TimeWindowViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)
    }
}

/// The kinds of inconsistency a time-window filter can exhibit.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TimeWindowViolationKind {
    /// Neither `start` nor `end` is set.
    #[error("at least one of start or end is required")]
    MissingStartOrEnd,

    /// `end` is strictly before `start`.
    #[error("end must be after start")]
    EndBeforeStart,

    /// `end` equals `start`, leaving a zero-length window.
    #[error("end must not equal start")]
    EndEqualsStart,

    /// A recurrence pattern is set but the interval is absent or not positive.
    #[error("recurrence interval must be a positive integer")]
    InvalidInterval,

    /// Weekly pattern without any days of week.
    #[error("weekly recurrence requires at least one day of week")]
    MissingDaysOfWeek,

    /// Weekly pattern without a first day of week.
    #[error("weekly recurrence requires a first day of week")]
    MissingFirstDayOfWeek,

    /// `EndDate` range without a recurrence end date.
    #[error("recurrence end date is required")]
    MissingRecurrenceEndDate,

    /// Recurrence end date earlier than the window start.
    #[error("recurrence end date must not be earlier than start")]
    RecurrenceEndDateBeforeStart,

    /// `Numbered` range with an absent or non-positive occurrence count.
    #[error("number of occurrences must be a positive integer")]
    InvalidOccurrenceCount,

    /// The window spans ten years or more.
    #[error("time window is too long for a recurring schedule")]
    TimeWindowTooLong,

    /// The window duration exceeds what the recurrence pattern allows, either
    /// the interval itself or the minimum gap between matched weekdays.
    #[error("time window duration exceeds the recurrence schedule")]
    DurationExceedsRecurrence,

    /// The start timestamp's weekday is not one of the configured days of
    /// week, so the pattern can never fire on the given start date.
    #[error("start day is not one of the recurrence days of week")]
    StartDayNotInDaysOfWeek,
}

/// Validate a time-window filter's recurrence configuration.
///
/// Returns the full list of violations; an empty list means the configuration
/// is internally consistent.
pub fn validate_time_window(settings: &TimeWindowSettings) -> Vec<TimeWindowViolation> {
    let mut violations = Vec::new();

    if settings.start.is_none() && settings.end.is_none() {
        violations.push(TimeWindowViolation {
            field: "start",
            kind: TimeWindowViolationKind::MissingStartOrEnd,
        });
    }

    if let (Some(start), Some(end)) = (settings.start, settings.end) {
        if end < start {
            violations.push(TimeWindowViolation {
                field: "end",
                kind: TimeWindowViolationKind::EndBeforeStart,
            });
        } else if end == start {
            violations.push(TimeWindowViolation {
                field: "end",
                kind: TimeWindowViolationKind::EndEqualsStart,
            });
        }
    }

    let interval = match settings.recurrence_type {
        Some(_) => match settings.recurrence_interval {
            Some(interval) if interval > 0 => Some(interval),
            _ => {
                violations.push(TimeWindowViolation {
                    field: "recurrenceInterval",
                    kind: TimeWindowViolationKind::InvalidInterval,
                });
                None
            }
        },
        None => None,
    };

    if settings.recurrence_type == Some(RecurrenceType::Weekly) {
        if settings.days_of_week.is_empty() {
            violations.push(TimeWindowViolation {
                field: "daysOfWeek",
                kind: TimeWindowViolationKind::MissingDaysOfWeek,
            });
        }
        if settings.first_day_of_week.is_none() {
            violations.push(TimeWindowViolation {
                field: "firstDayOfWeek",
                kind: TimeWindowViolationKind::MissingFirstDayOfWeek,
            });
        }
    }

    match settings.recurrence_range_type {
        Some(RecurrenceRangeType::EndDate) => match settings.recurrence_end_date {
            None => violations.push(TimeWindowViolation {
                field: "recurrenceEndDate",
                kind: TimeWindowViolationKind::MissingRecurrenceEndDate,
            }),
            Some(end_date) => {
                if settings.start.is_some_and(|start| end_date < start) {
                    violations.push(TimeWindowViolation {
                        field: "recurrenceEndDate",
                        kind: TimeWindowViolationKind::RecurrenceEndDateBeforeStart,
                    });
                }
            }
        },
        Some(RecurrenceRangeType::Numbered) => {
            if !settings.recurrence_occurrences.is_some_and(|n| n > 0) {
                violations.push(TimeWindowViolation {
                    field: "recurrenceOccurrences",
                    kind: TimeWindowViolationKind::InvalidOccurrenceCount,
                });
            }
        }
        None => {}
    }

    // Compliance checks need a recurrence pattern and a well-formed window.
    let (Some(pattern), Some(start), Some(end)) =
        (settings.recurrence_type, settings.start, settings.end)
    else {
        return violations;
    };
    if end <= start {
        return violations;
    }

    let duration = end - start;

    if duration >= Duration::days(MAX_TIME_WINDOW_DAYS) {
        violations.push(TimeWindowViolation {
            field: "end",
            kind: TimeWindowViolationKind::TimeWindowTooLong,
        });
    }

    match pattern {
        RecurrenceType::Daily => {
            if let Some(interval) = interval {
                if duration > Duration::days(i64::from(interval)) {
                    violations.push(TimeWindowViolation {
                        field: "end",
                        kind: TimeWindowViolationKind::DurationExceedsRecurrence,
                    });
                }
            }
        }
        RecurrenceType::Weekly => {
            if !settings.days_of_week.is_empty() {
                let start_day = DayOfWeek::from(start.weekday());
                if !settings.days_of_week.contains(&start_day) {
                    violations.push(TimeWindowViolation {
                        field: "start",
                        kind: TimeWindowViolationKind::StartDayNotInDaysOfWeek,
                    });
                }
            }

            if let (Some(interval), Some(first_day)) = (interval, settings.first_day_of_week) {
                if !settings.days_of_week.is_empty() {
                    let gap = minimum_occurrence_gap(&settings.days_of_week, first_day, interval);
                    if duration > Duration::days(gap) {
                        violations.push(TimeWindowViolation {
                            field: "end",
                            kind: TimeWindowViolationKind::DurationExceedsRecurrence,
                        });
                    }
                }
            }
        }
    }

    violations
}

/// Minimum gap, in days, between two consecutive occurrences implied by a
/// weekly pattern. This is the ceiling on the allowed window duration.
///
/// Days are normalized to their offset from `first_day`, sorted, and the
/// circular gap between each consecutive pair is taken. The wrap-around gap
/// from the last day back to the first only binds at interval 1: at larger
/// intervals the pattern skips whole weeks before repeating, so the gap to the
/// next cycle is at least a full interval and never the minimum.
fn minimum_occurrence_gap(days: &[DayOfWeek], first_day: DayOfWeek, interval: i32) -> i64 {
    let mut offsets: Vec<i64> = days
        .iter()
        .map(|day| i64::from(day.days_from(first_day)))
        .collect();
    offsets.sort_unstable();
    offsets.dedup();

    // The interval itself caps the duration even for a single matched day.
    let mut min_gap = i64::from(interval) * 7;

    for pair in offsets.windows(2) {
        min_gap = min_gap.min(pair[1] - pair[0]);
    }

    if interval == 1 {
        if let (Some(first), Some(last)) = (offsets.first(), offsets.last()) {
            min_gap = min_gap.min(7 - last + first);
        }
    }

    min_gap
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::flags::Timestamp;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn kinds(settings: &TimeWindowSettings) -> Vec<TimeWindowViolationKind> {
        validate_time_window(settings)
            .into_iter()
            .map(|v| v.kind)
            .collect()
    }

    #[test]
    fn missing_both_bounds_is_reported() {
        let settings = TimeWindowSettings::default();
        assert_eq!(kinds(&settings), vec![TimeWindowViolationKind::MissingStartOrEnd]);
    }

    #[test]
    fn start_only_window_is_valid() {
        let settings = TimeWindowSettings {
            start: Some(at(2025, 6, 2, 0)),
            ..Default::default()
        };
        assert!(validate_time_window(&settings).is_empty());
    }

    #[test]
    fn end_before_and_equal_to_start_are_distinct_kinds() {
        let start = at(2025, 6, 2, 12);

        let before = TimeWindowSettings {
            start: Some(start),
            end: Some(at(2025, 6, 2, 11)),
            ..Default::default()
        };
        assert_eq!(kinds(&before), vec![TimeWindowViolationKind::EndBeforeStart]);

        let equal = TimeWindowSettings {
            start: Some(start),
            end: Some(start),
            ..Default::default()
        };
        assert_eq!(kinds(&equal), vec![TimeWindowViolationKind::EndEqualsStart]);
    }

    #[test]
    fn pattern_requires_positive_interval() {
        let settings = TimeWindowSettings {
            start: Some(at(2025, 6, 2, 0)),
            end: Some(at(2025, 6, 2, 8)),
            recurrence_type: Some(RecurrenceType::Daily),
            recurrence_interval: Some(0),
            ..Default::default()
        };
        assert_eq!(kinds(&settings), vec![TimeWindowViolationKind::InvalidInterval]);
    }

    #[test]
    fn weekly_requires_days_and_first_day() {
        let settings = TimeWindowSettings {
            start: Some(at(2025, 6, 2, 0)),
            end: Some(at(2025, 6, 2, 8)),
            recurrence_type: Some(RecurrenceType::Weekly),
            recurrence_interval: Some(1),
            ..Default::default()
        };
        let kinds = kinds(&settings);
        assert!(kinds.contains(&TimeWindowViolationKind::MissingDaysOfWeek));
        assert!(kinds.contains(&TimeWindowViolationKind::MissingFirstDayOfWeek));
    }

    #[test]
    fn end_date_range_requires_a_date_no_earlier_than_start() {
        let missing = TimeWindowSettings {
            start: Some(at(2025, 6, 2, 0)),
            end: Some(at(2025, 6, 2, 8)),
            recurrence_type: Some(RecurrenceType::Daily),
            recurrence_interval: Some(1),
            recurrence_range_type: Some(RecurrenceRangeType::EndDate),
            ..Default::default()
        };
        assert_eq!(
            kinds(&missing),
            vec![TimeWindowViolationKind::MissingRecurrenceEndDate]
        );

        let too_early = TimeWindowSettings {
            recurrence_end_date: Some(at(2025, 5, 1, 0)),
            ..missing
        };
        assert_eq!(
            kinds(&too_early),
            vec![TimeWindowViolationKind::RecurrenceEndDateBeforeStart]
        );
    }

    #[test]
    fn numbered_range_requires_positive_occurrences() {
        let settings = TimeWindowSettings {
            start: Some(at(2025, 6, 2, 0)),
            end: Some(at(2025, 6, 2, 8)),
            recurrence_type: Some(RecurrenceType::Daily),
            recurrence_interval: Some(1),
            recurrence_range_type: Some(RecurrenceRangeType::Numbered),
            recurrence_occurrences: None,
            ..Default::default()
        };
        assert_eq!(
            kinds(&settings),
            vec![TimeWindowViolationKind::InvalidOccurrenceCount]
        );
    }

    #[test]
    fn ten_year_windows_are_rejected() {
        let settings = TimeWindowSettings {
            start: Some(at(2020, 1, 1, 0)),
            end: Some(at(2031, 1, 1, 0)),
            recurrence_type: Some(RecurrenceType::Daily),
            // Interval large enough that only the long-duration guard trips.
            recurrence_interval: Some(5000),
            ..Default::default()
        };
        assert_eq!(kinds(&settings), vec![TimeWindowViolationKind::TimeWindowTooLong]);
    }

    #[test]
    fn daily_duration_must_fit_the_interval() {
        let ok = TimeWindowSettings {
            start: Some(at(2025, 6, 2, 0)),
            end: Some(at(2025, 6, 3, 0)),
            recurrence_type: Some(RecurrenceType::Daily),
            recurrence_interval: Some(1),
            ..Default::default()
        };
        assert!(validate_time_window(&ok).is_empty());

        let too_long = TimeWindowSettings {
            end: Some(at(2025, 6, 3, 1)),
            ..ok
        };
        assert_eq!(
            kinds(&too_long),
            vec![TimeWindowViolationKind::DurationExceedsRecurrence]
        );
    }

    #[test]
    fn weekly_single_day_allows_up_to_the_wrap_gap() {
        // 2025-06-02 is a Monday.
        let settings = TimeWindowSettings {
            start: Some(at(2025, 6, 2, 0)),
            end: Some(at(2025, 6, 2, 8)),
            recurrence_type: Some(RecurrenceType::Weekly),
            recurrence_interval: Some(1),
            days_of_week: vec![DayOfWeek::Monday],
            first_day_of_week: Some(DayOfWeek::Monday),
            ..Default::default()
        };
        assert!(validate_time_window(&settings).is_empty());

        // A full week still fits a single Monday pattern at interval 1.
        let week_long = TimeWindowSettings {
            end: Some(at(2025, 6, 9, 0)),
            ..settings.clone()
        };
        assert!(validate_time_window(&week_long).is_empty());
    }

    #[test]
    fn weekly_adjacent_days_bound_the_duration_by_their_gap() {
        // Monday and Tuesday, weekly at interval 1: occurrences are one day
        // apart, so a window longer than one day overlaps the next occurrence.
        let settings = TimeWindowSettings {
            start: Some(at(2025, 6, 2, 0)),
            end: Some(at(2025, 6, 5, 0)),
            recurrence_type: Some(RecurrenceType::Weekly),
            recurrence_interval: Some(1),
            days_of_week: vec![DayOfWeek::Monday, DayOfWeek::Tuesday],
            first_day_of_week: Some(DayOfWeek::Monday),
            ..Default::default()
        };
        assert_eq!(
            kinds(&settings),
            vec![TimeWindowViolationKind::DurationExceedsRecurrence]
        );
    }

    #[test]
    fn weekly_interval_above_one_ignores_the_wrap_gap() {
        // Single day at interval 2: next occurrence is two weeks out, so a
        // 10-day window fits.
        let settings = TimeWindowSettings {
            start: Some(at(2025, 6, 2, 0)),
            end: Some(at(2025, 6, 12, 0)),
            recurrence_type: Some(RecurrenceType::Weekly),
            recurrence_interval: Some(2),
            days_of_week: vec![DayOfWeek::Monday],
            first_day_of_week: Some(DayOfWeek::Monday),
            ..Default::default()
        };
        assert!(validate_time_window(&settings).is_empty());
    }

    #[test]
    fn weekly_start_day_must_be_listed() {
        // 2025-06-03 is a Tuesday.
        let settings = TimeWindowSettings {
            start: Some(at(2025, 6, 3, 0)),
            end: Some(at(2025, 6, 3, 8)),
            recurrence_type: Some(RecurrenceType::Weekly),
            recurrence_interval: Some(1),
            days_of_week: vec![DayOfWeek::Monday],
            first_day_of_week: Some(DayOfWeek::Monday),
            ..Default::default()
        };
        assert_eq!(
            kinds(&settings),
            vec![TimeWindowViolationKind::StartDayNotInDaysOfWeek]
        );
    }

    #[test]
    fn independent_violations_are_all_reported() {
        // Weekly pattern with a bad interval and no days: structural errors
        // stack up, and the missing days block only the gap check.
        let settings = TimeWindowSettings {
            start: Some(at(2025, 6, 2, 0)),
            end: Some(at(2025, 6, 2, 0)),
            recurrence_type: Some(RecurrenceType::Weekly),
            recurrence_interval: None,
            ..Default::default()
        };
        let kinds = kinds(&settings);
        assert!(kinds.contains(&TimeWindowViolationKind::EndEqualsStart));
        assert!(kinds.contains(&TimeWindowViolationKind::InvalidInterval));
        assert!(kinds.contains(&TimeWindowViolationKind::MissingDaysOfWeek));
        assert!(kinds.contains(&TimeWindowViolationKind::MissingFirstDayOfWeek));
    }
}
