use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::schedule_window::{ScheduleSet, free_times};
use crate::model::leave_request::{Coverage, RequestSpan};
use crate::model::public_holiday::PublicHolidayDay;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RequestDuration {
    /// Worked half-days covered by the request, in days.
    #[schema(example = 4.5)]
    pub working_days: f64,
    #[schema(example = 7)]
    pub calendar_days: u32,
}

/// Counts the half-days a request takes out of the member's working time.
///
/// A half-day counts when the request covers it, the schedule in force has
/// it enabled and no public holiday falls on it.
pub fn request_duration(
    span: &RequestSpan,
    schedules: &ScheduleSet,
    holidays: &[PublicHolidayDay],
) -> RequestDuration {
    if span.end_date < span.start_date {
        return RequestDuration { working_days: 0.0, calendar_days: 0 };
    }

    let mut holiday_cover: HashMap<NaiveDate, Coverage> = HashMap::new();
    for holiday in holidays {
        let entry = holiday_cover.entry(holiday.date).or_default();
        *entry = entry.union(holiday.coverage());
    }

    let mut half_days = 0u32;
    for day in span.start_date.iter_days().take_while(|d| *d <= span.end_date) {
        let covered = span.covered_halves(day);
        let off: Coverage = free_times(day, schedules.for_date(day)).into();
        let off = off.union(holiday_cover.get(&day).copied().unwrap_or_default());
        half_days += u32::from(covered.morning && !off.morning);
        half_days += u32::from(covered.afternoon && !off.afternoon);
    }

    let calendar_days = (span.end_date - span.start_date).num_days() as u32 + 1;
    RequestDuration {
        working_days: f64::from(half_days) / 2.0,
        calendar_days,
    }
}

/// First and last day of the fiscal year containing `date`.
///
/// `start_month` is 1-based; values outside 1..=12 fall back to January.
pub fn fiscal_year_bounds(date: NaiveDate, start_month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let month = if (1..=12).contains(&start_month) { start_month } else { 1 };
    let start_year = if date.month() >= month {
        date.year()
    } else {
        date.year() - 1
    };
    let first = NaiveDate::from_ymd_opt(start_year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(start_year + 1, month, 1)?.pred_opt()?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::{EndAt, StartAt};
    use crate::model::public_holiday::HolidayDuration;
    use crate::model::schedule::WeekSchedule;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn span(start: NaiveDate, start_at: StartAt, end: NaiveDate, end_at: EndAt) -> RequestSpan {
        RequestSpan { start_date: start, start_at, end_date: end, end_at }
    }

    #[test]
    fn full_week_over_a_weekend() {
        // Wed 2026-03-04 .. Tue 2026-03-10
        let request = span(d(2026, 3, 4), StartAt::Morning, d(2026, 3, 10), EndAt::EndOfDay);
        let duration = request_duration(&request, &ScheduleSet::default(), &[]);
        assert_eq!(duration.working_days, 5.0);
        assert_eq!(duration.calendar_days, 7);
    }

    #[test]
    fn half_days_and_holidays_reduce_the_count() {
        let request = span(d(2026, 3, 2), StartAt::Afternoon, d(2026, 3, 4), EndAt::Lunchtime);
        let holidays = vec![PublicHolidayDay {
            id: 1,
            public_holiday_id: 1,
            date: d(2026, 3, 3),
            year: 2026,
            name: "Local".into(),
            duration: HolidayDuration::Afternoon,
        }];
        let duration = request_duration(&request, &ScheduleSet::default(), &holidays);
        // Mon pm, Tue am, Wed am
        assert_eq!(duration.working_days, 1.5);
        assert_eq!(duration.calendar_days, 3);
    }

    #[test]
    fn part_time_schedule_only_counts_worked_halves() {
        let mut week = WeekSchedule::default();
        week.day_mut(Weekday::Mon).pm_enabled = false;
        let schedules = ScheduleSet::new(week, Vec::new());
        let request = span(d(2026, 3, 2), StartAt::Morning, d(2026, 3, 2), EndAt::EndOfDay);
        assert_eq!(request_duration(&request, &schedules, &[]).working_days, 0.5);
    }

    #[test]
    fn fiscal_year_starting_in_april() {
        assert_eq!(
            fiscal_year_bounds(d(2026, 3, 31), 4),
            Some((d(2025, 4, 1), d(2026, 3, 31)))
        );
        assert_eq!(
            fiscal_year_bounds(d(2026, 4, 1), 4),
            Some((d(2026, 4, 1), d(2027, 3, 31)))
        );
        assert_eq!(
            fiscal_year_bounds(d(2026, 7, 15), 0),
            Some((d(2026, 1, 1), d(2026, 12, 31)))
        );
    }
}
