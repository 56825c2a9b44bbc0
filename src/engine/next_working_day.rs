use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::schedule_window::{FreeTimes, ScheduleSet, free_times};
use crate::model::leave_request::{Coverage, EndAt, RequestSpan, StartAt};
use crate::model::public_holiday::PublicHolidayDay;

/// Upper bound on the forward search, roughly five years.
pub const MAX_SEARCH_DAYS: u32 = 1825;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct NextWorkingDay {
    #[schema(example = "2026-03-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// First half of `date` the person is back at work.
    pub start_at: StartAt,
    /// Halves of `date` that are not worked (schedule, holiday or other leave).
    pub free_times: FreeTimes,
}

/// Finds the first half-day after `request` on which the person works.
///
/// Walks forward one day at a time, skipping full public holidays, days off
/// under the schedule in force and days fully taken by `other_requests`.
/// Returns `None` when nothing turns up within [`MAX_SEARCH_DAYS`]; callers
/// must escalate that instead of treating it as "no leave".
pub fn find_next_working_day(
    request: &RequestSpan,
    schedules: &ScheduleSet,
    holidays: &[PublicHolidayDay],
    other_requests: &[RequestSpan],
) -> Option<NextWorkingDay> {
    let mut holiday_cover: HashMap<NaiveDate, Coverage> = HashMap::new();
    for holiday in holidays {
        let entry = holiday_cover.entry(holiday.date).or_default();
        *entry = entry.union(holiday.coverage());
    }

    // A request ending at lunchtime leaves the afternoon of its last day open.
    let (mut day, mut taken) = match request.end_at {
        EndAt::EndOfDay => (request.end_date.succ_opt()?, Coverage::default()),
        EndAt::Lunchtime => (
            request.end_date,
            Coverage { morning: true, afternoon: false },
        ),
    };

    for _ in 0..MAX_SEARCH_DAYS {
        if let Some(found) = check_day(day, taken, schedules, &holiday_cover, other_requests) {
            return Some(found);
        }
        taken = Coverage::default();
        day = day.succ_opt()?;
    }
    None
}

fn check_day(
    day: NaiveDate,
    taken: Coverage,
    schedules: &ScheduleSet,
    holiday_cover: &HashMap<NaiveDate, Coverage>,
    other_requests: &[RequestSpan],
) -> Option<NextWorkingDay> {
    let mut blocked = taken;

    if let Some(holiday) = holiday_cover.get(&day) {
        blocked = blocked.union(*holiday);
        if blocked.is_full() {
            return None;
        }
    }

    blocked = blocked.union(free_times(day, schedules.for_date(day)).into());
    if blocked.is_full() {
        return None;
    }

    for other in other_requests {
        blocked = blocked.union(other.covered_halves(day));
    }
    if blocked.is_full() {
        return None;
    }

    Some(NextWorkingDay {
        date: day,
        start_at: if blocked.morning {
            StartAt::Afternoon
        } else {
            StartAt::Morning
        },
        free_times: blocked.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::public_holiday::HolidayDuration;
    use crate::model::schedule::WeekSchedule;
    use chrono::{Datelike, Weekday};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn holiday(date: NaiveDate, duration: HolidayDuration) -> PublicHolidayDay {
        PublicHolidayDay {
            id: 0,
            public_holiday_id: 1,
            date,
            year: date.year(),
            name: "Holiday".into(),
            duration,
        }
    }

    fn span(start: NaiveDate, start_at: StartAt, end: NaiveDate, end_at: EndAt) -> RequestSpan {
        RequestSpan { start_date: start, start_at, end_date: end, end_at }
    }

    // 2026-03-06 is a Friday.
    fn friday_request() -> RequestSpan {
        span(d(2026, 3, 2), StartAt::Morning, d(2026, 3, 6), EndAt::EndOfDay)
    }

    #[test]
    fn weekend_and_monday_holiday_lead_to_tuesday() {
        let holidays = vec![holiday(d(2026, 3, 9), HolidayDuration::FullDay)];
        let next =
            find_next_working_day(&friday_request(), &ScheduleSet::default(), &holidays, &[]).unwrap();
        assert_eq!(next.date, d(2026, 3, 10));
        assert_eq!(next.date.weekday(), Weekday::Tue);
        assert_eq!(next.start_at, StartAt::Morning);
        assert_eq!(next.free_times, FreeTimes::default());
    }

    #[test]
    fn lunchtime_end_returns_same_afternoon() {
        let request = span(d(2026, 3, 3), StartAt::Morning, d(2026, 3, 3), EndAt::Lunchtime);
        let next = find_next_working_day(&request, &ScheduleSet::default(), &[], &[]).unwrap();
        assert_eq!(next.date, d(2026, 3, 3));
        assert_eq!(next.start_at, StartAt::Afternoon);
        assert!(next.free_times.its_free_morning);
    }

    #[test]
    fn lunchtime_end_before_a_free_afternoon_moves_on() {
        let mut week = WeekSchedule::default();
        week.day_mut(Weekday::Fri).pm_enabled = false;
        let schedules = ScheduleSet::new(week, Vec::new());
        let request = span(d(2026, 3, 6), StartAt::Morning, d(2026, 3, 6), EndAt::Lunchtime);
        let next = find_next_working_day(&request, &schedules, &[], &[]).unwrap();
        assert_eq!(next.date, d(2026, 3, 9));
    }

    #[test]
    fn half_covered_day_returns_the_free_half() {
        let other = span(d(2026, 3, 9), StartAt::Morning, d(2026, 3, 9), EndAt::Lunchtime);
        let next =
            find_next_working_day(&friday_request(), &ScheduleSet::default(), &[], &[other]).unwrap();
        assert_eq!(next.date, d(2026, 3, 9));
        assert_eq!(next.start_at, StartAt::Afternoon);
        assert_eq!(
            next.free_times,
            FreeTimes { its_free_morning: true, its_free_afternoon: false }
        );
    }

    #[test]
    fn two_half_day_requests_fill_the_day() {
        let others = vec![
            span(d(2026, 3, 9), StartAt::Morning, d(2026, 3, 9), EndAt::Lunchtime),
            span(d(2026, 3, 9), StartAt::Afternoon, d(2026, 3, 9), EndAt::EndOfDay),
        ];
        let next =
            find_next_working_day(&friday_request(), &ScheduleSet::default(), &[], &others).unwrap();
        assert_eq!(next.date, d(2026, 3, 10));
    }

    #[test]
    fn morning_holiday_and_afternoon_leave_skip_the_day() {
        let holidays = vec![holiday(d(2026, 3, 9), HolidayDuration::Morning)];
        let others = vec![span(d(2026, 3, 9), StartAt::Afternoon, d(2026, 3, 9), EndAt::EndOfDay)];
        let next =
            find_next_working_day(&friday_request(), &ScheduleSet::default(), &holidays, &others)
                .unwrap();
        assert_eq!(next.date, d(2026, 3, 10));
    }

    #[test]
    fn member_schedule_change_applies_from_its_start() {
        let mut no_mondays = WeekSchedule::default();
        no_mondays.day_mut(Weekday::Mon).am_enabled = false;
        no_mondays.day_mut(Weekday::Mon).pm_enabled = false;
        let schedules = ScheduleSet::new(WeekSchedule::default(), vec![(d(2026, 3, 9), no_mondays)]);
        let next = find_next_working_day(&friday_request(), &schedules, &[], &[]).unwrap();
        assert_eq!(next.date, d(2026, 3, 10));
    }

    #[test]
    fn all_holidays_for_five_years_give_up() {
        let start = d(2026, 3, 7);
        let holidays: Vec<_> = (0..MAX_SEARCH_DAYS as u64 + 10)
            .filter_map(|i| start.checked_add_days(chrono::Days::new(i)))
            .map(|date| holiday(date, HolidayDuration::FullDay))
            .collect();
        assert_eq!(
            find_next_working_day(&friday_request(), &ScheduleSet::default(), &holidays, &[]),
            None
        );
    }

    #[test]
    fn fully_booked_future_gives_up() {
        let booked = span(d(2026, 3, 7), StartAt::Morning, d(2032, 1, 1), EndAt::EndOfDay);
        assert_eq!(
            find_next_working_day(&friday_request(), &ScheduleSet::default(), &[], &[booked]),
            None
        );
    }

    #[test]
    fn schedule_without_working_days_gives_up() {
        let mut week = WeekSchedule::default();
        for weekday in [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri] {
            let day = week.day_mut(weekday);
            day.am_enabled = false;
            day.pm_enabled = false;
        }
        let schedules = ScheduleSet::new(week, Vec::new());
        assert_eq!(find_next_working_day(&friday_request(), &schedules, &[], &[]), None);
    }
}
