use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use derive_more::Constructor;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::leave_request::{Coverage, EndAt, StartAt};
use crate::model::schedule::{Schedule, WeekSchedule};

/// Local wall-clock bounds of a schedule segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Constructor, ToSchema)]
pub struct Window {
    #[schema(example = "2026-03-02T08:00:00", value_type = String)]
    pub start: NaiveDateTime,
    #[schema(example = "2026-03-02T12:00:00", value_type = String)]
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct UtcWindow {
    #[schema(value_type = String, format = "date-time")]
    pub start: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub end: DateTime<Utc>,
}

/// `true` means the person does not work that half of the day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FreeTimes {
    pub its_free_morning: bool,
    pub its_free_afternoon: bool,
}

impl FreeTimes {
    pub fn is_day_off(&self) -> bool {
        self.its_free_morning && self.its_free_afternoon
    }
}

impl From<Coverage> for FreeTimes {
    fn from(c: Coverage) -> Self {
        FreeTimes {
            its_free_morning: c.morning,
            its_free_afternoon: c.afternoon,
        }
    }
}

impl From<FreeTimes> for Coverage {
    fn from(f: FreeTimes) -> Self {
        Coverage {
            morning: f.its_free_morning,
            afternoon: f.its_free_afternoon,
        }
    }
}

/// Start and end of a segment on `date` according to `schedule`.
///
/// Disabled segments are not rejected; check [`free_times`] first.
pub fn resolve_window(
    date: NaiveDate,
    start_at: StartAt,
    end_at: EndAt,
    schedule: &WeekSchedule,
) -> Window {
    let day = schedule.day(date.weekday());
    let start = match start_at {
        StartAt::Morning => day.am_start,
        StartAt::Afternoon => day.pm_start,
    };
    let end = match end_at {
        EndAt::Lunchtime => day.am_end,
        EndAt::EndOfDay => day.pm_end,
    };
    Window::new(date.and_time(start), date.and_time(end))
}

pub fn free_times(date: NaiveDate, schedule: &WeekSchedule) -> FreeTimes {
    let day = schedule.day(date.weekday());
    FreeTimes {
        its_free_morning: !day.am_enabled,
        its_free_afternoon: !day.pm_enabled,
    }
}

/// Most recent member schedule effective on `date`, else the workspace one.
pub fn select_schedule<'a>(
    date: NaiveDate,
    member_schedules: &'a [(NaiveDate, WeekSchedule)],
    workspace_schedule: &'a WeekSchedule,
) -> &'a WeekSchedule {
    member_schedules
        .iter()
        .filter(|(from, _)| *from <= date)
        .max_by_key(|(from, _)| *from)
        .map(|(_, schedule)| schedule)
        .unwrap_or(workspace_schedule)
}

/// The workspace schedule plus a member's dated overrides.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSet {
    workspace: WeekSchedule,
    member: Vec<(NaiveDate, WeekSchedule)>,
}

impl ScheduleSet {
    pub fn new(workspace: WeekSchedule, member: Vec<(NaiveDate, WeekSchedule)>) -> Self {
        Self { workspace, member }
    }

    /// Builds the set from stored rows. Without a workspace row the default
    /// week applies; a member row without `from_date` is effective forever.
    pub fn from_rows(rows: Vec<Schedule>) -> Self {
        let mut workspace = WeekSchedule::default();
        let mut member = Vec::new();
        for row in rows {
            match row.member_id {
                None => workspace = row.week.0,
                Some(_) => member.push((row.from_date.unwrap_or(NaiveDate::MIN), row.week.0)),
            }
        }
        Self::new(workspace, member)
    }

    pub fn for_date(&self, date: NaiveDate) -> &WeekSchedule {
        select_schedule(date, &self.member, &self.workspace)
    }
}

/// Interprets a local wall-clock time in `tz`.
///
/// Ambiguous times take the earlier instant, times inside a DST gap move
/// forward by an hour.
pub fn to_utc(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(local + chrono::Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

pub fn window_in_timezone(window: Window, tz: Tz) -> UtcWindow {
    UtcWindow {
        start: to_utc(window.start, tz),
        end: to_utc(window.end, tz),
    }
}
