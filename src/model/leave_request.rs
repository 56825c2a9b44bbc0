use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Which half of the first day a request starts on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StartAt {
    Morning,
    Afternoon,
}

/// Which half of the last day a request ends on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EndAt {
    Lunchtime,
    EndOfDay,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
    Canceled,
}

/// Persisted state of the mailbox auto-reply for a request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutOfOfficeStatus {
    None,
    Configured,
    Error,
    MustConfigure,
    MustBeRemoved,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Request {
    pub id: u64,
    pub workspace_id: u64,
    pub requester_member_id: u64,
    pub leave_type_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub start_at: StartAt,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub end_at: EndAt,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    #[sqlx(try_from = "String")]
    pub out_of_office_status: OutOfOfficeStatus,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Request {
    pub fn span(&self) -> RequestSpan {
        RequestSpan {
            start_date: self.start_date,
            start_at: self.start_at,
            end_date: self.end_date,
            end_at: self.end_at,
        }
    }
}

/// The time range of a request, stripped of everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RequestSpan {
    pub start_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub start_at: StartAt,
    pub end_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub end_at: EndAt,
}

/// Which halves of a single day something occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Coverage {
    pub morning: bool,
    pub afternoon: bool,
}

impl Coverage {
    pub const FULL: Coverage = Coverage { morning: true, afternoon: true };

    pub fn union(self, other: Coverage) -> Coverage {
        Coverage {
            morning: self.morning || other.morning,
            afternoon: self.afternoon || other.afternoon,
        }
    }

    pub fn is_full(&self) -> bool {
        self.morning && self.afternoon
    }
}

impl RequestSpan {
    /// A span is well formed when it ends after it starts. A single day
    /// starting in the afternoon cannot end at lunchtime.
    pub fn is_valid(&self) -> bool {
        match self.start_date.cmp(&self.end_date) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Equal => {
                !(self.start_at == StartAt::Afternoon && self.end_at == EndAt::Lunchtime)
            }
            std::cmp::Ordering::Greater => false,
        }
    }

    pub fn covered_halves(&self, date: NaiveDate) -> Coverage {
        if date < self.start_date || date > self.end_date {
            return Coverage::default();
        }
        Coverage {
            morning: date > self.start_date || self.start_at == StartAt::Morning,
            afternoon: date < self.end_date || self.end_at == EndAt::EndOfDay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn half_day_spans_cover_one_half() {
        let morning = RequestSpan {
            start_date: d(2026, 3, 2),
            start_at: StartAt::Morning,
            end_date: d(2026, 3, 2),
            end_at: EndAt::Lunchtime,
        };
        assert_eq!(
            morning.covered_halves(d(2026, 3, 2)),
            Coverage { morning: true, afternoon: false }
        );

        let afternoon = RequestSpan {
            start_at: StartAt::Afternoon,
            end_at: EndAt::EndOfDay,
            ..morning
        };
        assert_eq!(
            afternoon.covered_halves(d(2026, 3, 2)),
            Coverage { morning: false, afternoon: true }
        );
    }

    #[test]
    fn inner_days_of_a_span_are_fully_covered() {
        let span = RequestSpan {
            start_date: d(2026, 3, 2),
            start_at: StartAt::Afternoon,
            end_date: d(2026, 3, 4),
            end_at: EndAt::Lunchtime,
        };
        assert_eq!(span.covered_halves(d(2026, 3, 2)), Coverage { morning: false, afternoon: true });
        assert_eq!(span.covered_halves(d(2026, 3, 3)), Coverage::FULL);
        assert_eq!(span.covered_halves(d(2026, 3, 4)), Coverage { morning: true, afternoon: false });
        assert_eq!(span.covered_halves(d(2026, 3, 5)), Coverage::default());
    }

    #[test]
    fn afternoon_start_with_lunchtime_end_on_one_day_is_invalid() {
        let span = RequestSpan {
            start_date: d(2026, 3, 2),
            start_at: StartAt::Afternoon,
            end_date: d(2026, 3, 2),
            end_at: EndAt::Lunchtime,
        };
        assert!(!span.is_valid());
        assert!(RequestSpan { end_date: d(2026, 3, 3), ..span }.is_valid());
        assert!(!RequestSpan { end_date: d(2026, 3, 1), ..span }.is_valid());
    }
}
