use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::leave_request::Coverage;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HolidayDuration {
    FullDay,
    Morning,
    Afternoon,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PublicHolidayDay {
    pub id: u64,
    pub public_holiday_id: u64,
    #[schema(example = "2026-12-25", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub year: i32,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub duration: HolidayDuration,
}

impl PublicHolidayDay {
    pub fn coverage(&self) -> Coverage {
        match self.duration {
            HolidayDuration::FullDay => Coverage::FULL,
            HolidayDuration::Morning => Coverage { morning: true, afternoon: false },
            HolidayDuration::Afternoon => Coverage { morning: false, afternoon: true },
        }
    }
}
