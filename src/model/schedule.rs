use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

/// Working hours of a single weekday, split into a morning and an afternoon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DaySchedule {
    #[schema(example = "08:00:00", value_type = String)]
    pub am_start: NaiveTime,
    #[schema(example = "12:00:00", value_type = String)]
    pub am_end: NaiveTime,
    #[schema(example = "13:00:00", value_type = String)]
    pub pm_start: NaiveTime,
    #[schema(example = "17:00:00", value_type = String)]
    pub pm_end: NaiveTime,
    pub am_enabled: bool,
    pub pm_enabled: bool,
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl DaySchedule {
    pub fn working() -> Self {
        Self {
            am_start: hm(8, 0),
            am_end: hm(12, 0),
            pm_start: hm(13, 0),
            pm_end: hm(17, 0),
            am_enabled: true,
            pm_enabled: true,
        }
    }

    pub fn off() -> Self {
        Self {
            am_enabled: false,
            pm_enabled: false,
            ..Self::working()
        }
    }

    fn check(&self, weekday: &str) -> Result<(), String> {
        if self.am_enabled && self.am_start >= self.am_end {
            return Err(format!("{weekday}: morning must start before it ends"));
        }
        if self.pm_enabled && self.pm_start >= self.pm_end {
            return Err(format!("{weekday}: afternoon must start before it ends"));
        }
        if self.am_enabled && self.pm_enabled && self.am_end > self.pm_start {
            return Err(format!("{weekday}: afternoon must start after the morning ends"));
        }
        Ok(())
    }
}

/// Weekly working-time template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WeekSchedule {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl Default for WeekSchedule {
    /// Monday to Friday, 08:00-12:00 and 13:00-17:00.
    fn default() -> Self {
        Self {
            monday: DaySchedule::working(),
            tuesday: DaySchedule::working(),
            wednesday: DaySchedule::working(),
            thursday: DaySchedule::working(),
            friday: DaySchedule::working(),
            saturday: DaySchedule::off(),
            sunday: DaySchedule::off(),
        }
    }
}

impl WeekSchedule {
    pub fn day(&self, weekday: Weekday) -> &DaySchedule {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    #[cfg(test)]
    pub fn day_mut(&mut self, weekday: Weekday) -> &mut DaySchedule {
        match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        }
    }

    /// Rejects enabled segments whose boundaries are out of order.
    pub fn validate(&self) -> Result<(), String> {
        self.monday.check("monday")?;
        self.tuesday.check("tuesday")?;
        self.wednesday.check("wednesday")?;
        self.thursday.check("thursday")?;
        self.friday.check("friday")?;
        self.saturday.check("saturday")?;
        self.sunday.check("sunday")
    }
}

/// A stored schedule. `member_id` is `None` for the workspace default.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Schedule {
    pub member_id: Option<u64>,
    pub from_date: Option<NaiveDate>,
    pub week: Json<WeekSchedule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_week_has_free_weekend() {
        let week = WeekSchedule::default();
        assert!(week.day(Weekday::Mon).am_enabled);
        assert!(!week.day(Weekday::Sat).am_enabled);
        assert!(!week.day(Weekday::Sun).pm_enabled);
        assert!(week.validate().is_ok());
    }

    #[test]
    fn overlapping_halves_are_rejected() {
        let mut week = WeekSchedule::default();
        week.day_mut(Weekday::Wed).pm_start = hm(11, 0);
        let err = week.validate().unwrap_err();
        assert!(err.starts_with("wednesday"));
    }

    #[test]
    fn disabled_halves_are_not_checked() {
        let mut week = WeekSchedule::default();
        let sat = week.day_mut(Weekday::Sat);
        sat.am_start = hm(12, 0);
        sat.am_end = hm(9, 0);
        assert!(week.validate().is_ok());
    }
}
