use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Member {
    pub id: u64,
    pub workspace_id: u64,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[schema(example = "Europe/Berlin")]
    pub timezone: Option<String>,
    pub public_holiday_id: Option<u64>,
    pub microsoft_user_id: Option<String>,
}

impl Member {
    /// Unknown or missing zone names fall back to UTC.
    pub fn tz(&self) -> Tz {
        self.timezone
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or(Tz::UTC)
    }
}
