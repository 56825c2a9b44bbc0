use serde::{Deserialize, Serialize};

pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Workspace {
    pub id: u64,
    pub name: String,
    /// 1 = January.
    pub fiscal_year_start_month: u8,
    pub date_format: Option<String>,
}

impl Workspace {
    pub fn date_format(&self) -> &str {
        self.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT)
    }
}
