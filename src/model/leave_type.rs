use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveType {
    pub id: u64,
    pub workspace_id: u64,
    pub name: String,
    pub take_from_allowance: bool,
}
