use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApproverStatus {
    Pending,
    Approved,
    Declined,
    Canceled,
    ApprovedByAnotherManager,
    DeclinedByAnotherManager,
}

/// One node of a request's approval chain.
///
/// Nodes are linked through `predecessor_request_member_approver_id`, which
/// holds the `approver_member_id` of the previous node (`None` for the head).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct RequestApprover {
    pub id: u64,
    pub request_id: u64,
    pub approver_member_id: u64,
    pub predecessor_request_member_approver_id: Option<u64>,
    #[sqlx(try_from = "String")]
    pub status: ApproverStatus,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub status_changed_date: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    #[sqlx(default)]
    pub approver_name: Option<String>,
    #[sqlx(default)]
    pub approver_email: Option<String>,
}
