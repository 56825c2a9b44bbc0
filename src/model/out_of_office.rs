use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Who outside the organisation receives the external reply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExternalAudience {
    None,
    ContactsOnly,
    All,
}

impl ExternalAudience {
    /// Value expected by the Graph `automaticRepliesSetting` resource.
    pub fn graph_value(&self) -> &'static str {
        match self {
            ExternalAudience::None => "none",
            ExternalAudience::ContactsOnly => "contactsOnly",
            ExternalAudience::All => "all",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct MailboxSettings {
    pub id: u64,
    pub member_id: u64,
    pub leave_type_id: u64,
    #[schema(example = "I'm away until {{returnDate}}. Please contact {{approverName}}.")]
    pub internal_reply_message: String,
    pub external_reply_message: String,
    #[sqlx(try_from = "String")]
    pub external_audience: ExternalAudience,
}
