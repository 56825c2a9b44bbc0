use serde::{Deserialize, Serialize};

/// Claims of the bearer tokens issued by the absentify web app.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub member_id: Option<u64>,
    pub workspace_id: u64,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
