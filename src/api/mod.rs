pub mod leave_request;
pub mod out_of_office;
pub mod public_holiday;
pub mod schedule;

use sqlx::MySqlPool;

use crate::auth::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::model::member::Member;

/// Loads a member of the caller's workspace the caller may act on.
///
/// Reads are open to workspace managers, writes need the member themself or
/// an admin.
pub(crate) async fn member_for(
    auth: &AuthUser,
    pool: &MySqlPool,
    member_id: u64,
    write: bool,
) -> actix_web::Result<Member> {
    if write || !auth.sees_workspace() {
        auth.require_self_or_admin(member_id)?;
    }
    let member = db::fetch_member(pool, auth.workspace_id, member_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".into()))?;
    Ok(member)
}
