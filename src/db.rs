use chrono::{Days, NaiveDate};
use sqlx::{MySqlExecutor, MySqlPool};

use crate::engine::next_working_day::MAX_SEARCH_DAYS;
use crate::engine::schedule_window::ScheduleSet;
use crate::error::AppError;
use crate::model::leave_request::{Request, RequestSpan};
use crate::model::leave_type::LeaveType;
use crate::model::member::Member;
use crate::model::public_holiday::PublicHolidayDay;
use crate::model::request_approver::RequestApprover;
use crate::model::schedule::Schedule;
use crate::model::workspace::Workspace;

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPool::connect(database_url).await
}

pub const REQUEST_COLUMNS: &str = r#"
    id, workspace_id, requester_member_id, leave_type_id,
    start_date, start_at, end_date, end_at,
    status, out_of_office_status, created_at
"#;

pub async fn fetch_request(
    pool: &MySqlPool,
    workspace_id: u64,
    request_id: u64,
) -> Result<Option<Request>, AppError> {
    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ? AND workspace_id = ?"
    );
    Ok(sqlx::query_as::<_, Request>(&sql)
        .bind(request_id)
        .bind(workspace_id)
        .fetch_optional(pool)
        .await?)
}

/// Approver rows of a request, unordered, joined with the approver's name and email.
pub async fn fetch_approvers<'e, E: MySqlExecutor<'e>>(
    executor: E,
    request_id: u64,
) -> Result<Vec<RequestApprover>, AppError> {
    Ok(sqlx::query_as::<_, RequestApprover>(
        r#"
        SELECT
            ra.id,
            ra.request_id,
            ra.approver_member_id,
            ra.predecessor_request_member_approver_id,
            ra.status,
            ra.status_changed_date,
            ra.reason,
            m.name AS approver_name,
            m.email AS approver_email
        FROM request_approvers ra
        LEFT JOIN members m ON m.id = ra.approver_member_id
        WHERE ra.request_id = ?
        "#,
    )
    .bind(request_id)
    .fetch_all(executor)
    .await?)
}

pub async fn fetch_member(
    pool: &MySqlPool,
    workspace_id: u64,
    member_id: u64,
) -> Result<Option<Member>, AppError> {
    Ok(sqlx::query_as::<_, Member>(
        r#"
        SELECT id, workspace_id, name, first_name, last_name, email,
               timezone, public_holiday_id, microsoft_user_id
        FROM members
        WHERE id = ? AND workspace_id = ?
        "#,
    )
    .bind(member_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?)
}

pub async fn fetch_workspace(pool: &MySqlPool, workspace_id: u64) -> Result<Workspace, AppError> {
    sqlx::query_as::<_, Workspace>(
        r#"
        SELECT id, name, fiscal_year_start_month, date_format
        FROM workspaces
        WHERE id = ?
        "#,
    )
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Workspace not found".into()))
}

pub async fn fetch_leave_type(
    pool: &MySqlPool,
    workspace_id: u64,
    leave_type_id: u64,
) -> Result<Option<LeaveType>, AppError> {
    Ok(sqlx::query_as::<_, LeaveType>(
        "SELECT id, workspace_id, name, take_from_allowance FROM leave_types WHERE id = ? AND workspace_id = ?",
    )
    .bind(leave_type_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?)
}

/// The workspace default plus every schedule row of the member.
pub async fn fetch_schedule_set(
    pool: &MySqlPool,
    workspace_id: u64,
    member_id: u64,
) -> Result<ScheduleSet, AppError> {
    let rows = sqlx::query_as::<_, Schedule>(
        r#"
        SELECT member_id, from_date, week
        FROM schedules
        WHERE workspace_id = ?
          AND (member_id IS NULL OR member_id = ?)
        "#,
    )
    .bind(workspace_id)
    .bind(member_id)
    .fetch_all(pool)
    .await?;
    Ok(ScheduleSet::from_rows(rows))
}

pub async fn fetch_holidays_between(
    pool: &MySqlPool,
    public_holiday_id: Option<u64>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<PublicHolidayDay>, AppError> {
    let Some(public_holiday_id) = public_holiday_id else {
        return Ok(Vec::new());
    };
    Ok(sqlx::query_as::<_, PublicHolidayDay>(
        r#"
        SELECT id, public_holiday_id, date, year, name, duration
        FROM public_holiday_days
        WHERE public_holiday_id = ?
          AND date BETWEEN ? AND ?
        ORDER BY date
        "#,
    )
    .bind(public_holiday_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?)
}

/// Live requests of the member ending on or after `from`, except `exclude_request_id`.
pub async fn fetch_other_spans(
    pool: &MySqlPool,
    member_id: u64,
    exclude_request_id: u64,
    from: NaiveDate,
) -> Result<Vec<RequestSpan>, AppError> {
    Ok(sqlx::query_as::<_, RequestSpan>(
        r#"
        SELECT start_date, start_at, end_date, end_at
        FROM requests
        WHERE requester_member_id = ?
          AND id <> ?
          AND end_date >= ?
          AND status IN ('pending', 'approved')
        "#,
    )
    .bind(member_id)
    .bind(exclude_request_id)
    .bind(from)
    .fetch_all(pool)
    .await?)
}

/// Everything the schedule arithmetic needs for one request.
#[derive(Debug, Clone)]
pub struct LeaveContext {
    pub request: Request,
    pub member: Member,
    pub schedules: ScheduleSet,
    /// From the request start up to the end of the next-working-day search.
    pub holidays: Vec<PublicHolidayDay>,
    pub other_requests: Vec<RequestSpan>,
}

pub async fn load_leave_context(
    pool: &MySqlPool,
    request: Request,
) -> Result<LeaveContext, AppError> {
    let member = fetch_member(pool, request.workspace_id, request.requester_member_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Requester not found".into()))?;
    let schedules = fetch_schedule_set(pool, request.workspace_id, member.id).await?;

    let horizon = request
        .end_date
        .checked_add_days(Days::new(u64::from(MAX_SEARCH_DAYS) + 1))
        .unwrap_or(NaiveDate::MAX);
    let holidays =
        fetch_holidays_between(pool, member.public_holiday_id, request.start_date, horizon).await?;
    let other_requests = fetch_other_spans(pool, member.id, request.id, request.end_date).await?;

    Ok(LeaveContext {
        request,
        member,
        schedules,
        holidays,
        other_requests,
    })
}
