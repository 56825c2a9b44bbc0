use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::db::{self, REQUEST_COLUMNS};
use crate::engine::approval_chain::{Decision, apply_decision, current_approver, link_approvers, sort_approvers};
use crate::engine::duration::{fiscal_year_bounds, request_duration};
use crate::engine::next_working_day::find_next_working_day;
use crate::engine::schedule_window::{FreeTimes, resolve_window, to_utc};
use crate::error::AppError;
use crate::model::leave_request::{EndAt, OutOfOfficeStatus, Request, RequestSpan, RequestStatus, StartAt};
use crate::model::request_approver::{ApproverStatus, RequestApprover};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    /// Admins may file on behalf of another member; defaults to the caller.
    #[schema(example = 1000)]
    pub requester_member_id: Option<u64>,
    #[schema(example = 3)]
    pub leave_type_id: u64,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "morning")]
    pub start_at: StartAt,
    #[schema(example = "2026-03-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "end_of_day")]
    pub end_at: EndAt,
    /// Approver member ids, first approver first.
    #[schema(example = json!([2001, 2002]))]
    #[serde(default)]
    pub approver_member_ids: Vec<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 1000)]
    /// Filter by requester. Members only ever see their own requests.
    pub requester_member_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by request status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<Request>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveDetail {
    pub request: Request,
    /// Approvers in chain order.
    pub approvers: Vec<RequestApprover>,
    /// Some stored approvers could not be placed in the chain.
    pub was_truncated: bool,
    pub current_approver: Option<RequestApprover>,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct DecisionPayload {
    #[schema(example = "Team is short-staffed that week")]
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DurationResponse {
    #[schema(example = 4.5)]
    pub working_days: f64,
    #[schema(example = 5)]
    pub calendar_days: u32,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub fiscal_year_start: Option<NaiveDate>,
    #[schema(example = "2026-12-31", format = "date", value_type = Option<String>)]
    pub fiscal_year_end: Option<NaiveDate>,
    /// Whether the leave type is booked against the yearly allowance
    pub counts_against_allowance: bool,
}

#[derive(Serialize, ToSchema)]
pub struct NextWorkingDayResponse {
    #[schema(example = "2026-03-09", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub start_at: StartAt,
    pub free_times: FreeTimes,
    /// First working instant, in UTC.
    #[schema(example = "2026-03-09T07:00:00Z", format = "date-time", value_type = String)]
    pub return_at: DateTime<Utc>,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Fetches a request of the caller's workspace the caller may see: their own,
/// one they approve, or any when they manage the workspace.
/// `(page, per_page, offset)`; pages are 1-based, at most 100 rows each.
fn page_window(page: Option<u64>, per_page: Option<u64>) -> (u32, u32, u64) {
    let per_page = per_page.unwrap_or(10).clamp(1, 100) as u32;
    let page = page.unwrap_or(1).clamp(1, u64::from(u32::MAX)) as u32;
    let offset = u64::from(page - 1) * u64::from(per_page);
    (page, per_page, offset)
}

async fn visible_request(
    auth: &AuthUser,
    pool: &MySqlPool,
    leave_id: u64,
) -> actix_web::Result<(Request, Vec<RequestApprover>)> {
    let request = db::fetch_request(pool, auth.workspace_id, leave_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request not found".into()))?;
    let approvers = db::fetch_approvers(pool, request.id).await?;

    let own = auth.member_id == Some(request.requester_member_id);
    let approves = approvers
        .iter()
        .any(|a| auth.member_id == Some(a.approver_member_id));
    if !(own || approves || auth.sees_workspace()) {
        return Err(AppError::NotFound("Leave request not found".into()).into());
    }
    Ok((request, approvers))
}

async fn insert_leave(
    pool: &MySqlPool,
    workspace_id: u64,
    requester_member_id: u64,
    payload: &CreateLeave,
) -> Result<(u64, RequestStatus), AppError> {
    let links = link_approvers(&payload.approver_member_ids)?;

    if !links.is_empty() {
        let placeholders = vec!["?"; links.len()].join(", ");
        let sql = format!(
            "SELECT COUNT(*) FROM members WHERE workspace_id = ? AND id IN ({placeholders})"
        );
        let mut q = sqlx::query_scalar::<_, i64>(&sql).bind(workspace_id);
        for (member_id, _) in &links {
            q = q.bind(*member_id);
        }
        if q.fetch_one(pool).await? != links.len() as i64 {
            return Err(AppError::BadRequest("Unknown approver".into()));
        }
    }

    // Nobody to ask, nothing to wait for.
    let status = if links.is_empty() {
        RequestStatus::Approved
    } else {
        RequestStatus::Pending
    };

    let mut tx = pool.begin().await?;

    let request_id = sqlx::query(
        r#"
        INSERT INTO requests
            (workspace_id, requester_member_id, leave_type_id,
             start_date, start_at, end_date, end_at, status, out_of_office_status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(workspace_id)
    .bind(requester_member_id)
    .bind(payload.leave_type_id)
    .bind(payload.start_date)
    .bind(payload.start_at.as_ref())
    .bind(payload.end_date)
    .bind(payload.end_at.as_ref())
    .bind(status.as_ref())
    .bind(OutOfOfficeStatus::None.as_ref())
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    for (member_id, predecessor) in links {
        sqlx::query(
            r#"
            INSERT INTO request_approvers
                (request_id, approver_member_id, predecessor_request_member_approver_id, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(request_id)
        .bind(member_id)
        .bind(predecessor)
        .bind(ApproverStatus::Pending.as_ref())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok((request_id, status))
}

/* =========================
Create leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "id": 42,
            "status": "pending"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let requester = match payload.requester_member_id {
        Some(id) if auth.member_id != Some(id) => {
            auth.require_admin()?;
            id
        }
        Some(id) => id,
        None => auth.require_member()?,
    };

    let span = RequestSpan {
        start_date: payload.start_date,
        start_at: payload.start_at,
        end_date: payload.end_date,
        end_at: payload.end_at,
    };
    if !span.is_valid() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "start must not be after end"
        })));
    }

    db::fetch_member(pool.get_ref(), auth.workspace_id, requester)
        .await?
        .ok_or_else(|| AppError::NotFound("Requester not found".into()))?;
    db::fetch_leave_type(pool.get_ref(), auth.workspace_id, payload.leave_type_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Unknown leave type".into()))?;

    let (id, status) = insert_leave(pool.get_ref(), auth.workspace_id, requester, &payload)
        .await
        .inspect_err(|e| tracing::error!(error = %e, requester, "Failed to create leave request"))?;

    tracing::info!(request_id = id, requester, %status, "Leave request created");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave request submitted",
        "id": id,
        "status": status
    })))
}

async fn decide(
    pool: &MySqlPool,
    workspace_id: u64,
    leave_id: u64,
    member_id: u64,
    decision: Decision,
    reason: Option<&str>,
) -> Result<Option<RequestStatus>, AppError> {
    let mut tx = pool.begin().await?;

    // Serialises concurrent decisions on the same request.
    let locked: Option<(u64,)> = sqlx::query_as(
        "SELECT id FROM requests WHERE id = ? AND workspace_id = ? AND status = 'pending' FOR UPDATE",
    )
    .bind(leave_id)
    .bind(workspace_id)
    .fetch_optional(&mut *tx)
    .await?;
    if locked.is_none() {
        return Err(AppError::BadRequest(
            "Leave request not found or already processed".into(),
        ));
    }

    let approvers = db::fetch_approvers(&mut *tx, leave_id).await?;
    let chain = sort_approvers(&approvers);
    let outcome = apply_decision(&chain, member_id, decision)?;

    for (i, (approver_id, status)) in outcome.approver_updates.iter().enumerate() {
        // The first update is the deciding approver's own row.
        let reason = if i == 0 { reason } else { None };
        sqlx::query(
            r#"
            UPDATE request_approvers
            SET status = ?, status_changed_date = UTC_TIMESTAMP(), reason = COALESCE(?, reason)
            WHERE id = ? AND request_id = ?
            "#,
        )
        .bind(status.as_ref())
        .bind(reason)
        .bind(approver_id)
        .bind(leave_id)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(status) = outcome.request_status {
        sqlx::query("UPDATE requests SET status = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(leave_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(outcome.request_status)
}

/* =========================
Approve leave (current approver)
========================= */
/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body(content = DecisionPayload, description = "Optional reason", content_type = "application/json"),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved",
            "status": "approved"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not the current approver")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: Option<web::Json<DecisionPayload>>,
) -> actix_web::Result<impl Responder> {
    let member_id = auth.require_member()?;
    let leave_id = path.into_inner();
    let reason = payload.as_ref().and_then(|p| p.reason.as_deref());

    let status = decide(pool.get_ref(), auth.workspace_id, leave_id, member_id, Decision::Approve, reason)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, leave_id, member_id, "Approve leave failed"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved",
        "status": status.unwrap_or(RequestStatus::Pending)
    })))
}

/* =========================
Decline leave (current approver)
========================= */
/// Swagger doc for decline_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/decline",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to decline")
    ),
    request_body(content = DecisionPayload, description = "Optional reason", content_type = "application/json"),
    responses(
        (status = 200, description = "Leave declined successfully", body = Object, example = json!({
            "message": "Leave declined"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not the current approver")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn decline_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: Option<web::Json<DecisionPayload>>,
) -> actix_web::Result<impl Responder> {
    let member_id = auth.require_member()?;
    let leave_id = path.into_inner();
    let reason = payload.as_ref().and_then(|p| p.reason.as_deref());

    decide(pool.get_ref(), auth.workspace_id, leave_id, member_id, Decision::Decline, reason)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, leave_id, member_id, "Decline leave failed"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave declined"
    })))
}

/* =========================
Cancel leave (requester or admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave canceled", body = Object, example = json!({
            "message": "Leave canceled"
        })),
        (status = 400, description = "Leave request already closed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(AppError::from)?;

    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ? AND workspace_id = ? FOR UPDATE"
    );
    let request = sqlx::query_as::<_, Request>(&sql)
        .bind(leave_id)
        .bind(auth.workspace_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Leave request not found".into()))?;

    auth.require_self_or_admin(request.requester_member_id)?;

    if !matches!(request.status, RequestStatus::Pending | RequestStatus::Approved) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave request already closed"
        })));
    }

    // A live auto-reply has to come down; anything not yet pushed is dropped.
    let ooo = match request.out_of_office_status {
        OutOfOfficeStatus::Configured | OutOfOfficeStatus::MustBeRemoved => {
            OutOfOfficeStatus::MustBeRemoved
        }
        _ => OutOfOfficeStatus::None,
    };

    sqlx::query("UPDATE requests SET status = ?, out_of_office_status = ? WHERE id = ?")
        .bind(RequestStatus::Canceled.as_ref())
        .bind(ooo.as_ref())
        .bind(leave_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

    sqlx::query(
        r#"
        UPDATE request_approvers
        SET status = ?, status_changed_date = UTC_TIMESTAMP()
        WHERE request_id = ? AND status = ?
        "#,
    )
    .bind(ApproverStatus::Canceled.as_ref())
    .bind(leave_id)
    .bind(ApproverStatus::Pending.as_ref())
    .execute(&mut *tx)
    .await
    .map_err(AppError::from)?;

    tx.commit().await.map_err(AppError::from)?;

    tracing::info!(request_id = leave_id, out_of_office_status = %ooo, "Leave request canceled");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave canceled"
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveDetail),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let (request, approvers) = visible_request(&auth, pool.get_ref(), path.into_inner()).await?;

    let chain = sort_approvers(&approvers);
    let detail = LeaveDetail {
        current_approver: current_approver(&chain).cloned(),
        was_truncated: chain.was_truncated,
        approvers: chain.approvers.into_iter().cloned().collect(),
        request,
    };

    Ok(HttpResponse::Ok().json(detail))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let (page, per_page, offset) = page_window(query.page, query.per_page);

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE workspace_id = ?");
    let mut args: Vec<FilterValue> = vec![FilterValue::U64(auth.workspace_id)];

    let requester = if auth.sees_workspace() {
        query.requester_member_id
    } else {
        Some(auth.require_member()?)
    };
    if let Some(member_id) = requester {
        where_sql.push_str(" AND requester_member_id = ?");
        args.push(FilterValue::U64(member_id));
    }

    if let Some(status) = query.status.as_deref() {
        RequestStatus::from_str(status)
            .map_err(|_| AppError::BadRequest(format!("Unknown status: {status}")))?;
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT {REQUEST_COLUMNS}
        FROM requests
        {}
        ORDER BY start_date DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Request>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let response = LeaveListResponse {
        data: leaves,
        page,
        per_page,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Working days a request takes, and the fiscal year it is booked against.
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}/duration",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    responses(
        (status = 200, description = "Request duration", body = DurationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request or leave type not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_duration(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let (request, _) = visible_request(&auth, pool.get_ref(), path.into_inner()).await?;
    let workspace = db::fetch_workspace(pool.get_ref(), request.workspace_id).await?;
    let start_date = request.start_date;
    let leave = db::load_leave_context(pool.get_ref(), request).await?;

    let duration = request_duration(&leave.request.span(), &leave.schedules, &leave.holidays);
    let fiscal_year = fiscal_year_bounds(start_date, u32::from(workspace.fiscal_year_start_month));
    let leave_type = db::fetch_leave_type(pool.get_ref(), workspace.id, leave.request.leave_type_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave type not found".into()))?;

    Ok(HttpResponse::Ok().json(DurationResponse {
        working_days: duration.working_days,
        calendar_days: duration.calendar_days,
        fiscal_year_start: fiscal_year.map(|(first, _)| first),
        fiscal_year_end: fiscal_year.map(|(_, last)| last),
        counts_against_allowance: leave_type.take_from_allowance,
    }))
}

/// First working half-day after the request.
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}/next-working-day",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    responses(
        (status = 200, description = "Next working day", body = NextWorkingDayResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Request not found, or no working day within five years", body = Object, example = json!({
            "message": "could not determine next working day"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn next_working_day(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let (request, _) = visible_request(&auth, pool.get_ref(), path.into_inner()).await?;
    let leave = db::load_leave_context(pool.get_ref(), request).await?;

    let next = find_next_working_day(
        &leave.request.span(),
        &leave.schedules,
        &leave.holidays,
        &leave.other_requests,
    )
    .ok_or_else(|| {
        tracing::warn!(request_id = leave.request.id, "No next working day found");
        AppError::NotFound("could not determine next working day".into())
    })?;

    let window = resolve_window(next.date, next.start_at, EndAt::EndOfDay, leave.schedules.for_date(next.date));

    Ok(HttpResponse::Ok().json(NextWorkingDayResponse {
        date: next.date,
        start_at: next.start_at,
        free_times: next.free_times,
        return_at: to_utc(window.start, leave.member.tz()),
    }))
}
