use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::api::member_for;
use crate::auth::auth::AuthUser;
use crate::db;
use crate::engine::next_working_day::find_next_working_day;
use crate::engine::placeholders::{TemplateContext, render_template};
use crate::error::AppError;
use crate::model::out_of_office::{ExternalAudience, MailboxSettings};
use crate::utils::db_utils::{UpdateTarget, build_update_sql, execute_update};

const SETTINGS_COLUMNS: &str =
    "id, member_id, leave_type_id, internal_reply_message, external_reply_message, external_audience";

const PATCHABLE_COLUMNS: &[&str] = &[
    "internal_reply_message",
    "external_reply_message",
    "external_audience",
];

#[derive(Deserialize, ToSchema)]
pub struct UpsertSettings {
    #[schema(example = "I'm away until {{returnDate}}. Please contact {{approverName}}.")]
    pub internal_reply_message: String,
    #[schema(example = "{{firstName}} is out of office until {{returnDate}}.")]
    pub external_reply_message: String,
    #[schema(example = "contacts_only")]
    pub external_audience: ExternalAudience,
}

#[derive(Deserialize, ToSchema)]
pub struct PreviewRequest {
    /// Leave request of the member to render against
    #[schema(example = 42)]
    pub request_id: u64,
    /// Overrides the stored internal template
    pub internal_reply_message: Option<String>,
    /// Overrides the stored external template
    pub external_reply_message: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PreviewResponse {
    pub internal_reply_message: String,
    pub external_reply_message: String,
    #[schema(example = "2026-03-09", format = "date", value_type = Option<String>)]
    pub return_date: Option<NaiveDate>,
}

/// Message columns are NOT NULL text; the audience must be a known value.
fn check_patch(payload: &Value) -> Result<(), AppError> {
    for column in ["internal_reply_message", "external_reply_message"] {
        if payload.get(column).is_some_and(|v| !v.is_string()) {
            return Err(AppError::BadRequest(format!("{column} must be a string")));
        }
    }
    if let Some(audience) = payload.get("external_audience") {
        audience
            .as_str()
            .and_then(|a| ExternalAudience::from_str(a).ok())
            .ok_or_else(|| AppError::BadRequest("Invalid external_audience".into()))?;
    }
    Ok(())
}

async fn fetch_settings(
    pool: &MySqlPool,
    member_id: u64,
    leave_type_id: u64,
) -> Result<Option<MailboxSettings>, AppError> {
    let sql = format!(
        "SELECT {SETTINGS_COLUMNS} FROM out_of_office_settings WHERE member_id = ? AND leave_type_id = ?"
    );
    Ok(sqlx::query_as::<_, MailboxSettings>(&sql)
        .bind(member_id)
        .bind(leave_type_id)
        .fetch_optional(pool)
        .await?)
}

/// Auto-reply templates of a member, one per leave type.
#[utoipa::path(
    get,
    path = "/api/members/{member_id}/out-of-office",
    params(
        ("member_id" = u64, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Mailbox settings", body = Vec<MailboxSettings>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Member not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "OutOfOffice"
)]
pub async fn list_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let member = member_for(&auth, pool.get_ref(), path.into_inner(), false).await?;

    let sql = format!(
        "SELECT {SETTINGS_COLUMNS} FROM out_of_office_settings WHERE member_id = ? ORDER BY leave_type_id"
    );
    let settings = sqlx::query_as::<_, MailboxSettings>(&sql)
        .bind(member.id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, member_id = member.id, "Failed to fetch out-of-office settings");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(settings))
}

/// Creates or replaces the templates for one leave type.
#[utoipa::path(
    put,
    path = "/api/members/{member_id}/out-of-office/{leave_type_id}",
    params(
        ("member_id" = u64, Path, description = "Member ID"),
        ("leave_type_id" = u64, Path, description = "Leave type ID")
    ),
    request_body(content = UpsertSettings, content_type = "application/json"),
    responses(
        (status = 200, description = "Settings stored", body = MailboxSettings),
        (status = 400, description = "Unknown leave type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "OutOfOffice"
)]
pub async fn put_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
    payload: web::Json<UpsertSettings>,
) -> actix_web::Result<impl Responder> {
    let (member_id, leave_type_id) = path.into_inner();
    let member = member_for(&auth, pool.get_ref(), member_id, true).await?;
    db::fetch_leave_type(pool.get_ref(), auth.workspace_id, leave_type_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Unknown leave type".into()))?;

    sqlx::query(
        r#"
        INSERT INTO out_of_office_settings
            (member_id, leave_type_id, internal_reply_message, external_reply_message, external_audience)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            internal_reply_message = VALUES(internal_reply_message),
            external_reply_message = VALUES(external_reply_message),
            external_audience = VALUES(external_audience)
        "#,
    )
    .bind(member.id)
    .bind(leave_type_id)
    .bind(&payload.internal_reply_message)
    .bind(&payload.external_reply_message)
    .bind(payload.external_audience.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, member_id, leave_type_id, "Failed to store out-of-office settings");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let stored = fetch_settings(pool.get_ref(), member.id, leave_type_id)
        .await?
        .ok_or_else(|| AppError::Internal("settings vanished after upsert".into()))?;

    Ok(HttpResponse::Ok().json(stored))
}

/// Updates only the given template fields.
#[utoipa::path(
    patch,
    path = "/api/members/{member_id}/out-of-office/{leave_type_id}",
    params(
        ("member_id" = u64, Path, description = "Member ID"),
        ("leave_type_id" = u64, Path, description = "Leave type ID")
    ),
    request_body(content = Object, description = "Any of internal_reply_message, external_reply_message, external_audience",
        example = json!({ "external_audience": "all" })),
    responses(
        (status = 200, description = "Settings updated", body = MailboxSettings),
        (status = 400, description = "Unknown field or value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No settings for this leave type")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "OutOfOffice"
)]
pub async fn patch_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
    payload: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let (member_id, leave_type_id) = path.into_inner();
    let member = member_for(&auth, pool.get_ref(), member_id, true).await?;

    fetch_settings(pool.get_ref(), member.id, leave_type_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No out-of-office settings for this leave type".into()))?;

    check_patch(&payload)?;

    let keys = [("member_id", member.id), ("leave_type_id", leave_type_id)];
    let target = UpdateTarget {
        table: "out_of_office_settings",
        columns: PATCHABLE_COLUMNS,
        keys: &keys,
    };
    let update = build_update_sql(&target, &payload)?;

    execute_update(pool.get_ref(), update).await.map_err(|e| {
        tracing::error!(error = %e, member_id, leave_type_id, "Failed to patch out-of-office settings");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let stored = fetch_settings(pool.get_ref(), member.id, leave_type_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No out-of-office settings for this leave type".into()))?;

    Ok(HttpResponse::Ok().json(stored))
}

/// Renders the templates against one of the member's requests.
#[utoipa::path(
    post,
    path = "/api/members/{member_id}/out-of-office/{leave_type_id}/preview",
    params(
        ("member_id" = u64, Path, description = "Member ID"),
        ("leave_type_id" = u64, Path, description = "Leave type ID")
    ),
    request_body(content = PreviewRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Rendered messages", body = PreviewResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request or templates not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "OutOfOffice"
)]
pub async fn preview_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
    payload: web::Json<PreviewRequest>,
) -> actix_web::Result<impl Responder> {
    let (member_id, leave_type_id) = path.into_inner();
    let member = member_for(&auth, pool.get_ref(), member_id, false).await?;
    let pool = pool.get_ref();

    let request = db::fetch_request(pool, auth.workspace_id, payload.request_id)
        .await?
        .filter(|r| r.requester_member_id == member.id)
        .ok_or_else(|| AppError::NotFound("Leave request not found".into()))?;

    let stored = fetch_settings(pool, member.id, leave_type_id).await?;
    let (internal, external) = match (&payload.internal_reply_message, &payload.external_reply_message, &stored) {
        (Some(i), Some(e), _) => (i.clone(), e.clone()),
        (i, e, Some(s)) => (
            i.clone().unwrap_or_else(|| s.internal_reply_message.clone()),
            e.clone().unwrap_or_else(|| s.external_reply_message.clone()),
        ),
        (_, _, None) => {
            return Err(AppError::NotFound("No out-of-office settings for this leave type".into()).into());
        }
    };

    let workspace = db::fetch_workspace(pool, request.workspace_id).await?;
    let approvers = db::fetch_approvers(pool, request.id).await?;
    let leave_type = db::fetch_leave_type(pool, request.workspace_id, leave_type_id)
        .await?
        .map(|t| t.name)
        .unwrap_or_default();
    let leave = db::load_leave_context(pool, request).await?;

    let return_date = find_next_working_day(
        &leave.request.span(),
        &leave.schedules,
        &leave.holidays,
        &leave.other_requests,
    )
    .map(|n| n.date);

    let ctx = TemplateContext {
        member: &leave.member,
        start_date: leave.request.start_date,
        end_date: leave.request.end_date,
        return_date,
        leave_type: &leave_type,
        approvers: &approvers,
        date_format: workspace.date_format(),
    };

    Ok(HttpResponse::Ok().json(PreviewResponse {
        internal_reply_message: render_template(&internal, &ctx),
        external_reply_message: render_template(&external, &ctx),
        return_date,
    }))
}
