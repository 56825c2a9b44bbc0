use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};

use crate::api::member_for;
use crate::auth::auth::AuthUser;
use crate::db;
use crate::engine::schedule_window::{FreeTimes, UtcWindow, Window, free_times, resolve_window, window_in_timezone};
use crate::error::AppError;
use crate::model::leave_request::{EndAt, StartAt};
use crate::model::schedule::WeekSchedule;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ScheduleQuery {
    /// Day to resolve, defaults to today in the member's timezone
    #[schema(example = "2026-03-02", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct ScheduleView {
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Europe/Berlin")]
    pub timezone: String,
    /// Weekly template in force on `date`
    pub schedule: WeekSchedule,
    pub morning: Window,
    pub afternoon: Window,
    pub morning_utc: UtcWindow,
    pub afternoon_utc: UtcWindow,
    pub free_times: FreeTimes,
    /// Neither half of `date` is worked
    pub day_off: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct UpsertSchedule {
    /// Effective from this day on; omit for a schedule that always applies
    #[schema(example = "2026-04-01", format = "date", value_type = Option<String>)]
    pub from_date: Option<NaiveDate>,
    pub week: WeekSchedule,
}

/// Working time of a member on one day.
#[utoipa::path(
    get,
    path = "/api/members/{member_id}/schedule",
    params(
        ("member_id" = u64, Path, description = "Member ID"),
        ScheduleQuery
    ),
    responses(
        (status = 200, description = "Schedule in force and the day's windows", body = ScheduleView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Member not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn get_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<ScheduleQuery>,
) -> actix_web::Result<impl Responder> {
    let member = member_for(&auth, pool.get_ref(), path.into_inner(), false).await?;
    let tz = member.tz();
    let date = query
        .date
        .unwrap_or_else(|| Utc::now().with_timezone(&tz).date_naive());

    let schedules = db::fetch_schedule_set(pool.get_ref(), auth.workspace_id, member.id).await?;
    let schedule = schedules.for_date(date);

    let free = free_times(date, schedule);
    let morning = resolve_window(date, StartAt::Morning, EndAt::Lunchtime, schedule);
    let afternoon = resolve_window(date, StartAt::Afternoon, EndAt::EndOfDay, schedule);

    Ok(HttpResponse::Ok().json(ScheduleView {
        date,
        timezone: tz.name().to_string(),
        schedule: schedule.clone(),
        morning,
        afternoon,
        morning_utc: window_in_timezone(morning, tz),
        afternoon_utc: window_in_timezone(afternoon, tz),
        free_times: free,
        day_off: free.is_day_off(),
    }))
}

async fn upsert_schedule(
    pool: &MySqlPool,
    workspace_id: u64,
    member_id: u64,
    payload: &UpsertSchedule,
) -> Result<u64, AppError> {
    let mut tx = pool.begin().await?;

    let existing: Option<(u64,)> = sqlx::query_as(
        r#"
        SELECT id FROM schedules
        WHERE workspace_id = ? AND member_id = ? AND from_date <=> ?
        FOR UPDATE
        "#,
    )
    .bind(workspace_id)
    .bind(member_id)
    .bind(payload.from_date)
    .fetch_optional(&mut *tx)
    .await?;

    let id = match existing {
        Some((id,)) => {
            sqlx::query("UPDATE schedules SET week = ? WHERE id = ?")
                .bind(Json(payload.week.clone()))
                .bind(id)
                .execute(&mut *tx)
                .await?;
            id
        }
        None => sqlx::query(
            "INSERT INTO schedules (workspace_id, member_id, from_date, week) VALUES (?, ?, ?, ?)",
        )
        .bind(workspace_id)
        .bind(member_id)
        .bind(payload.from_date)
        .bind(Json(payload.week.clone()))
        .execute(&mut *tx)
        .await?
        .last_insert_id(),
    };

    tx.commit().await?;
    Ok(id)
}

/// Admin only. Creates or replaces the member schedule effective `from_date`.
#[utoipa::path(
    put,
    path = "/api/members/{member_id}/schedule",
    params(
        ("member_id" = u64, Path, description = "Member ID")
    ),
    request_body(content = UpsertSchedule, content_type = "application/json"),
    responses(
        (status = 200, description = "Schedule stored", body = Object, example = json!({
            "message": "Schedule saved",
            "id": 12
        })),
        (status = 400, description = "Segments out of order", body = Object, example = json!({
            "message": "monday: morning must start before it ends"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn put_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpsertSchedule>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let member = member_for(&auth, pool.get_ref(), path.into_inner(), true).await?;

    if let Err(message) = payload.week.validate() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": message })));
    }

    let id = upsert_schedule(pool.get_ref(), auth.workspace_id, member.id, &payload)
        .await
        .inspect_err(|e| tracing::error!(error = %e, member_id = member.id, "Failed to save schedule"))?;

    tracing::info!(schedule_id = id, member_id = member.id, from = ?payload.from_date, "Schedule saved");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Schedule saved",
        "id": id
    })))
}
