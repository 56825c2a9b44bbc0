use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::public_holiday::{HolidayDuration, PublicHolidayDay};
use crate::utils::holiday_cache::HolidayCache;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HolidayQuery {
    /// Calendar year, defaults to the current one
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateHolidayDay {
    #[schema(example = "2026-12-24", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Christmas Eve")]
    pub name: String,
    /// Defaults to a full day
    #[schema(example = "afternoon")]
    pub duration: Option<HolidayDuration>,
}

async fn ensure_calendar(pool: &MySqlPool, workspace_id: u64, public_holiday_id: u64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, u64>("SELECT id FROM public_holidays WHERE id = ? AND workspace_id = ?")
        .bind(public_holiday_id)
        .bind(workspace_id)
        .fetch_optional(pool)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Public holiday calendar not found".into()))
}

/// Days of a public holiday calendar for one year.
#[utoipa::path(
    get,
    path = "/api/public-holidays/{public_holiday_id}/days",
    params(
        ("public_holiday_id" = u64, Path, description = "Public holiday calendar ID"),
        HolidayQuery
    ),
    responses(
        (status = 200, description = "Holiday days ordered by date", body = Vec<PublicHolidayDay>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Calendar not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "PublicHoliday"
)]
pub async fn list_days(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<HolidayCache>,
    path: web::Path<u64>,
    query: web::Query<HolidayQuery>,
) -> actix_web::Result<impl Responder> {
    let calendar = path.into_inner();
    ensure_calendar(pool.get_ref(), auth.workspace_id, calendar).await?;

    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let days = cache.year(pool.get_ref(), calendar, year).await?;

    Ok(HttpResponse::Ok().json(days.as_slice()))
}

/// Admin only. Adds a day and drops the cached year.
#[utoipa::path(
    post,
    path = "/api/public-holidays/{public_holiday_id}/days",
    params(
        ("public_holiday_id" = u64, Path, description = "Public holiday calendar ID")
    ),
    request_body(content = CreateHolidayDay, content_type = "application/json"),
    responses(
        (status = 201, description = "Holiday day added", body = Object, example = json!({
            "message": "Holiday added",
            "id": 7
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Calendar not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "PublicHoliday"
)]
pub async fn create_day(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<HolidayCache>,
    path: web::Path<u64>,
    payload: web::Json<CreateHolidayDay>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let calendar = path.into_inner();
    ensure_calendar(pool.get_ref(), auth.workspace_id, calendar).await?;

    let year = payload.date.year();
    let duration = payload.duration.unwrap_or(HolidayDuration::FullDay);

    let id = sqlx::query(
        r#"
        INSERT INTO public_holiday_days (public_holiday_id, date, year, name, duration)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(calendar)
    .bind(payload.date)
    .bind(year)
    .bind(&payload.name)
    .bind(duration.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, public_holiday_id = calendar, "Failed to add holiday");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?
    .last_insert_id();

    cache.invalidate(calendar, year).await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Holiday added",
        "id": id
    })))
}
