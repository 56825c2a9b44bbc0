use crate::api::leave_request::{
    CreateLeave, DecisionPayload, DurationResponse, LeaveDetail, LeaveFilter, LeaveListResponse,
    NextWorkingDayResponse,
};
use crate::api::out_of_office::{PreviewRequest, PreviewResponse, UpsertSettings};
use crate::api::public_holiday::{CreateHolidayDay, HolidayQuery};
use crate::api::schedule::{ScheduleQuery, ScheduleView, UpsertSchedule};
use crate::engine::schedule_window::{FreeTimes, UtcWindow, Window};
use crate::model::leave_request::{EndAt, OutOfOfficeStatus, Request, RequestStatus, StartAt};
use crate::model::out_of_office::{ExternalAudience, MailboxSettings};
use crate::model::public_holiday::{HolidayDuration, PublicHolidayDay};
use crate::model::request_approver::{ApproverStatus, RequestApprover};
use crate::model::schedule::{DaySchedule, WeekSchedule};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "absentify API",
        version = "0.1.0",
        description = r#"
## Leave management core

Leave requests with ordered approval chains, per-member working schedules,
public holiday calendars and mailbox auto-replies while people are away.

### Security
Every endpoint expects a **JWT Bearer** access token issued for a workspace.
Members act on their own records; admins on the whole workspace.

### Response Format
- JSON responses, errors as `{"message": "..."}`
- Pagination on list endpoints
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::decline_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::leave_duration,
        crate::api::leave_request::next_working_day,

        crate::api::schedule::get_schedule,
        crate::api::schedule::put_schedule,

        crate::api::public_holiday::list_days,
        crate::api::public_holiday::create_day,

        crate::api::out_of_office::list_settings,
        crate::api::out_of_office::put_settings,
        crate::api::out_of_office::patch_settings,
        crate::api::out_of_office::preview_settings
    ),
    components(
        schemas(
            CreateLeave,
            DecisionPayload,
            DurationResponse,
            LeaveDetail,
            LeaveFilter,
            LeaveListResponse,
            NextWorkingDayResponse,
            Request,
            RequestStatus,
            StartAt,
            EndAt,
            OutOfOfficeStatus,
            RequestApprover,
            ApproverStatus,
            ScheduleQuery,
            ScheduleView,
            UpsertSchedule,
            WeekSchedule,
            DaySchedule,
            Window,
            UtcWindow,
            FreeTimes,
            HolidayQuery,
            CreateHolidayDay,
            PublicHolidayDay,
            HolidayDuration,
            MailboxSettings,
            ExternalAudience,
            UpsertSettings,
            PreviewRequest,
            PreviewResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave requests and approval chains"),
        (name = "Schedule", description = "Member working schedules"),
        (name = "PublicHoliday", description = "Public holiday calendars"),
        (name = "OutOfOffice", description = "Mailbox auto-reply templates"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/leave",
            "/api/leave/{leave_id}/next-working-day",
            "/api/members/{member_id}/schedule",
            "/api/public-holidays/{public_holiday_id}/days",
            "/api/members/{member_id}/out-of-office/{leave_type_id}/preview",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
