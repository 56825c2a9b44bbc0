use chrono::{DateTime, Duration, Utc};

use crate::model::leave_request::{OutOfOfficeStatus, Request, RequestStatus};

/// How long before the leave starts the auto-reply is pushed.
pub const CONFIGURE_LEAD_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfOfficeAction {
    Configure {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Remove,
    /// A reply is due but the return date could not be determined.
    Escalate,
    Nothing,
}

/// Decides what to do with a request's auto-reply at `now`.
///
/// `start` is the first instant of the leave and `return_at` the first
/// working instant after it, both in UTC. The decision only depends on the
/// persisted status, so repeated or overlapping runs converge.
pub fn plan_action(
    request: &Request,
    start: DateTime<Utc>,
    return_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> OutOfOfficeAction {
    let approved = request.status == RequestStatus::Approved;

    match request.out_of_office_status {
        OutOfOfficeStatus::Configured => {
            if !approved {
                return OutOfOfficeAction::Remove;
            }
            match return_at {
                Some(end) if now >= end => OutOfOfficeAction::Remove,
                _ => OutOfOfficeAction::Nothing,
            }
        }
        OutOfOfficeStatus::MustBeRemoved => OutOfOfficeAction::Remove,
        OutOfOfficeStatus::None | OutOfOfficeStatus::Error | OutOfOfficeStatus::MustConfigure => {
            if !approved || now < start - Duration::hours(CONFIGURE_LEAD_HOURS) {
                return OutOfOfficeAction::Nothing;
            }
            match return_at {
                // Already escalated once; wait for a human.
                None if request.out_of_office_status == OutOfOfficeStatus::Error => {
                    OutOfOfficeAction::Nothing
                }
                None => OutOfOfficeAction::Escalate,
                Some(end) if now >= end => OutOfOfficeAction::Nothing,
                Some(end) => OutOfOfficeAction::Configure { start, end },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::{EndAt, StartAt};
    use chrono::{NaiveDate, TimeZone};

    fn request(status: RequestStatus, ooo: OutOfOfficeStatus) -> Request {
        Request {
            id: 1,
            workspace_id: 1,
            requester_member_id: 2,
            leave_type_id: 3,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_at: StartAt::Morning,
            end_date: NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
            end_at: EndAt::EndOfDay,
            status,
            out_of_office_status: ooo,
            created_at: None,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn configures_within_lead_time() {
        let req = request(RequestStatus::Approved, OutOfOfficeStatus::None);
        let start = at(2, 7);
        let back = Some(at(9, 7));
        assert_eq!(plan_action(&req, start, back, at(1, 6)), OutOfOfficeAction::Nothing);
        assert_eq!(
            plan_action(&req, start, back, at(1, 7)),
            OutOfOfficeAction::Configure { start, end: at(9, 7) }
        );
        assert_eq!(
            plan_action(&req, start, back, at(4, 12)),
            OutOfOfficeAction::Configure { start, end: at(9, 7) }
        );
        assert_eq!(plan_action(&req, start, back, at(9, 7)), OutOfOfficeAction::Nothing);
    }

    #[test]
    fn pending_requests_are_left_alone() {
        let req = request(RequestStatus::Pending, OutOfOfficeStatus::None);
        assert_eq!(
            plan_action(&req, at(2, 7), Some(at(9, 7)), at(3, 7)),
            OutOfOfficeAction::Nothing
        );
    }

    #[test]
    fn errors_are_retried() {
        let req = request(RequestStatus::Approved, OutOfOfficeStatus::Error);
        assert_eq!(
            plan_action(&req, at(2, 7), Some(at(9, 7)), at(3, 7)),
            OutOfOfficeAction::Configure { start: at(2, 7), end: at(9, 7) }
        );
    }

    #[test]
    fn configured_reply_is_removed_after_return_or_cancel() {
        let req = request(RequestStatus::Approved, OutOfOfficeStatus::Configured);
        assert_eq!(plan_action(&req, at(2, 7), Some(at(9, 7)), at(5, 7)), OutOfOfficeAction::Nothing);
        assert_eq!(plan_action(&req, at(2, 7), Some(at(9, 7)), at(9, 7)), OutOfOfficeAction::Remove);

        let canceled = request(RequestStatus::Canceled, OutOfOfficeStatus::Configured);
        assert_eq!(plan_action(&canceled, at(2, 7), Some(at(9, 7)), at(5, 7)), OutOfOfficeAction::Remove);

        let flagged = request(RequestStatus::Canceled, OutOfOfficeStatus::MustBeRemoved);
        assert_eq!(plan_action(&flagged, at(2, 7), None, at(1, 0)), OutOfOfficeAction::Remove);
    }

    #[test]
    fn unknown_return_escalates_once() {
        let req = request(RequestStatus::Approved, OutOfOfficeStatus::None);
        assert_eq!(plan_action(&req, at(2, 7), None, at(2, 8)), OutOfOfficeAction::Escalate);

        let escalated = request(RequestStatus::Approved, OutOfOfficeStatus::Error);
        assert_eq!(plan_action(&escalated, at(2, 7), None, at(2, 8)), OutOfOfficeAction::Nothing);
    }
}
