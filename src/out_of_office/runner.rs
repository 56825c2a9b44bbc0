use std::sync::Arc;
use std::time::Duration;

use actix_web::rt::task::JoinHandle;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use crate::engine::next_working_day::find_next_working_day;
use crate::engine::placeholders::{TemplateContext, render_template};
use crate::engine::schedule_window::{resolve_window, to_utc};
use crate::error::AppError;
use crate::model::leave_request::{EndAt, OutOfOfficeStatus};
use crate::model::out_of_office::ExternalAudience;
use crate::out_of_office::mailbox::{AutoReply, MailboxClient, MailboxError};
use crate::out_of_office::planner::{OutOfOfficeAction, plan_action};
use crate::out_of_office::store::{Candidate, OutOfOfficeStore};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub configured: usize,
    pub removed: usize,
    pub escalated: usize,
    pub failed: usize,
    pub skipped: usize,
}

enum Outcome {
    Configured,
    Removed,
    Escalated,
    Skipped,
}

/// What one candidate needs this run.
struct Plan<'a> {
    candidate: &'a Candidate,
    action: OutOfOfficeAction,
    return_date: Option<NaiveDate>,
}

impl Plan<'_> {
    fn member_id(&self) -> u64 {
        self.candidate.leave.member.id
    }

    /// Whether this request's reply is on the mailbox once the run is over.
    fn holds_reply(&self) -> bool {
        match self.action {
            OutOfOfficeAction::Configure { .. } => true,
            OutOfOfficeAction::Remove => false,
            OutOfOfficeAction::Escalate | OutOfOfficeAction::Nothing => {
                self.candidate.leave.request.out_of_office_status == OutOfOfficeStatus::Configured
            }
        }
    }
}

/// Evaluates every candidate once. A failing request is marked `error` and
/// never stops the others.
///
/// A mailbox has a single auto-reply, so removals run before configurations
/// and a removal leaves the mailbox alone while another request of the same
/// member still holds it.
pub async fn run_once(
    store: &dyn OutOfOfficeStore,
    client: &dyn MailboxClient,
    now: DateTime<Utc>,
) -> Result<RunSummary, AppError> {
    let candidates = store.candidates(now).await?;
    let plans: Vec<Plan<'_>> = candidates.iter().map(|c| plan(c, now)).collect();

    let mut order: Vec<usize> = (0..plans.len()).collect();
    order.sort_by_key(|&i| plans[i].action != OutOfOfficeAction::Remove);

    let mut summary = RunSummary::default();
    for i in order {
        let current = &plans[i];
        let request_id = current.candidate.leave.request.id;
        let shared = plans
            .iter()
            .enumerate()
            .any(|(j, other)| j != i && other.member_id() == current.member_id() && other.holds_reply());

        match execute(current, shared, store, client).await {
            Ok(Outcome::Configured) => summary.configured += 1,
            Ok(Outcome::Removed) => summary.removed += 1,
            Ok(Outcome::Escalated) => summary.escalated += 1,
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Err(e) => {
                summary.failed += 1;
                error!(error = %e, request_id, "Out-of-office update failed");
                if let Err(e) = store.set_status(request_id, OutOfOfficeStatus::Error).await {
                    error!(error = %e, request_id, "Failed to record out-of-office error");
                }
            }
        }
    }

    Ok(summary)
}

fn plan(candidate: &Candidate, now: DateTime<Utc>) -> Plan<'_> {
    let leave = &candidate.leave;
    let request = &leave.request;
    let tz = leave.member.tz();

    let first_day = leave.schedules.for_date(request.start_date);
    let start = to_utc(
        resolve_window(request.start_date, request.start_at, EndAt::EndOfDay, first_day).start,
        tz,
    );
    let next = find_next_working_day(
        &request.span(),
        &leave.schedules,
        &leave.holidays,
        &leave.other_requests,
    );
    let return_at = next.map(|n| {
        let window = resolve_window(n.date, n.start_at, EndAt::EndOfDay, leave.schedules.for_date(n.date));
        to_utc(window.start, tz)
    });

    Plan {
        candidate,
        action: plan_action(request, start, return_at, now),
        return_date: next.map(|n| n.date),
    }
}

async fn execute(
    plan: &Plan<'_>,
    shared: bool,
    store: &dyn OutOfOfficeStore,
    client: &dyn MailboxClient,
) -> Result<Outcome, AppError> {
    let candidate = plan.candidate;
    let leave = &candidate.leave;
    let request = &leave.request;

    match plan.action {
        OutOfOfficeAction::Nothing => Ok(Outcome::Skipped),
        OutOfOfficeAction::Escalate => {
            error!(
                request_id = request.id,
                member_id = leave.member.id,
                "Could not determine next working day, out-of-office needs manual setup"
            );
            store.set_status(request.id, OutOfOfficeStatus::Error).await?;
            Ok(Outcome::Escalated)
        }
        OutOfOfficeAction::Configure { start, end } => {
            let user = leave
                .member
                .microsoft_user_id
                .as_deref()
                .ok_or(MailboxError::NotLinked)?;

            let ctx = TemplateContext {
                member: &leave.member,
                start_date: request.start_date,
                end_date: request.end_date,
                return_date: plan.return_date,
                leave_type: &candidate.leave_type_name,
                approvers: &candidate.approvers,
                date_format: &candidate.date_format,
            };
            let reply = match &candidate.settings {
                Some(settings) => AutoReply {
                    start,
                    end,
                    internal_message: render_template(&settings.internal_reply_message, &ctx),
                    external_message: render_template(&settings.external_reply_message, &ctx),
                    external_audience: settings.external_audience,
                },
                None => {
                    debug!(request_id = request.id, "No out-of-office settings for leave type, using empty messages");
                    AutoReply {
                        start,
                        end,
                        internal_message: String::new(),
                        external_message: String::new(),
                        external_audience: ExternalAudience::None,
                    }
                }
            };

            client.configure(user, &reply).await?;
            store.set_status(request.id, OutOfOfficeStatus::Configured).await?;
            info!(request_id = request.id, %start, %end, "Out-of-office configured");
            Ok(Outcome::Configured)
        }
        OutOfOfficeAction::Remove => {
            if shared {
                debug!(
                    request_id = request.id,
                    member_id = leave.member.id,
                    "Mailbox reply belongs to another request, leaving it in place"
                );
                store.set_status(request.id, OutOfOfficeStatus::None).await?;
                return Ok(Outcome::Removed);
            }
            let Some(user) = leave.member.microsoft_user_id.as_deref() else {
                warn!(request_id = request.id, "Member unlinked, dropping out-of-office state");
                store.set_status(request.id, OutOfOfficeStatus::None).await?;
                return Ok(Outcome::Removed);
            };
            client.clear(user).await?;
            store.set_status(request.id, OutOfOfficeStatus::None).await?;
            info!(request_id = request.id, "Out-of-office removed");
            Ok(Outcome::Removed)
        }
    }
}

/// Runs [`run_once`] every `interval` on the actix runtime.
pub fn spawn_out_of_office_runner(
    store: Arc<dyn OutOfOfficeStore>,
    client: Arc<dyn MailboxClient>,
    interval: Duration,
) -> JoinHandle<()> {
    actix_web::rt::spawn(async move {
        let mut ticker = actix_web::rt::time::interval(interval);
        loop {
            ticker.tick().await;
            match run_once(store.as_ref(), client.as_ref(), Utc::now()).await {
                Ok(summary) => info!(
                    configured = summary.configured,
                    removed = summary.removed,
                    escalated = summary.escalated,
                    failed = summary.failed,
                    skipped = summary.skipped,
                    "Out-of-office run finished"
                ),
                Err(e) => error!(error = %e, "Out-of-office run failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LeaveContext;
    use crate::engine::schedule_window::ScheduleSet;
    use crate::model::leave_request::{Request, RequestStatus, StartAt};
    use crate::model::member::Member;
    use crate::model::out_of_office::{ExternalAudience, MailboxSettings};
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryStore {
        candidates: Vec<Candidate>,
        statuses: Mutex<HashMap<u64, OutOfOfficeStatus>>,
    }

    #[async_trait]
    impl OutOfOfficeStore for MemoryStore {
        async fn candidates(&self, _now: DateTime<Utc>) -> Result<Vec<Candidate>, AppError> {
            Ok(self.candidates.clone())
        }

        async fn set_status(&self, request_id: u64, status: OutOfOfficeStatus) -> Result<(), AppError> {
            self.statuses.lock().unwrap().insert(request_id, status);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingClient {
        configured: Mutex<Vec<(String, AutoReply)>>,
        cleared: Mutex<Vec<String>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl MailboxClient for RecordingClient {
        async fn configure(&self, user_id: &str, reply: &AutoReply) -> Result<(), MailboxError> {
            if self.fail_for.as_deref() == Some(user_id) {
                return Err(MailboxError::Status { status: 503, body: "busy".into() });
            }
            self.configured.lock().unwrap().push((user_id.to_string(), reply.clone()));
            Ok(())
        }

        async fn clear(&self, user_id: &str) -> Result<(), MailboxError> {
            self.cleared.lock().unwrap().push(user_id.to_string());
            Ok(())
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn candidate(id: u64, user: &str, status: RequestStatus, ooo: OutOfOfficeStatus) -> Candidate {
        Candidate {
            leave: LeaveContext {
                // Mon 2026-03-02 .. Fri 2026-03-06
                request: Request {
                    id,
                    workspace_id: 1,
                    requester_member_id: id * 10,
                    leave_type_id: 5,
                    start_date: d(2026, 3, 2),
                    start_at: StartAt::Morning,
                    end_date: d(2026, 3, 6),
                    end_at: EndAt::EndOfDay,
                    status,
                    out_of_office_status: ooo,
                    created_at: None,
                },
                member: Member {
                    id: id * 10,
                    workspace_id: 1,
                    name: Some("Jane Doe".into()),
                    first_name: Some("Jane".into()),
                    last_name: Some("Doe".into()),
                    email: None,
                    timezone: Some("Europe/Berlin".into()),
                    public_holiday_id: None,
                    microsoft_user_id: Some(user.to_string()),
                },
                schedules: ScheduleSet::default(),
                holidays: Vec::new(),
                other_requests: Vec::new(),
            },
            approvers: Vec::new(),
            leave_type_name: "Vacation".into(),
            settings: Some(MailboxSettings {
                id: 1,
                member_id: id * 10,
                leave_type_id: 5,
                internal_reply_message: "Back on {{returnDate}}".into(),
                external_reply_message: "{{firstName}} is away".into(),
                external_audience: ExternalAudience::All,
            }),
            date_format: "%Y-%m-%d".into(),
        }
    }

    fn store(candidates: Vec<Candidate>) -> MemoryStore {
        MemoryStore {
            candidates,
            statuses: Mutex::new(HashMap::new()),
        }
    }

    #[actix_web::test]
    async fn configures_due_requests_with_rendered_messages() {
        let store = store(vec![candidate(1, "u1", RequestStatus::Approved, OutOfOfficeStatus::None)]);
        let client = RecordingClient::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let summary = run_once(&store, &client, now).await.unwrap();
        assert_eq!(summary.configured, 1);

        let configured = client.configured.lock().unwrap();
        let (user, reply) = &configured[0];
        assert_eq!(user, "u1");
        // 08:00 Berlin (CET) is 07:00 UTC; back Monday 2026-03-09.
        assert_eq!(reply.start, Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap());
        assert_eq!(reply.end, Utc.with_ymd_and_hms(2026, 3, 9, 7, 0, 0).unwrap());
        assert_eq!(reply.internal_message, "Back on 2026-03-09");
        assert_eq!(reply.external_message, "Jane is away");
        assert_eq!(
            store.statuses.lock().unwrap().get(&1),
            Some(&OutOfOfficeStatus::Configured)
        );
    }

    #[actix_web::test]
    async fn one_failure_does_not_stop_the_batch() {
        let store = store(vec![
            candidate(1, "broken", RequestStatus::Approved, OutOfOfficeStatus::None),
            candidate(2, "u2", RequestStatus::Approved, OutOfOfficeStatus::None),
            candidate(3, "u3", RequestStatus::Canceled, OutOfOfficeStatus::Configured),
        ]);
        let client = RecordingClient {
            fail_for: Some("broken".into()),
            ..Default::default()
        };
        let now = Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap();

        let summary = run_once(&store, &client, now).await.unwrap();
        assert_eq!(
            summary,
            RunSummary { configured: 1, removed: 1, escalated: 0, failed: 1, skipped: 0 }
        );

        let statuses = store.statuses.lock().unwrap();
        assert_eq!(statuses.get(&1), Some(&OutOfOfficeStatus::Error));
        assert_eq!(statuses.get(&2), Some(&OutOfOfficeStatus::Configured));
        assert_eq!(statuses.get(&3), Some(&OutOfOfficeStatus::None));
        assert_eq!(client.cleared.lock().unwrap().as_slice(), ["u3".to_string()]);
    }

    #[actix_web::test]
    async fn missing_return_date_escalates() {
        let mut stuck = candidate(4, "u4", RequestStatus::Approved, OutOfOfficeStatus::None);
        stuck.leave.other_requests.push(crate::model::leave_request::RequestSpan {
            start_date: d(2026, 3, 7),
            start_at: StartAt::Morning,
            end_date: d(2036, 1, 1),
            end_at: EndAt::EndOfDay,
        });
        let store = store(vec![stuck]);
        let client = RecordingClient::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

        let summary = run_once(&store, &client, now).await.unwrap();
        assert_eq!(summary.escalated, 1);
        assert!(client.configured.lock().unwrap().is_empty());
        assert_eq!(
            store.statuses.lock().unwrap().get(&4),
            Some(&OutOfOfficeStatus::Error)
        );
    }

    #[actix_web::test]
    async fn requests_without_settings_get_empty_messages() {
        let mut bare = candidate(5, "u5", RequestStatus::Approved, OutOfOfficeStatus::None);
        bare.settings = None;
        let store = store(vec![bare]);
        let client = RecordingClient::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

        let summary = run_once(&store, &client, now).await.unwrap();
        assert_eq!(summary.configured, 1);

        let configured = client.configured.lock().unwrap();
        let (user, reply) = &configured[0];
        assert_eq!(user, "u5");
        assert_eq!(reply.internal_message, "");
        assert_eq!(reply.external_message, "");
        assert_eq!(reply.external_audience, ExternalAudience::None);
        assert_eq!(
            store.statuses.lock().unwrap().get(&5),
            Some(&OutOfOfficeStatus::Configured)
        );
    }

    /// Second request of member 10, Tue 2026-03-10 .. Wed 2026-03-11.
    fn follow_up(id: u64, ooo: OutOfOfficeStatus) -> Candidate {
        let mut next = candidate(id, "u1", RequestStatus::Approved, ooo);
        next.leave.request.requester_member_id = 10;
        next.leave.member.id = 10;
        next.leave.request.start_date = d(2026, 3, 10);
        next.leave.request.end_date = d(2026, 3, 11);
        next
    }

    #[actix_web::test]
    async fn expiring_reply_does_not_clear_the_next_one_of_the_same_member() {
        // The later request is listed first so the removal is reordered ahead.
        let store = store(vec![
            follow_up(2, OutOfOfficeStatus::None),
            candidate(1, "u1", RequestStatus::Approved, OutOfOfficeStatus::Configured),
        ]);
        let client = RecordingClient::default();
        // First request returned Monday 08:00 Berlin, the next one starts Tuesday.
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 7, 5, 0).unwrap();

        let summary = run_once(&store, &client, now).await.unwrap();
        assert_eq!(
            summary,
            RunSummary { configured: 1, removed: 1, escalated: 0, failed: 0, skipped: 0 }
        );
        assert!(client.cleared.lock().unwrap().is_empty());

        let configured = client.configured.lock().unwrap();
        assert_eq!(configured.len(), 1);
        assert_eq!(configured[0].1.start, Utc.with_ymd_and_hms(2026, 3, 10, 7, 0, 0).unwrap());

        let statuses = store.statuses.lock().unwrap();
        assert_eq!(statuses.get(&1), Some(&OutOfOfficeStatus::None));
        assert_eq!(statuses.get(&2), Some(&OutOfOfficeStatus::Configured));
    }

    #[actix_web::test]
    async fn canceling_one_request_keeps_the_reply_another_one_holds() {
        let store = store(vec![
            candidate(1, "u1", RequestStatus::Canceled, OutOfOfficeStatus::Configured),
            follow_up(2, OutOfOfficeStatus::Configured),
        ]);
        let client = RecordingClient::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap();

        let summary = run_once(&store, &client, now).await.unwrap();
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.skipped, 1);
        assert!(client.cleared.lock().unwrap().is_empty());
        assert_eq!(
            store.statuses.lock().unwrap().get(&1),
            Some(&OutOfOfficeStatus::None)
        );
    }

    #[actix_web::test]
    async fn last_reply_of_a_member_is_cleared() {
        let store = store(vec![
            candidate(1, "u1", RequestStatus::Canceled, OutOfOfficeStatus::Configured),
            follow_up(2, OutOfOfficeStatus::None),
        ]);
        let client = RecordingClient::default();
        // Far before the follow-up's lead window opens.
        let now = Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap();

        run_once(&store, &client, now).await.unwrap();
        assert_eq!(client.cleared.lock().unwrap().as_slice(), ["u1".to_string()]);
        assert!(client.configured.lock().unwrap().is_empty());
    }
}
