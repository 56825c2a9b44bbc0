use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use sqlx::MySqlPool;

use crate::db::{self, LeaveContext, REQUEST_COLUMNS};
use crate::error::AppError;
use crate::model::leave_request::{OutOfOfficeStatus, Request};
use crate::model::out_of_office::MailboxSettings;
use crate::model::request_approver::RequestApprover;

/// A request the runner has to look at, with everything needed to decide.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub leave: LeaveContext,
    pub approvers: Vec<RequestApprover>,
    pub leave_type_name: String,
    pub settings: Option<MailboxSettings>,
    pub date_format: String,
}

#[async_trait]
pub trait OutOfOfficeStore: Send + Sync {
    async fn candidates(&self, now: DateTime<Utc>) -> Result<Vec<Candidate>, AppError>;

    async fn set_status(&self, request_id: u64, status: OutOfOfficeStatus) -> Result<(), AppError>;
}

pub struct MySqlOutOfOfficeStore {
    pool: MySqlPool,
}

impl MySqlOutOfOfficeStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn candidate(&self, request: Request) -> Result<Candidate, AppError> {
        let workspace = db::fetch_workspace(&self.pool, request.workspace_id).await?;
        let approvers = db::fetch_approvers(&self.pool, request.id).await?;

        let leave_type_name = db::fetch_leave_type(&self.pool, request.workspace_id, request.leave_type_id)
            .await?
            .map(|t| t.name)
            .unwrap_or_default();

        let settings = sqlx::query_as::<_, MailboxSettings>(
            r#"
            SELECT id, member_id, leave_type_id, internal_reply_message,
                   external_reply_message, external_audience
            FROM out_of_office_settings
            WHERE member_id = ? AND leave_type_id = ?
            "#,
        )
        .bind(request.requester_member_id)
        .bind(request.leave_type_id)
        .fetch_optional(&self.pool)
        .await?;

        let leave = db::load_leave_context(&self.pool, request).await?;

        Ok(Candidate {
            leave,
            approvers,
            leave_type_name,
            settings,
            date_format: workspace.date_format().to_string(),
        })
    }
}

#[async_trait]
impl OutOfOfficeStore for MySqlOutOfOfficeStore {
    /// Approved requests near or inside their leave that still need a reply,
    /// plus every request whose reply may have to come down.
    async fn candidates(&self, now: DateTime<Utc>) -> Result<Vec<Candidate>, AppError> {
        let today = now.date_naive();
        let soon = today.checked_add_days(Days::new(2)).unwrap_or(today);
        let recently = today.checked_sub_days(Days::new(1)).unwrap_or(today);

        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM requests
            WHERE (status = 'approved'
                   AND out_of_office_status IN ('none', 'error', 'must_configure')
                   AND start_date <= ?
                   AND end_date >= ?)
               OR out_of_office_status IN ('configured', 'must_be_removed')
            "#
        );
        let requests = sqlx::query_as::<_, Request>(&sql)
            .bind(soon)
            .bind(recently)
            .fetch_all(&self.pool)
            .await?;

        let mut candidates = Vec::with_capacity(requests.len());
        for request in requests {
            let request_id = request.id;
            match self.candidate(request).await {
                Ok(c) => candidates.push(c),
                Err(e) => {
                    tracing::error!(error = %e, request_id, "Failed to load out-of-office candidate");
                }
            }
        }
        Ok(candidates)
    }

    async fn set_status(&self, request_id: u64, status: OutOfOfficeStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE requests SET out_of_office_status = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(request_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
