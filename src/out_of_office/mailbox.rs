//! Mailbox auto-reply clients.
//!
//! [`GraphMailboxClient`] talks to Microsoft Graph with an app-only token
//! obtained through the client-credentials flow.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::GraphConfig;
use crate::model::out_of_office::ExternalAudience;

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
const TOKEN_KEY: &str = "graph";
/// Graph tokens live for at least an hour; refresh well before that.
const TOKEN_TTL: Duration = Duration::from_secs(50 * 60);

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Graph returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("token request failed: {0}")]
    Token(String),

    #[error("member has no linked Microsoft account")]
    NotLinked,
}

/// A scheduled auto-reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoReply {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub internal_message: String,
    pub external_message: String,
    pub external_audience: ExternalAudience,
}

impl AutoReply {
    fn to_graph(&self) -> Value {
        json!({
            "automaticRepliesSetting": {
                "status": "scheduled",
                "externalAudience": self.external_audience.graph_value(),
                "scheduledStartDateTime": {
                    "dateTime": self.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    "timeZone": "UTC"
                },
                "scheduledEndDateTime": {
                    "dateTime": self.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    "timeZone": "UTC"
                },
                "internalReplyMessage": self.internal_message,
                "externalReplyMessage": self.external_message
            }
        })
    }
}

#[async_trait]
pub trait MailboxClient: Send + Sync {
    async fn configure(&self, user_id: &str, reply: &AutoReply) -> Result<(), MailboxError>;

    async fn clear(&self, user_id: &str) -> Result<(), MailboxError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct GraphMailboxClient {
    http: reqwest::Client,
    config: GraphConfig,
    tokens: Cache<&'static str, String>,
}

impl GraphMailboxClient {
    pub fn new(config: GraphConfig) -> Result<Self, MailboxError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            config,
            tokens: Cache::builder()
                .max_capacity(1)
                .time_to_live(TOKEN_TTL)
                .build(),
        })
    }

    async fn token(&self) -> Result<String, MailboxError> {
        self.tokens
            .try_get_with(TOKEN_KEY, self.fetch_token())
            .await
            .map_err(|e: Arc<MailboxError>| MailboxError::Token(e.to_string()))
    }

    async fn fetch_token(&self) -> Result<String, MailboxError> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.login_url.trim_end_matches('/'),
            self.config.tenant_id
        );
        debug!(%url, "Requesting Graph token");

        let resp = self
            .http
            .post(&url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailboxError::Status { status: status.as_u16(), body });
        }
        Ok(resp.json::<TokenResponse>().await?.access_token)
    }

    async fn patch_settings(&self, user_id: &str, body: &Value) -> Result<(), MailboxError> {
        let token = self.token().await?;
        let url = format!(
            "{}/users/{}/mailboxSettings",
            self.config.base_url.trim_end_matches('/'),
            user_id
        );

        let resp = self
            .http
            .patch(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.tokens.invalidate(TOKEN_KEY).await;
        }
        let body = resp.text().await.unwrap_or_default();
        Err(MailboxError::Status { status: status.as_u16(), body })
    }
}

#[async_trait]
impl MailboxClient for GraphMailboxClient {
    #[instrument(skip(self, reply))]
    async fn configure(&self, user_id: &str, reply: &AutoReply) -> Result<(), MailboxError> {
        self.patch_settings(user_id, &reply.to_graph()).await
    }

    #[instrument(skip(self))]
    async fn clear(&self, user_id: &str) -> Result<(), MailboxError> {
        let body = json!({ "automaticRepliesSetting": { "status": "disabled" } });
        self.patch_settings(user_id, &body).await
    }
}
