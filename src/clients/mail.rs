//! Outbound mail via a transactional-mail HTTP API.
//!
//! The provider speaks JSON: one POST per message, authenticated with an
//! API key header. A `Mailer` trait sits in front so the account service
//! can be exercised in tests without network access.

use anyhow::Result;
use reqwest::Client;
use serde::Serialize;

use crate::config::MailConfig;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    html_content: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<()>;
}

pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    #[must_use]
    pub const fn new(client: Client, config: MailConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait::async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<()> {
        let body = SendEmailBody {
            sender: EmailAddress {
                email: self.config.sender_email.clone(),
                name: Some(self.config.sender_name.clone()),
            },
            to: vec![EmailAddress {
                email: to.to_string(),
                name: None,
            }],
            subject: subject.to_string(),
            html_content: html_body,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("api-key", &self.config.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Mail provider rejected message (status={status}): {detail}");
        }

        tracing::debug!("Sent mail to {to}: {subject}");
        Ok(())
    }
}

/// Stand-in used when `[mail] enabled = false`: logs the message instead
/// of delivering it. Registration and reset flows still complete.
pub struct NullMailer;

#[async_trait::async_trait]
impl Mailer for NullMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: String) -> Result<()> {
        tracing::info!("Mail disabled, dropping message to {to}: {subject}");
        Ok(())
    }
}
