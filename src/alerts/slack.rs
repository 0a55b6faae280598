//! Notification transport
//!
//! The dispatcher talks to a [`Notifier`] trait object so the delivery
//! mechanism stays swappable in tests. The production implementation posts
//! to a Slack incoming webhook.

use crate::error::NotifyError;
use crate::events::AlertKind;
use chrono::Utc;
use log::debug;
use std::time::Duration;

/// Outbound notification transport
///
/// Any non-success outcome is reported uniformly as a delivery failure;
/// the core does not distinguish network errors from remote rejection.
pub trait Notifier: Send {
    fn notify(&self, kind: AlertKind, message: &str) -> Result<(), NotifyError>;
}

/// Delivers alerts to a Slack incoming webhook
///
/// Owns a single-threaded tokio runtime so the synchronous notifier thread
/// can drive the async HTTP client. Requests time out after ten seconds.
pub struct SlackNotifier {
    webhook_url: String,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Result<Self, NotifyError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            webhook_url,
            client,
            runtime,
        })
    }

    /// Build the webhook text body for an alert
    fn payload_text(kind: AlertKind, message: &str) -> String {
        format!(
            "*{} ALERT*\n\n{}\n\n_Time: {} UTC_",
            kind.as_str().to_uppercase(),
            message,
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        )
    }
}

impl Notifier for SlackNotifier {
    fn notify(&self, kind: AlertKind, message: &str) -> Result<(), NotifyError> {
        let payload = serde_json::json!({ "text": Self::payload_text(kind, message) });

        debug!("Posting {} alert to webhook", kind);
        let response = self.runtime.block_on(
            self.client
                .post(&self.webhook_url)
                .json(&payload)
                .send(),
        )?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
