use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{NotifyConfig, NotifyMode};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("notification gateway answered with status {0}")]
    Rejected(u16),
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Outbound message channel (email gateway, SMS gateway, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

pub fn from_config(cfg: &NotifyConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    let notifier = match cfg.mode {
        NotifyMode::Log => Arc::new(LogNotifier) as Arc<dyn Notifier>,
        NotifyMode::Webhook => {
            let url = cfg
                .webhook_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("webhook notifier requires a url"))?;
            Arc::new(WebhookNotifier::new(
                url,
                cfg.from.clone(),
                Duration::from_secs(cfg.timeout_seconds),
            )?) as Arc<dyn Notifier>
        }
    };
    Ok(notifier)
}

/// Development channel: writes the message to the log and reports success.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(%to, %subject, %body, "notification (log channel)");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Posts messages as JSON to a mail/SMS gateway.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    from: String,
}

impl WebhookNotifier {
    pub fn new(url: String, from: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url, from })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let res = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                from: &self.from,
                to,
                subject,
                text: body,
            })
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        debug!(%to, %status, "notification delivered to gateway");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        LogNotifier.send("a@x.com", "s", "b").await.unwrap();
    }

    #[tokio::test]
    async fn recording_notifier_records_and_fails_on_demand() {
        let n = RecordingNotifier::default();
        n.send("a@x.com", "subject", "body").await.unwrap();
        assert_eq!(n.sent().len(), 1);

        n.set_failing(true);
        let err = n.send("a@x.com", "subject", "body").await.unwrap_err();
        assert!(matches!(err, NotifyError::Unavailable(_)));
        assert_eq!(n.sent().len(), 1);
    }

    #[tokio::test]
    async fn webhook_notifier_reports_transport_errors() {
        // Nothing listens on port 9 of the loopback interface.
        let n = WebhookNotifier::new(
            "http://127.0.0.1:9/send".into(),
            "KenesHab".into(),
            Duration::from_secs(1),
        )
        .unwrap();
        let err = n.send("a@x.com", "s", "b").await.unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
    }

    #[test]
    fn from_config_requires_webhook_url() {
        let cfg = NotifyConfig {
            mode: NotifyMode::Webhook,
            webhook_url: None,
            from: "x".into(),
            timeout_seconds: 1,
        };
        assert!(from_config(&cfg).is_err());
    }
}
