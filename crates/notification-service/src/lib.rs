mod smtp;
mod templates;

pub use smtp::{transport_plan, SmtpNotifier, TransportAttempt};
pub use templates::ReportTemplate;

use analysis_core::RankedList;
use async_trait::async_trait;
use backtest_engine::BacktestSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything a daily screening email carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    pub generated_at: DateTime<Utc>,
    /// Human-readable universe name, e.g. "Nifty 500"
    pub universe: String,
    pub symbols_screened: usize,
    pub technical: RankedList,
    pub value: RankedList,
    pub hybrid: RankedList,
    pub backtests: Vec<BacktestSummary>,
}

impl DailyReport {
    pub fn subject(&self) -> String {
        format!(
            "Value & Momentum Screening Report - {}",
            self.generated_at.format("%Y-%m-%d")
        )
    }

    pub fn lists(&self) -> [&RankedList; 3] {
        [&self.technical, &self.value, &self.hybrid]
    }
}

/// Trait for report delivery channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, report: &DailyReport) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
    pub recipients: Vec<String>,
    pub smtp_tls: SmtpTls,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SmtpTls {
    #[default]
    StartTls,
    Tls,
    None,
}

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

impl NotificationConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let recipients = var("RECIPIENT_EMAIL")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let smtp_tls = match var("SMTP_TLS").unwrap_or_default().to_lowercase().as_str() {
            "tls" => SmtpTls::Tls,
            "none" => SmtpTls::None,
            _ => SmtpTls::StartTls,
        };

        Self {
            smtp_host: var("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port: var("SMTP_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            sender_email: var("SENDER_EMAIL"),
            sender_password: var("SENDER_PASSWORD").or_else(|| var("SENDER_APP_PASSWORD")),
            recipients,
            smtp_tls,
        }
    }

    /// Sender, password and at least one recipient are present.
    pub fn is_complete(&self) -> bool {
        self.sender_email.is_some() && self.sender_password.is_some() && !self.recipients.is_empty()
    }
}

/// Dispatches a report to all configured channels.
pub struct NotificationService {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if config.is_complete() {
            match SmtpNotifier::new(config) {
                Ok(notifier) => {
                    tracing::info!(
                        "Email notifications enabled (SMTP -> {} recipients)",
                        config.recipients.len()
                    );
                    channels.push(Box::new(notifier));
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP notifier: {}", e);
                }
            }
        } else {
            tracing::info!(
                "No notification channels configured (set SENDER_EMAIL, SENDER_PASSWORD and RECIPIENT_EMAIL)"
            );
        }

        Self { channels }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Send to every channel, awaiting completion. Fails if no channel delivered.
    pub async fn send_report(&self, report: &DailyReport) -> Result<usize, NotificationError> {
        if self.channels.is_empty() {
            return Err(NotificationError::Config(
                "no notification channel configured".into(),
            ));
        }

        let mut delivered = 0;
        let mut last_error = None;
        for channel in &self.channels {
            match channel.send(report).await {
                Ok(()) => {
                    tracing::info!("✅ Report sent via {}", channel.name());
                    delivered += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to send report via {}: {}", channel.name(), e);
                    last_error = Some(e);
                }
            }
        }

        match (delivered, last_error) {
            (0, Some(e)) => Err(e),
            _ => Ok(delivered),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> NotificationConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NotificationConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.smtp_tls, SmtpTls::StartTls);
        assert!(!config.is_complete());
    }

    #[test]
    fn test_config_reads_app_password_and_recipient_list() {
        let config = config_from(&[
            ("SENDER_EMAIL", "screener@example.com"),
            ("SENDER_PASSWORD", " "),
            ("SENDER_APP_PASSWORD", "abcd efgh"),
            ("RECIPIENT_EMAIL", "a@example.com, b@example.com,,"),
            ("SMTP_PORT", "2525"),
            ("SMTP_TLS", "TLS"),
        ]);

        assert_eq!(config.sender_password.as_deref(), Some("abcd efgh"));
        assert_eq!(config.recipients, vec!["a@example.com", "b@example.com"]);
        assert_eq!(config.smtp_port, 2525);
        assert_eq!(config.smtp_tls, SmtpTls::Tls);
        assert!(config.is_complete());
    }

    #[test]
    fn test_subject_uses_report_date() {
        let report = test_support::sample_report();
        assert_eq!(report.subject(), "Value & Momentum Screening Report - 2024-07-01");
    }

    #[tokio::test]
    async fn test_send_without_channels_is_config_error() {
        let service = NotificationService::new(&config_from(&[]));
        assert!(service.is_empty());

        let err = service.send_report(&test_support::sample_report()).await.unwrap_err();
        assert!(matches!(err, NotificationError::Config(_)));
    }
}
