use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::templates::ReportTemplate;
use crate::{DailyReport, NotificationChannel, NotificationConfig, NotificationError, SmtpTls};

/// Implicit-TLS port tried after a failed STARTTLS attempt.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// One way of reaching the SMTP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportAttempt {
    pub tls: SmtpTls,
    pub port: u16,
}

/// Connection attempts in order: the configured mode first, then implicit TLS
/// on 465 when the configured mode is STARTTLS on another port.
pub fn transport_plan(config: &NotificationConfig) -> Vec<TransportAttempt> {
    let mut plan = vec![TransportAttempt {
        tls: config.smtp_tls,
        port: config.smtp_port,
    }];
    if config.smtp_tls == SmtpTls::StartTls && config.smtp_port != IMPLICIT_TLS_PORT {
        plan.push(TransportAttempt {
            tls: SmtpTls::Tls,
            port: IMPLICIT_TLS_PORT,
        });
    }
    plan
}

pub struct SmtpNotifier {
    transports: Vec<(TransportAttempt, AsyncSmtpTransport<Tokio1Executor>)>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl SmtpNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let from_addr = config
            .sender_email
            .as_deref()
            .ok_or_else(|| NotificationError::Config("SENDER_EMAIL not set".into()))?;
        let password = config.sender_password.as_deref().ok_or_else(|| {
            NotificationError::Config("SENDER_PASSWORD or SENDER_APP_PASSWORD not set".into())
        })?;

        let from: Mailbox = from_addr
            .parse()
            .map_err(|e| NotificationError::Config(format!("Invalid sender address: {}", e)))?;

        let to: Vec<Mailbox> = config
            .recipients
            .iter()
            .filter_map(|addr| match addr.parse() {
                Ok(mailbox) => Some(mailbox),
                Err(e) => {
                    tracing::warn!("Ignoring invalid recipient {}: {}", addr, e);
                    None
                }
            })
            .collect();

        if to.is_empty() {
            return Err(NotificationError::Config(
                "No valid RECIPIENT_EMAIL addresses".into(),
            ));
        }

        let credentials = Credentials::new(from_addr.to_string(), password.to_string());
        let transports = transport_plan(config)
            .into_iter()
            .map(|attempt| {
                build_transport(&config.smtp_host, attempt, credentials.clone())
                    .map(|transport| (attempt, transport))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            transports,
            from,
            to,
        })
    }

    fn build_message(&self, report: &DailyReport) -> Result<Message, NotificationError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(report.subject())
            .header(ContentType::TEXT_HTML);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }

        builder
            .body(ReportTemplate::render(report))
            .map_err(|e| NotificationError::Smtp(format!("Failed to build email: {}", e)))
    }
}

fn build_transport(
    host: &str,
    attempt: TransportAttempt,
    credentials: Credentials,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
    let builder = match attempt.tls {
        SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
        SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
        SmtpTls::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)),
    }
    .map_err(|e| NotificationError::Smtp(format!("SMTP transport error: {}", e)))?;

    Ok(builder.port(attempt.port).credentials(credentials).build())
}

#[async_trait]
impl NotificationChannel for SmtpNotifier {
    async fn send(&self, report: &DailyReport) -> Result<(), NotificationError> {
        let email = self.build_message(report)?;

        let mut last_error = String::from("no SMTP transport configured");
        for (attempt, transport) in &self.transports {
            tracing::info!("Trying SMTP {:?} on port {}", attempt.tls, attempt.port);
            match transport.send(email.clone()).await {
                Ok(_) => {
                    tracing::info!("✅ Email report sent to {} recipients", self.to.len());
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("❌ SMTP {:?} on port {} failed: {}", attempt.tls, attempt.port, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(NotificationError::Smtp(format!(
            "All SMTP configurations failed: {}",
            last_error
        )))
    }

    fn name(&self) -> &str {
        "smtp"
    }
}
