use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::application::ReportSender;
use crate::connector::config::SmtpConfig;
use crate::domain::{DomainError, EmailReport};

/// [`ReportSender`] that delivers the report as a single HTML email over
/// authenticated SMTP (STARTTLS relay).
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    pub fn new(config: &SmtpConfig) -> Result<Self, DomainError> {
        let from: Mailbox = config.email.parse().map_err(|e| {
            DomainError::config(format!("invalid sender address '{}': {e}", config.email))
        })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .map_err(|e| {
                DomainError::config(format!("invalid SMTP relay '{}': {e}", config.server))
            })?
            .port(config.port)
            .credentials(Credentials::new(
                config.email.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl ReportSender for SmtpSender {
    async fn send(&self, report: &EmailReport) -> Result<(), DomainError> {
        if report.to.is_empty() && report.cc.is_empty() {
            return Err(DomainError::invalid_input("no recipients to send to"));
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(&report.subject)
            .header(ContentType::TEXT_HTML);

        for to in &report.to {
            let mailbox: Mailbox = to.parse().map_err(|e| {
                DomainError::invalid_input(format!("invalid recipient address '{to}': {e}"))
            })?;
            builder = builder.to(mailbox);
        }
        for cc in &report.cc {
            let mailbox: Mailbox = cc.parse().map_err(|e| {
                DomainError::invalid_input(format!("invalid cc address '{cc}': {e}"))
            })?;
            builder = builder.cc(mailbox);
        }

        let email = builder
            .body(report.html_body.clone())
            .map_err(|e| DomainError::invalid_input(format!("failed to build email: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| DomainError::transport(format!("SMTP send failed: {e}")))?;

        Ok(())
    }
}
