use async_trait::async_trait;

use crate::domain::{DomainError, EmailReport};

/// Delivers a rendered report to its recipients.
#[async_trait]
pub trait ReportSender: Send + Sync {
    async fn send(&self, report: &EmailReport) -> Result<(), DomainError>;
}
