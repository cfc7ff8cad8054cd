use std::sync::Arc;

use tracing::{info, warn};

use crate::application::{ChatService, ReportSender};
use crate::domain::{
    fill_placeholders, AskOptions, DomainError, EmailReport, PromptSpec, Recipients, ReportKind,
    ReportPeriod,
};

/// Sampling settings for report generation: deterministic output, generous
/// completion budget for long HTML reports.
const REPORT_TEMPERATURE: f32 = 0.0;
const REPORT_MAX_TOKENS: u32 = 20_000;

/// Everything a single report run needs, resolved by the caller before
/// execution (prompt entry, recipients, optional HTML template).
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub period: ReportPeriod,
    pub prompt: PromptSpec,
    /// HTML email template with `{type}`, `{start_date}`, `{end_date}` and
    /// `{response_text}` placeholders. When absent the cleaned answer is sent
    /// bare.
    pub template: Option<String>,
    pub recipients: Recipients,
}

/// What happened to the email leg of a run. A send failure is recorded here
/// rather than raised so the generated answer is never lost with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailStatus {
    Sent,
    Failed(String),
    /// No email was attempted (empty answer or no recipients).
    Skipped(String),
}

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// The model's raw answer, before markdown-fence cleaning.
    pub answer: String,
    pub email: EmailStatus,
}

/// Orchestrates one report run: render the prompt, ask the model once,
/// clean the answer, render the email template, and hand the result to the
/// sender.
pub struct RunReportUseCase {
    chat: Arc<dyn ChatService>,
    sender: Arc<dyn ReportSender>,
}

impl RunReportUseCase {
    pub fn new(chat: Arc<dyn ChatService>, sender: Arc<dyn ReportSender>) -> Self {
        Self { chat, sender }
    }

    pub async fn execute(&self, request: &ReportRequest) -> Result<ReportOutcome, DomainError> {
        let vars = request.period.placeholders();
        let question = request.prompt.render(&vars);

        info!(
            kind = %request.kind,
            model = %request.prompt.model,
            start = %request.period.start_str(),
            end = %request.period.end_str(),
            "Requesting report"
        );

        let options = AskOptions::default()
            .with_temperature(REPORT_TEMPERATURE)
            .with_max_tokens(REPORT_MAX_TOKENS);
        let answer = self.chat.ask(&question, &request.prompt.model, &options).await?;

        if answer.trim().is_empty() {
            warn!("Model returned an empty answer; skipping email");
            return Ok(ReportOutcome {
                answer,
                email: EmailStatus::Skipped("empty answer".to_string()),
            });
        }

        if request.recipients.is_empty() {
            warn!("No recipients configured; skipping email");
            return Ok(ReportOutcome {
                answer,
                email: EmailStatus::Skipped("no recipients".to_string()),
            });
        }

        let cleaned = clean_markdown_fences(&answer);
        let html_body = match &request.template {
            Some(template) => render_email_body(template, request.kind, &request.period, &cleaned),
            None => cleaned,
        };

        let report = EmailReport {
            to: request.recipients.to.clone(),
            cc: request.recipients.cc.clone(),
            subject: request.kind.subject().to_string(),
            html_body,
        };

        let email = match self.sender.send(&report).await {
            Ok(()) => {
                info!(
                    to = report.to.len(),
                    cc = report.cc.len(),
                    "Report email sent"
                );
                EmailStatus::Sent
            }
            Err(e) => {
                warn!("Failed to send report email: {e}");
                EmailStatus::Failed(e.to_string())
            }
        };

        Ok(ReportOutcome { answer, email })
    }
}

/// Substitute the email template placeholders with the run's values.
pub fn render_email_body(
    template: &str,
    kind: ReportKind,
    period: &ReportPeriod,
    response_text: &str,
) -> String {
    let vars = vec![
        ("type", kind.display_name().to_string()),
        ("start_date", period.start_str()),
        ("end_date", period.end_str()),
        ("response_text", response_text.to_string()),
    ];
    fill_placeholders(template, &vars)
}

/// Strip markdown code-fence syntax the model sometimes wraps HTML answers in:
/// a leading ```` ```html ```` (or bare ```` ``` ````) and a trailing
/// ```` ``` ````.
pub fn clean_markdown_fences(text: &str) -> String {
    let mut out = text.trim();

    if let Some(rest) = out.strip_prefix("```html") {
        out = rest.trim();
    }
    if let Some(rest) = out.strip_suffix("```") {
        out = rest.trim();
    }
    if let Some(rest) = out.strip_prefix("```") {
        out = rest.trim();
    }

    out.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn clean_strips_html_fence_pair() {
        let text = "```html\n<p>report</p>\n```";
        assert_eq!(clean_markdown_fences(text), "<p>report</p>");
    }

    #[test]
    fn clean_strips_bare_fences() {
        let text = "```\n<p>report</p>\n```";
        assert_eq!(clean_markdown_fences(text), "<p>report</p>");
    }

    #[test]
    fn clean_leaves_plain_text_untouched() {
        assert_eq!(clean_markdown_fences("  <p>report</p> "), "<p>report</p>");
    }

    #[test]
    fn clean_handles_leading_fence_only() {
        assert_eq!(clean_markdown_fences("```html\n<p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn render_email_body_substitutes_all_placeholders() {
        let template = "<h1>Veille {type}</h1><p>{start_date} - {end_date}</p>{response_text}";
        let period = ReportPeriod::ending_on(
            NaiveDate::from_ymd_opt(2026, 8, 24).expect("valid date"),
            60,
        );
        let body = render_email_body(template, ReportKind::Juridique, &period, "<p>ok</p>");
        assert_eq!(
            body,
            "<h1>Veille juridique</h1><p>25/06/2026 - 24/08/2026</p><p>ok</p>"
        );
    }
}
