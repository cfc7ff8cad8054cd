use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use veille::{
    AskOptions, ChatService, DomainError, EmailReport, EmailStatus, PromptSpec, Recipients,
    ReportKind, ReportPeriod, ReportRequest, ReportSender, RunReportUseCase,
};

struct FixedAnswerChat {
    answer: String,
    questions: Arc<Mutex<Vec<(String, String)>>>,
}

impl FixedAnswerChat {
    fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            questions: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ChatService for FixedAnswerChat {
    async fn ask(
        &self,
        question: &str,
        model: &str,
        _options: &AskOptions,
    ) -> Result<String, DomainError> {
        self.questions
            .lock()
            .expect("lock")
            .push((question.to_string(), model.to_string()));
        Ok(self.answer.clone())
    }

    async fn ask_stream(
        &self,
        question: &str,
        model: &str,
        options: &AskOptions,
    ) -> Result<BoxStream<'static, Result<String, DomainError>>, DomainError> {
        let answer = self.ask(question, model, options).await?;
        Ok(futures_util::stream::once(async move { Ok(answer) }).boxed())
    }
}

#[derive(Default)]
struct RecordingSender {
    sent: Arc<Mutex<Vec<EmailReport>>>,
    fail_with: Option<String>,
}

#[async_trait]
impl ReportSender for RecordingSender {
    async fn send(&self, report: &EmailReport) -> Result<(), DomainError> {
        if let Some(reason) = &self.fail_with {
            return Err(DomainError::transport(reason.clone()));
        }
        self.sent.lock().expect("lock").push(report.clone());
        Ok(())
    }
}

fn period() -> ReportPeriod {
    ReportPeriod::ending_on(
        chrono::NaiveDate::from_ymd_opt(2026, 8, 24).expect("valid date"),
        60,
    )
}

fn request(template: Option<&str>) -> ReportRequest {
    ReportRequest {
        kind: ReportKind::Juridique,
        period: period(),
        prompt: PromptSpec {
            prompt: "  Veille du {start_date} au {end_date} ({current_year})  ".to_string(),
            model: "sonar-pro".to_string(),
        },
        template: template.map(str::to_string),
        recipients: Recipients {
            to: vec!["dir@example.com".to_string()],
            cc: vec!["qualite@example.com".to_string()],
        },
    }
}

#[tokio::test]
async fn run_substitutes_placeholders_and_emails_cleaned_answer() {
    let chat = Arc::new(FixedAnswerChat::new("```html\n<p>rapport</p>\n```"));
    let sender = Arc::new(RecordingSender::default());
    let use_case = RunReportUseCase::new(chat.clone(), sender.clone());

    let template = "<h1>Veille {type}</h1><p>{start_date} - {end_date}</p>{response_text}";
    let outcome = use_case.execute(&request(Some(template))).await.expect("run");

    assert_eq!(outcome.email, EmailStatus::Sent);
    assert_eq!(outcome.answer, "```html\n<p>rapport</p>\n```");

    let questions = chat.questions.lock().expect("lock");
    assert_eq!(
        questions[0].0,
        "Veille du 25/06/2026 au 24/08/2026 (2026)"
    );
    assert_eq!(questions[0].1, "sonar-pro");

    let sent = sender.sent.lock().expect("lock");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Veille juridique");
    assert_eq!(sent[0].to, vec!["dir@example.com"]);
    assert_eq!(sent[0].cc, vec!["qualite@example.com"]);
    assert_eq!(
        sent[0].html_body,
        "<h1>Veille juridique</h1><p>25/06/2026 - 24/08/2026</p><p>rapport</p>"
    );
}

#[tokio::test]
async fn missing_template_sends_the_cleaned_answer_bare() {
    let chat = Arc::new(FixedAnswerChat::new("```\n<p>rapport</p>\n```"));
    let sender = Arc::new(RecordingSender::default());
    let use_case = RunReportUseCase::new(chat, sender.clone());

    let outcome = use_case.execute(&request(None)).await.expect("run");

    assert_eq!(outcome.email, EmailStatus::Sent);
    let sent = sender.sent.lock().expect("lock");
    assert_eq!(sent[0].html_body, "<p>rapport</p>");
}

#[tokio::test]
async fn send_failure_is_reported_not_raised() {
    let chat = Arc::new(FixedAnswerChat::new("<p>rapport</p>"));
    let sender = Arc::new(RecordingSender {
        fail_with: Some("relay down".to_string()),
        ..Default::default()
    });
    let use_case = RunReportUseCase::new(chat, sender);

    let outcome = use_case.execute(&request(None)).await.expect("run");

    match outcome.email {
        EmailStatus::Failed(reason) => assert!(reason.contains("relay down")),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(outcome.answer, "<p>rapport</p>");
}

#[tokio::test]
async fn empty_answer_skips_the_email() {
    let chat = Arc::new(FixedAnswerChat::new("   "));
    let sender = Arc::new(RecordingSender::default());
    let use_case = RunReportUseCase::new(chat, sender.clone());

    let outcome = use_case.execute(&request(None)).await.expect("run");

    assert!(matches!(outcome.email, EmailStatus::Skipped(_)));
    assert!(sender.sent.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn no_recipients_skips_the_email() {
    let chat = Arc::new(FixedAnswerChat::new("<p>rapport</p>"));
    let sender = Arc::new(RecordingSender::default());
    let use_case = RunReportUseCase::new(chat, sender.clone());

    let mut req = request(None);
    req.recipients = Recipients::default();
    let outcome = use_case.execute(&req).await.expect("run");

    assert!(matches!(outcome.email, EmailStatus::Skipped(_)));
    assert!(sender.sent.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn chat_failure_propagates() {
    struct FailingChat;

    #[async_trait]
    impl ChatService for FailingChat {
        async fn ask(&self, _: &str, _: &str, _: &AskOptions) -> Result<String, DomainError> {
            Err(DomainError::api(429, "rate limited"))
        }

        async fn ask_stream(
            &self,
            _: &str,
            _: &str,
            _: &AskOptions,
        ) -> Result<BoxStream<'static, Result<String, DomainError>>, DomainError> {
            Err(DomainError::api(429, "rate limited"))
        }
    }

    let use_case = RunReportUseCase::new(Arc::new(FailingChat), Arc::new(RecordingSender::default()));
    let err = use_case.execute(&request(None)).await.unwrap_err();
    assert_eq!(err.status(), Some(429));
}
