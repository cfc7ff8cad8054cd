pub mod application;
pub mod connector;
pub mod domain;

pub use application::{
    ChatService, EmailStatus, ReportOutcome, ReportRequest, ReportSender, RunReportUseCase,
};

pub use connector::{
    load_prompts, load_recipients, load_template, prompt_for, ClientConfig, PerplexityClient,
    SmtpConfig, SmtpSender, DEFAULT_ONLINE_MODEL,
};

pub use domain::{
    AskOptions, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, DomainError,
    EmailReport, PromptSpec, Recipients, ReportKind, ReportPeriod, Role, StreamChunk, Usage,
};
