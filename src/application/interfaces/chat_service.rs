use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::{AskOptions, DomainError};

/// An interface for asking a question to a chat-completion model and getting
/// a text answer back.
///
/// Implementors encapsulate transport, serialization, and vendor-specific API
/// details. Consumers (e.g. [`crate::application::RunReportUseCase`]) remain
/// decoupled from any particular provider or HTTP client library.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Ask a single question and return the model's full answer text.
    async fn ask(&self, question: &str, model: &str, options: &AskOptions)
        -> Result<String, DomainError>;

    /// Ask a single question and return the answer as a lazy sequence of
    /// text fragments in arrival order. Concatenating all fragments yields
    /// the same text a non-streaming [`ChatService::ask`] would return.
    async fn ask_stream(
        &self,
        question: &str,
        model: &str,
        options: &AskOptions,
    ) -> Result<BoxStream<'static, Result<String, DomainError>>, DomainError>;
}
