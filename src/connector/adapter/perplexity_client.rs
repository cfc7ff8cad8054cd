use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{debug, info};

use crate::application::ChatService;
use crate::connector::adapter::EventStream;
use crate::connector::config::ClientConfig;
use crate::domain::{
    AskOptions, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, DomainError,
    StreamChunk,
};

const COMPLETIONS_PATH: &str = "/chat/completions";
/// Model substituted by [`PerplexityClient::search`] when the caller's model
/// is not a retrieval-augmented ("online") variant.
pub const DEFAULT_ONLINE_MODEL: &str = "sonar-medium-online";

/// Error body shape returned by the API on non-2xx statuses.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// HTTP client for a Perplexity-style chat-completion API.
///
/// One endpoint (`POST {base}/chat/completions`), two response modes:
/// a single JSON document, or a newline-delimited `data: ` frame stream
/// decoded by [`EventStream`]. The client performs no retries; callers that
/// want retry/backoff wrap their own around it. The underlying connection
/// pool is owned by the client and released when it is dropped.
#[derive(Debug)]
pub struct PerplexityClient {
    client: reqwest::Client,
    default_model: String,
    /// Full endpoint URL (base + COMPLETIONS_PATH).
    url: String,
}

impl PerplexityClient {
    /// Build a client from an explicit configuration value.
    ///
    /// Fails with a configuration error when the key is empty or unusable as
    /// a header value; no network activity happens here.
    pub fn new(config: &ClientConfig) -> Result<Self, DomainError> {
        if config.api_key.trim().is_empty() {
            return Err(DomainError::config(
                "API key is required to construct the chat client",
            ));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|_| {
                    DomainError::config("API key contains characters invalid in a header value")
                })?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| DomainError::config(format!("failed to build HTTP client: {e}")))?;

        let url = format!("{}{COMPLETIONS_PATH}", config.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            default_model: config.default_model.clone(),
            url,
        })
    }

    /// Model used when callers do not specify one.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn validate(request: &ChatCompletionRequest) -> Result<(), DomainError> {
        if request.model.trim().is_empty() {
            return Err(DomainError::invalid_input("model must be a non-empty identifier"));
        }
        if request.messages.is_empty() {
            return Err(DomainError::invalid_input("messages must not be empty"));
        }
        Ok(())
    }

    async fn post(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response, DomainError> {
        debug!(model = %request.model, stream = request.stream, "POST {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| DomainError::transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }
        Ok(response)
    }

    /// Issue one non-streaming chat completion.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, DomainError> {
        Self::validate(request)?;
        let response = self.post(request).await?;
        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| DomainError::decode(format!("failed to decode chat completion: {e}")))
    }

    /// Issue one streaming chat completion and return the lazy chunk
    /// sequence. `stream: true` is forced onto the request.
    pub async fn chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk, DomainError>>, DomainError> {
        Self::validate(request)?;
        let mut request = request.clone();
        request.stream = true;

        let response = self.post(&request).await?;
        Ok(EventStream::new(response.bytes_stream().boxed()).boxed())
    }

    fn build_messages(question: &str, options: &AskOptions) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &options.system_message {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(question));
        messages
    }

    fn build_request(question: &str, model: &str, options: &AskOptions) -> ChatCompletionRequest {
        let mut request = ChatCompletionRequest::new(model, Self::build_messages(question, options));
        if let Some(max_tokens) = options.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }

    /// Ask a question and return the answer text.
    pub async fn ask(
        &self,
        question: &str,
        model: &str,
        options: &AskOptions,
    ) -> Result<String, DomainError> {
        let request = Self::build_request(question, model, options);
        let response = self.chat_completion(&request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::decode("response contained no choices"))?;
        Ok(choice.message.content)
    }

    /// Ask a question and return the answer as a lazy sequence of text
    /// fragments in arrival order. Contentless heartbeat chunks are skipped;
    /// concatenating the fragments reproduces the full answer.
    pub async fn ask_stream(
        &self,
        question: &str,
        model: &str,
        options: &AskOptions,
    ) -> Result<BoxStream<'static, Result<String, DomainError>>, DomainError> {
        let request = Self::build_request(question, model, options).streaming();
        let chunks = self.chat_completion_stream(&request).await?;
        Ok(chunks
            .filter_map(|chunk| async move {
                match chunk {
                    Ok(c) => c.into_content().map(Ok),
                    Err(e) => Some(Err(e)),
                }
            })
            .boxed())
    }

    /// Answer a query with live retrieval. When `model` is not an online
    /// variant the default online model is substituted; the substitution is
    /// logged rather than silent so callers can see their model was
    /// overridden.
    pub async fn search(&self, query: &str, model: &str) -> Result<String, DomainError> {
        let model = if model.contains("online") {
            model
        } else {
            info!(
                requested = %model,
                substituted = DEFAULT_ONLINE_MODEL,
                "Model is not an online variant; substituting the default online model"
            );
            DEFAULT_ONLINE_MODEL
        };
        self.ask(query, model, &AskOptions::default()).await
    }
}

#[async_trait]
impl ChatService for PerplexityClient {
    async fn ask(
        &self,
        question: &str,
        model: &str,
        options: &AskOptions,
    ) -> Result<String, DomainError> {
        PerplexityClient::ask(self, question, model, options).await
    }

    async fn ask_stream(
        &self,
        question: &str,
        model: &str,
        options: &AskOptions,
    ) -> Result<BoxStream<'static, Result<String, DomainError>>, DomainError> {
        PerplexityClient::ask_stream(self, question, model, options).await
    }
}

/// Map a non-2xx response to an API error: prefer the body's
/// `error.message` when the body is JSON of that shape, otherwise fall back
/// to `HTTP <code>: <reason>`.
fn api_error(status: reqwest::StatusCode, body: &str) -> DomainError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            )
        });
    DomainError::api(status.as_u16(), message)
}
