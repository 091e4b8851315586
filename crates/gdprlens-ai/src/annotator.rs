//! Case annotation against a chat-completion endpoint.

use std::time::Instant;

use async_trait::async_trait;
use gdprlens_core::fields::{missing_fields, mistyped_fields};
use gdprlens_core::{AnnotationResult, FailureKind};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{AnnotatorConfig, ConfigError};
use crate::extract::extract_json_object;
use crate::prompt::{annotation_prompt, PING_PROMPT, SYSTEM_PROMPT};
use crate::retry::{AttemptOutcome, RetryStep};
use crate::transport::{ChatMessage, ChatRequest, ChatTransport, HttpTransport, RawResponse, TransportError};

/// Anything that can turn case text into an annotation.
#[async_trait]
pub trait Annotate: Send + Sync {
    async fn annotate(&self, text: &str) -> AnnotationResult;
}

#[derive(Deserialize)]
struct CompletionEnvelope {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Annotates case text through a [`ChatTransport`], retrying transient failures.
///
/// Holds no per-call state: every [`annotate`](Self::annotate) call runs its
/// own retry schedule, so one annotator can serve concurrent calls.
pub struct CaseAnnotator<T> {
    config: AnnotatorConfig,
    transport: T,
}

impl CaseAnnotator<HttpTransport> {
    /// Annotator over HTTP using the configured endpoint and API key.
    pub fn http(config: AnnotatorConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(config.endpoint.clone(), config.api_key.clone());
        debug!(endpoint = transport.endpoint(), model = %config.model, "using HTTP transport");
        Self::new(config, transport)
    }
}

impl<T: ChatTransport> CaseAnnotator<T> {
    pub fn new(config: AnnotatorConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    fn annotation_request(&self, text: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(annotation_prompt(text)),
            ],
            temperature: Some(self.config.temperature),
            max_tokens: self.config.max_tokens,
        }
    }

    /// Annotate one case text.
    ///
    /// Timeouts and request failures are retried per the configured
    /// [`RetryPolicy`](crate::RetryPolicy). Any HTTP response ends the call.
    pub async fn annotate(&self, text: &str) -> AnnotationResult {
        let request = self.annotation_request(text);
        let policy = self.config.retry;
        let text_length = text.chars().count();
        let mut attempt = 1;

        loop {
            info!(
                attempt,
                max_attempts = policy.max_attempts,
                text_length,
                "calling completion endpoint"
            );
            let started = Instant::now();
            let sent = self
                .transport
                .send(&request, self.config.request_timeout)
                .await;
            let elapsed_secs = started.elapsed().as_secs_f64();

            let outcome = match sent {
                Ok(response) => {
                    info!(status = response.status, elapsed_secs, "completion call finished");
                    return interpret_response(response);
                }
                Err(TransportError::Timeout) => {
                    warn!(attempt, elapsed_secs, "completion request timed out");
                    AttemptOutcome::TimedOut
                }
                Err(TransportError::Request(reason)) => {
                    warn!(attempt, %reason, "completion request failed");
                    AttemptOutcome::RequestFailed
                }
            };

            match policy.next(attempt, outcome) {
                RetryStep::RetryAfter {
                    attempt: next,
                    delay,
                } => {
                    info!(delay_secs = delay.as_secs_f64(), "waiting before retry");
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryStep::Exhausted => {
                    warn!(attempts = attempt, "retries exhausted");
                    return AnnotationResult::failed(
                        FailureKind::ExhaustedRetries,
                        "Max retries exceeded",
                        "",
                    );
                }
            }
        }
    }

    /// Send a minimal request and report whether the endpoint answers with success.
    pub async fn connectivity_check(&self) -> bool {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::user(PING_PROMPT)],
            temperature: None,
            max_tokens: 10,
        };
        match self
            .transport
            .send(&request, self.config.check_timeout)
            .await
        {
            Ok(response) if (200..300).contains(&response.status) => {
                info!(status = response.status, "connectivity check passed");
                true
            }
            Ok(response) => {
                warn!(
                    status = response.status,
                    body = %response.body,
                    "connectivity check rejected"
                );
                false
            }
            Err(e) => {
                warn!(error = %e, "connectivity check failed");
                false
            }
        }
    }
}

#[async_trait]
impl<T: ChatTransport> Annotate for CaseAnnotator<T> {
    async fn annotate(&self, text: &str) -> AnnotationResult {
        CaseAnnotator::annotate(self, text).await
    }
}

/// Turn an HTTP response into an annotation. Never retried.
///
/// A 200 whose body is not a completion envelope (including a body that is
/// not JSON at all) is reported as `Incorrect response format from API` with
/// the body kept in `raw_output`, so the record shows what the server sent.
fn interpret_response(response: RawResponse) -> AnnotationResult {
    if response.status != 200 {
        warn!(status = response.status, body = %response.body, "completion endpoint rejected request");
        return AnnotationResult::failed(
            FailureKind::RemoteRejection,
            format!("API request failed with status code {}", response.status),
            response.body,
        );
    }

    let content = serde_json::from_str::<CompletionEnvelope>(&response.body)
        .ok()
        .and_then(|envelope| envelope.choices.into_iter().next())
        .map(|choice| choice.message.content.unwrap_or_default());

    let Some(content) = content else {
        warn!(body = %response.body, "unexpected completion envelope");
        return AnnotationResult::failed(
            FailureKind::RemoteRejection,
            "Incorrect response format from API",
            response.body,
        );
    };

    if content.is_empty() {
        warn!("completion endpoint returned empty text");
        return AnnotationResult::failed(
            FailureKind::RemoteRejection,
            "Empty text in API response",
            "",
        );
    }

    match extract_json_object(&content) {
        Ok(fields) => {
            let missing = missing_fields(&fields);
            if !missing.is_empty() {
                warn!(?missing, "annotation is missing catalogue fields");
            }
            let mistyped = mistyped_fields(&fields);
            if !mistyped.is_empty() {
                warn!(?mistyped, "annotation has values of the wrong kind");
            }
            AnnotationResult::Fields(fields)
        }
        Err(e) => {
            warn!(error = %e, content_length = content.len(), "could not parse annotation");
            AnnotationResult::failed(FailureKind::Parse, e.to_string(), content)
        }
    }
}
