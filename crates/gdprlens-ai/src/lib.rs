//! Annotation layer: prompt construction, chat-completion transport, retry policy, JSON extraction.

mod annotator;
pub mod config;
pub mod extract;
pub mod prompt;
pub mod retry;
pub mod transport;

pub use annotator::{Annotate, CaseAnnotator};
pub use config::{AnnotatorConfig, ConfigError, PLACEHOLDER_API_KEY};
pub use extract::{extract_json_object, ExtractError};
pub use retry::{AttemptOutcome, RetryPolicy, RetryStep};
pub use transport::{ChatMessage, ChatRequest, ChatTransport, HttpTransport, RawResponse, TransportError};
