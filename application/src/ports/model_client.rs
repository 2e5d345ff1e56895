//! Model client port
//!
//! Defines how the application layer reaches an LLM provider. One adapter
//! per provider lives in the infrastructure layer.

use async_trait::async_trait;
use council_domain::Message;
use futures::stream::BoxStream;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors surfaced by model calls.
///
/// The `Display` forms of [`Timeout`](ModelClientError::Timeout) and
/// [`Cancelled`](ModelClientError::Cancelled) are the exact strings recorded
/// on opinion artifacts, so they stay lowercase single words.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelClientError {
    #[error("provider refused the request: {0}")]
    Provider(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed reply: {0}")]
    MalformedReply(String),

    #[error("timeout")]
    Timeout,

    #[error("cancelled")]
    Cancelled,
}

/// One completion request: the target model, the wire messages, and the
/// sampling knobs forwarded on every call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model_id: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// A lazy sequence of text chunks, terminating normally or with an error.
pub type ChunkStream = BoxStream<'static, Result<String, ModelClientError>>;

/// Capability for talking to one model provider.
///
/// Implementations must honor `cancel` promptly (abort in-flight I/O) and
/// must enforce their own per-call timeout; the orchestrator layers stage
/// deadlines on top.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Full-buffer completion. Used for stage-2 reviews.
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<String, ModelClientError>;

    /// Token-chunk streaming completion. Used for stage-1 opinions and
    /// stage-3 synthesis.
    async fn stream(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, ModelClientError>;
}
