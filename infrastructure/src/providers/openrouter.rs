//! OpenRouter-compatible model client
//!
//! Speaks the OpenAI `/chat/completions` wire format: JSON request, SSE
//! streaming response. OpenRouter fronts every model the default council
//! needs, and any endpoint speaking the same format (vLLM, LM Studio,
//! llama.cpp server) works by pointing `base_url` at it.
//!
//! SSE events can be split across TCP packets, so the stream keeps a line
//! buffer across chunks and parses only complete `data:` lines.

use async_trait::async_trait;
use council_application::ports::model_client::{
    ChunkStream, CompletionRequest, ModelClient, ModelClientError,
};
use council_domain::{Message, Role};
use futures::StreamExt;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Client for one OpenAI-compatible chat completions endpoint.
///
/// The per-call timeout is enforced at the HTTP client level and covers
/// the whole request, including body streaming.
pub struct OpenRouterClient {
    http: reqwest::Client,
    chat_url: String,
    api_key: String,
    extra_headers: Vec<(String, String)>,
}

impl OpenRouterClient {
    /// `base_url` ends before `/chat/completions`, e.g.
    /// `https://openrouter.ai/api/v1`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        per_call_timeout: Duration,
    ) -> Result<Self, ModelClientError> {
        let http = reqwest::Client::builder()
            .timeout(per_call_timeout)
            .build()
            .map_err(|e| ModelClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            chat_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            extra_headers: Vec::new(),
        })
    }

    /// Attach an extra header to every request (OpenRouter attribution
    /// headers like `HTTP-Referer` / `X-Title`).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    fn body(request: &CompletionRequest, stream: bool) -> Value {
        let messages: Vec<Value> = request.messages.iter().map(message_json).collect();
        json!({
            "model": request.model_id,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": stream,
        })
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response, ModelClientError> {
        let mut req = self
            .http
            .post(&self.chat_url)
            .bearer_auth(&self.api_key)
            .json(body);
        for (name, value) in &self.extra_headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let response = req.send().await.map_err(into_client_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ModelClientError::Provider(format!("{status}: {text}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<String, ModelClientError> {
        debug!(model = %request.model_id, "sending completion request");
        let body = Self::body(&request, false);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ModelClientError::Cancelled),
            response = self.post(&body) => response?,
        };

        let value: Value = tokio::select! {
            _ = cancel.cancelled() => return Err(ModelClientError::Cancelled),
            value = response.json() => value.map_err(into_client_error)?,
        };

        value["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ModelClientError::MalformedReply("reply carries no message content".to_string())
            })
    }

    async fn stream(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, ModelClientError> {
        debug!(model = %request.model_id, "opening completion stream");
        let body = Self::body(&request, true);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ModelClientError::Cancelled),
            response = self.post(&body) => response?,
        };

        let chunks = response
            .bytes_stream()
            .take_until(Box::pin(cancel.cancelled_owned()))
            .scan(String::new(), |buffer, chunk| {
                let items: Vec<Result<SseLine, ModelClientError>> = match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        drain_data_lines(buffer)
                    }
                    Err(error) => vec![Err(into_client_error(error))],
                };
                std::future::ready(Some(items))
            })
            .flat_map(futures::stream::iter)
            .take_while(|item| {
                std::future::ready(!matches!(item, Ok(SseLine::Done)))
            })
            .filter_map(|item| {
                std::future::ready(match item {
                    Ok(SseLine::Delta(text)) if !text.is_empty() => Some(Ok(text)),
                    Ok(_) => None,
                    Err(error) => Some(Err(error)),
                })
            });

        Ok(Box::pin(chunks))
    }
}

/// One parsed SSE `data:` payload.
#[derive(Debug, PartialEq)]
enum SseLine {
    /// A text delta (possibly empty).
    Delta(String),
    /// The `[DONE]` sentinel.
    Done,
}

/// Drain all complete `\n`-terminated lines from `buffer`.
///
/// A trailing incomplete line stays in the buffer to be extended by the
/// next TCP chunk.
fn drain_data_lines(buffer: &mut String) -> Vec<Result<SseLine, ModelClientError>> {
    let mut items = Vec::new();
    while let Some(newline) = buffer.find('\n') {
        let line = buffer[..newline].trim_end_matches('\r').to_string();
        buffer.drain(..=newline);
        if let Some(item) = parse_data_line(&line) {
            items.push(Ok(item));
        }
    }
    items
}

/// Parse one complete SSE line. Returns `None` for empty lines, comments,
/// and keep-alive noise.
fn parse_data_line(line: &str) -> Option<SseLine> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(SseLine::Done);
    }
    let value: Value = serde_json::from_str(data).ok()?;
    let delta = value["choices"][0]["delta"]["content"]
        .as_str()
        .unwrap_or_default();
    Some(SseLine::Delta(delta.to_string()))
}

fn into_client_error(error: reqwest::Error) -> ModelClientError {
    if error.is_timeout() {
        ModelClientError::Timeout
    } else if error.is_decode() {
        ModelClientError::MalformedReply(error.to_string())
    } else {
        ModelClientError::Network(error.to_string())
    }
}

fn message_json(message: &Message) -> Value {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    };
    json!({ "role": role, "content": message.content })
}
