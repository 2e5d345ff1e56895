//! Stage runners
//!
//! One function per deliberation stage. Each fans out over its model set,
//! forwards partial results to the event sink as they arrive, enforces the
//! per-call timeout and the stage deadline, and returns immutable results
//! the orchestrator threads forward. Per-model failures never abort a
//! stage; they become error artifacts and soft error events.

use crate::multiplexer::EventSink;
use crate::ports::model_client::{CompletionRequest, ModelClient, ModelClientError};
use crate::registry::RegisteredModel;
use council_domain::{
    CouncilEvent, LabelMap, Message, ModelOpinion, ReviewResult, parse_review,
};
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Sampling knobs shared by every call in a turn.
#[derive(Debug, Clone, Copy)]
pub struct CallParams {
    pub temperature: f64,
    pub max_tokens: u32,
    pub per_call_timeout: Duration,
}

impl CallParams {
    fn request(&self, model_id: &str, messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest {
            model_id: model_id.to_string(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Stage 1: fan the stage-1 prompt out to every councilor in parallel.
///
/// Chunks are forwarded as `model_response` events while streams are live;
/// chunks for different models may interleave, chunks for one model keep
/// their production order. The stage completes when every stream has
/// terminated or the stage deadline fires; models still running at the
/// deadline are recorded with `error = "timeout"`.
pub async fn run_opinion_stage(
    councilors: &[RegisteredModel],
    messages: &[Message],
    params: CallParams,
    deadline: Duration,
    sink: &EventSink,
    cancel: &CancellationToken,
) -> Vec<ModelOpinion> {
    let mut join_set = JoinSet::new();

    for councilor in councilors {
        let client = Arc::clone(&councilor.client);
        let model_id = councilor.id().to_string();
        let request = params.request(&model_id, messages.to_vec());
        let sink = sink.clone();
        let cancel = cancel.clone();
        let per_call = params.per_call_timeout;

        join_set.spawn(async move {
            let result = stream_opinion(client, request, per_call, &sink, &cancel).await;
            (model_id, result)
        });
    }

    let stage_ends = Instant::now() + deadline;
    let mut opinions: Vec<ModelOpinion> = Vec::with_capacity(councilors.len());
    let mut finished: HashSet<String> = HashSet::new();

    while !join_set.is_empty() {
        match timeout_at(stage_ends, join_set.join_next()).await {
            Ok(Some(Ok((model_id, Ok(text))))) => {
                debug!(model = %model_id, "opinion complete");
                finished.insert(model_id.clone());
                opinions.push(ModelOpinion::success(model_id, text));
            }
            Ok(Some(Ok((model_id, Err(error))))) => {
                warn!(model = %model_id, %error, "opinion failed");
                sink.emit(CouncilEvent::model_error(&model_id, error.to_string()))
                    .await;
                finished.insert(model_id.clone());
                opinions.push(ModelOpinion::failure(model_id, error.to_string()));
            }
            Ok(Some(Err(join_error))) => {
                warn!(%join_error, "opinion task aborted");
            }
            Ok(None) => break,
            Err(_) => {
                debug!("stage-1 deadline reached, aborting remaining streams");
                join_set.abort_all();
                break;
            }
        }
    }

    for councilor in councilors {
        if !finished.contains(councilor.id()) {
            sink.emit(CouncilEvent::model_error(councilor.id(), "timeout"))
                .await;
            opinions.push(ModelOpinion::failure(councilor.id(), "timeout"));
        }
    }

    opinions
}

/// Drive one councilor's stream to completion, forwarding chunks.
async fn stream_opinion(
    client: Arc<dyn ModelClient>,
    request: CompletionRequest,
    per_call: Duration,
    sink: &EventSink,
    cancel: &CancellationToken,
) -> Result<String, ModelClientError> {
    let model_id = request.model_id.clone();

    let consume = async {
        let mut chunks = client.stream(request, cancel.clone()).await?;
        let mut text = String::new();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            text.push_str(&chunk);
            if !sink.emit(CouncilEvent::model_chunk(&model_id, &chunk)).await {
                return Err(ModelClientError::Cancelled);
            }
        }
        Ok(text)
    };

    tokio::select! {
        _ = cancel.cancelled() => Err(ModelClientError::Cancelled),
        result = timeout(per_call, consume) => match result {
            Ok(inner) => inner,
            Err(_) => Err(ModelClientError::Timeout),
        },
    }
}

/// Stage 2: every reviewer judges the anonymized opinion set.
///
/// All reviewers receive the identical prompt (their own opinion included
/// under its label; the parser drops self-rankings). One `review` event is
/// emitted per received reply, parseable or not; calls that never return a
/// reply emit a soft `error` event and are recorded as unparsed reviews.
pub async fn run_review_stage(
    reviewers: &[RegisteredModel],
    messages: &[Message],
    labels: &LabelMap,
    params: CallParams,
    deadline: Duration,
    sink: &EventSink,
    cancel: &CancellationToken,
) -> Vec<ReviewResult> {
    let mut join_set = JoinSet::new();

    for reviewer in reviewers {
        let client = Arc::clone(&reviewer.client);
        let model_id = reviewer.id().to_string();
        let request = params.request(&model_id, messages.to_vec());
        let cancel = cancel.clone();
        let per_call = params.per_call_timeout;

        join_set.spawn(async move {
            let call = client.complete(request, cancel.clone());
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(ModelClientError::Cancelled),
                reply = timeout(per_call, call) => match reply {
                    Ok(inner) => inner,
                    Err(_) => Err(ModelClientError::Timeout),
                },
            };
            (model_id, result)
        });
    }

    let stage_ends = Instant::now() + deadline;
    let mut reviews: Vec<ReviewResult> = Vec::with_capacity(reviewers.len());
    let mut finished: HashSet<String> = HashSet::new();

    while !join_set.is_empty() {
        match timeout_at(stage_ends, join_set.join_next()).await {
            Ok(Some(Ok((model_id, Ok(reply))))) => {
                let review = parse_review(&model_id, labels, &reply);
                if !review.parse_ok {
                    debug!(model = %model_id, "review reply did not parse");
                }
                sink.emit(CouncilEvent::review(&review)).await;
                finished.insert(model_id);
                reviews.push(review);
            }
            Ok(Some(Ok((model_id, Err(error))))) => {
                warn!(model = %model_id, %error, "review call failed");
                sink.emit(CouncilEvent::model_error(&model_id, error.to_string()))
                    .await;
                finished.insert(model_id.clone());
                reviews.push(ReviewResult::errored(model_id));
            }
            Ok(Some(Err(join_error))) => {
                warn!(%join_error, "review task aborted");
            }
            Ok(None) => break,
            Err(_) => {
                debug!("stage-2 deadline reached, aborting remaining reviews");
                join_set.abort_all();
                break;
            }
        }
    }

    for reviewer in reviewers {
        if !finished.contains(reviewer.id()) {
            sink.emit(CouncilEvent::model_error(reviewer.id(), "timeout"))
                .await;
            reviews.push(ReviewResult::errored(reviewer.id()));
        }
    }

    reviews
}

/// Outcome of the synthesis stream.
#[derive(Debug)]
pub struct SynthesisOutcome {
    /// Whatever text was produced, possibly a truncated prefix.
    pub text: String,
    /// Error that ended the stream, if any. A stage deadline is not an
    /// error: it truncates the text and leaves this unset.
    pub error: Option<ModelClientError>,
}

/// Stage 3: stream the chairman's synthesis.
///
/// Chunks are forwarded as `final_response` events. The stage deadline
/// truncates the output and completes the turn; a stream error surfaces in
/// the outcome for the orchestrator to report.
pub async fn run_synthesis_stage(
    chairman: &RegisteredModel,
    messages: Vec<Message>,
    params: CallParams,
    deadline: Duration,
    sink: &EventSink,
    cancel: &CancellationToken,
) -> SynthesisOutcome {
    let request = params.request(chairman.id(), messages);
    let stage_ends = Instant::now() + deadline;
    let mut text = String::new();

    let opened = tokio::select! {
        _ = cancel.cancelled() => {
            return SynthesisOutcome { text, error: Some(ModelClientError::Cancelled) };
        }
        opened = timeout_at(stage_ends, chairman.client.stream(request, cancel.clone())) => opened,
    };

    let mut chunks = match opened {
        Err(_) => {
            debug!("stage-3 deadline reached before the stream opened");
            return SynthesisOutcome { text, error: None };
        }
        Ok(Err(error)) => {
            warn!(%error, "chairman stream failed to open");
            return SynthesisOutcome {
                text,
                error: Some(error),
            };
        }
        Ok(Ok(chunks)) => chunks,
    };

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                return SynthesisOutcome { text, error: Some(ModelClientError::Cancelled) };
            }
            next = timeout_at(stage_ends, chunks.next()) => next,
        };

        match next {
            Err(_) => {
                debug!("stage-3 deadline reached, truncating synthesis");
                return SynthesisOutcome { text, error: None };
            }
            Ok(None) => return SynthesisOutcome { text, error: None },
            Ok(Some(Ok(chunk))) => {
                if chunk.is_empty() {
                    continue;
                }
                text.push_str(&chunk);
                if !sink.emit(CouncilEvent::final_chunk(&chunk)).await {
                    return SynthesisOutcome {
                        text,
                        error: Some(ModelClientError::Cancelled),
                    };
                }
            }
            Ok(Some(Err(error))) => {
                warn!(%error, "chairman stream errored mid-way");
                return SynthesisOutcome {
                    text,
                    error: Some(error),
                };
            }
        }
    }
}
