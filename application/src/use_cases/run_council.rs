//! Run council use case
//!
//! Drives the full deliberation state machine
//! (INIT → STAGE1 → STAGE2 → STAGE3 → DONE, FAILED from anywhere) and owns
//! persistence at turn boundaries. All collaborators are injected: the
//! registry, the store, and (through the registry) the model clients.

use crate::config::CouncilSettings;
use crate::multiplexer::{self, EventSink, EventStream};
use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::registry::{ModelRegistry, RegisteredModel};
use crate::use_cases::stages::{
    CallParams, run_opinion_stage, run_review_stage, run_synthesis_stage,
};
use council_domain::{
    ChatMessage, Conversation, CouncilEvent, CouncilTurn, FailureReason, LabelMap, PromptTemplate,
    Question, RankingSummary, Stage,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors reported synchronously, before any event is emitted
#[derive(Error, Debug)]
pub enum RunCouncilError {
    #[error("Message must not be empty")]
    EmptyMessage,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input for one deliberation turn
#[derive(Debug, Clone, Default)]
pub struct RunCouncilInput {
    /// The user's question. Must be non-empty.
    pub message: String,
    /// Continue an existing conversation; a new one is created when absent.
    pub conversation_id: Option<String>,
    /// Councilor selection; configured defaults apply when absent or empty.
    pub selected_models: Option<Vec<String>>,
}

impl RunCouncilInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_conversation(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn with_models(mut self, ids: Vec<String>) -> Self {
        self.selected_models = Some(ids);
        self
    }
}

/// How a turn ended. Resolved by the driver task.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Stage 3 finished (possibly truncated) and the turn was persisted.
    Completed(CouncilTurn),
    /// A fatal condition ended the turn. `turn` holds the persisted
    /// partial artifacts when stage 1 produced at least one opinion and
    /// the append succeeded; `None` means nothing was persisted.
    Failed {
        reason: FailureReason,
        turn: Option<CouncilTurn>,
    },
    /// The caller cancelled or dropped the stream; nothing was persisted
    /// and no terminal event was sent.
    Cancelled,
}

/// A running turn.
///
/// `conversation_id` is available immediately for response metadata; the
/// events arrive on `events`; `outcome` resolves once the driver task is
/// done.
pub struct CouncilRun {
    pub conversation_id: String,
    pub events: EventStream,
    pub outcome: JoinHandle<TurnOutcome>,
}

/// Use case for running one council turn
pub struct RunCouncilUseCase {
    registry: Arc<ModelRegistry>,
    store: Arc<dyn ConversationStore>,
    settings: CouncilSettings,
}

impl RunCouncilUseCase {
    pub fn new(
        registry: Arc<ModelRegistry>,
        store: Arc<dyn ConversationStore>,
        settings: CouncilSettings,
    ) -> Self {
        Self {
            registry,
            store,
            settings,
        }
    }

    /// Start one deliberation turn.
    ///
    /// The conversation is resolved before returning so the caller can ship
    /// its id as response metadata; everything after that happens on a
    /// spawned driver task feeding the returned stream. The turn clock
    /// starts here, before history is loaded.
    pub async fn run(
        &self,
        input: RunCouncilInput,
        cancel: CancellationToken,
    ) -> Result<CouncilRun, RunCouncilError> {
        let started = Instant::now();
        let RunCouncilInput {
            message,
            conversation_id,
            selected_models,
        } = input;

        let question = Question::try_new(message).ok_or(RunCouncilError::EmptyMessage)?;

        let conversation = match &conversation_id {
            Some(id) => self.store.load(id).await?,
            None => self.store.create().await?,
        };
        let conversation_id = conversation.id.clone();

        // Councilor resolution: explicit selection, else configured
        // defaults, else every registered model.
        let selection = selected_models.filter(|ids| !ids.is_empty()).or_else(|| {
            let defaults = &self.settings.default_models;
            (!defaults.is_empty()).then(|| defaults.clone())
        });
        let (councilors, unknown) = self.registry.resolve(selection.as_deref());

        let run_cancel = cancel.child_token();
        let (sink, events) =
            multiplexer::channel(self.settings.output_buffer_size, run_cancel.clone());

        let driver = Driver {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            settings: self.settings.clone(),
        };
        let outcome = tokio::spawn(driver.drive(
            conversation,
            councilors,
            unknown,
            question,
            started,
            sink,
            run_cancel,
        ));

        Ok(CouncilRun {
            conversation_id,
            events,
            outcome,
        })
    }
}

/// Everything the spawned turn needs, detached from the use case.
struct Driver {
    registry: Arc<ModelRegistry>,
    store: Arc<dyn ConversationStore>,
    settings: CouncilSettings,
}

impl Driver {
    #[allow(clippy::too_many_arguments)]
    async fn drive(
        self,
        conversation: Conversation,
        councilors: Vec<RegisteredModel>,
        unknown: Vec<String>,
        question: Question,
        started: Instant,
        sink: EventSink,
        cancel: CancellationToken,
    ) -> TurnOutcome {
        let conversation_id = conversation.id.clone();
        let params = CallParams {
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            per_call_timeout: self.settings.per_call_timeout,
        };

        info!(
            conversation = %conversation_id,
            councilors = councilors.len(),
            "starting council turn"
        );

        // ---- Stage 1: opinions ----------------------------------------
        if !sink
            .emit(CouncilEvent::stage_update(Stage::FirstOpinions))
            .await
        {
            return TurnOutcome::Cancelled;
        }
        for id in &unknown {
            sink.emit(CouncilEvent::model_error(id, "unknown model id"))
                .await;
        }
        if councilors.is_empty() {
            sink.emit(CouncilEvent::terminal_error(FailureReason::NoCouncilors))
                .await;
            return TurnOutcome::Failed {
                reason: FailureReason::NoCouncilors,
                turn: None,
            };
        }

        let mut turn = CouncilTurn::new(Uuid::new_v4().to_string(), question.content());

        let stage1_messages =
            PromptTemplate::stage1_messages(&conversation.messages, question.content());
        let Some(deadline) = self.stage_deadline(started, self.settings.stage1_deadline) else {
            return self
                .fail_with_timeout(&conversation_id, &question, turn, &sink)
                .await;
        };
        turn.opinions =
            run_opinion_stage(&councilors, &stage1_messages, params, deadline, &sink, &cancel)
                .await;
        if cancel.is_cancelled() {
            return TurnOutcome::Cancelled;
        }
        if !turn.has_opinions() {
            sink.emit(CouncilEvent::terminal_error(FailureReason::NoOpinions))
                .await;
            return TurnOutcome::Failed {
                reason: FailureReason::NoOpinions,
                turn: None,
            };
        }

        // ---- Stage 2: peer review --------------------------------------
        if !sink.emit(CouncilEvent::stage_update(Stage::Review)).await {
            return TurnOutcome::Cancelled;
        }
        let reviewers: Vec<RegisteredModel> = councilors
            .iter()
            .filter(|councilor| {
                turn.opinions
                    .iter()
                    .any(|o| o.model_id == councilor.id() && o.is_success())
            })
            .cloned()
            .collect();
        let labels = LabelMap::new(reviewers.iter().map(|r| r.id().to_string()));
        let stage2_messages =
            PromptTemplate::stage2_messages(question.content(), &labels, &turn.opinions);
        let Some(deadline) = self.stage_deadline(started, self.settings.stage2_deadline) else {
            return self
                .fail_with_timeout(&conversation_id, &question, turn, &sink)
                .await;
        };
        turn.reviews = run_review_stage(
            &reviewers,
            &stage2_messages,
            &labels,
            params,
            deadline,
            &sink,
            &cancel,
        )
        .await;
        if cancel.is_cancelled() {
            return TurnOutcome::Cancelled;
        }
        turn.ranking = RankingSummary::from_reviews(&turn.reviews);

        // ---- Stage 3: synthesis ----------------------------------------
        if !sink
            .emit(CouncilEvent::stage_update(Stage::FinalResponse))
            .await
        {
            return TurnOutcome::Cancelled;
        }
        let chairman = self.registry.chairman().clone();
        let stage3_messages = PromptTemplate::stage3_messages(
            &conversation.messages,
            question.content(),
            &turn.opinions,
            &turn.reviews,
            &turn.ranking,
        );
        let Some(deadline) = self.stage_deadline(started, self.settings.stage3_deadline) else {
            return self
                .fail_with_timeout(&conversation_id, &question, turn, &sink)
                .await;
        };
        let synthesis =
            run_synthesis_stage(&chairman, stage3_messages, params, deadline, &sink, &cancel)
                .await;
        if cancel.is_cancelled() {
            return TurnOutcome::Cancelled;
        }

        turn.final_text = synthesis.text;
        turn.mark_finished();

        if let Some(error) = synthesis.error {
            warn!(chairman = %chairman.id(), %error, "chairman stream failed");
            sink.emit(CouncilEvent::Error {
                content: FailureReason::ChairmanFailure.as_str().to_string(),
                model_id: Some(chairman.id().to_string()),
            })
            .await;
            let persisted = match self.persist(&conversation_id, &question, &turn).await {
                Ok(()) => true,
                Err(store_error) => {
                    warn!(%store_error, "failed to persist partial turn");
                    false
                }
            };
            return TurnOutcome::Failed {
                reason: FailureReason::ChairmanFailure,
                turn: persisted.then_some(turn),
            };
        }

        match self.persist(&conversation_id, &question, &turn).await {
            Ok(()) => {
                sink.emit(CouncilEvent::Complete).await;
                info!(conversation = %conversation_id, turn = %turn.turn_id, "council turn complete");
                TurnOutcome::Completed(turn)
            }
            Err(error) => {
                warn!(%error, "failed to persist turn");
                sink.emit(CouncilEvent::terminal_error(FailureReason::StoreFailure))
                    .await;
                TurnOutcome::Failed {
                    reason: FailureReason::StoreFailure,
                    turn: None,
                }
            }
        }
    }

    /// Cap a configured stage deadline by the remaining turn budget.
    /// `None` means the turn deadline has already expired.
    fn stage_deadline(&self, started: Instant, configured: Duration) -> Option<Duration> {
        let remaining = self
            .settings
            .turn_deadline
            .checked_sub(started.elapsed())
            .filter(|remaining| !remaining.is_zero())?;
        Some(configured.min(remaining))
    }

    async fn fail_with_timeout(
        &self,
        conversation_id: &str,
        question: &Question,
        mut turn: CouncilTurn,
        sink: &EventSink,
    ) -> TurnOutcome {
        warn!(conversation = %conversation_id, "turn deadline expired");
        sink.emit(CouncilEvent::terminal_error(FailureReason::TurnTimeout))
            .await;
        turn.mark_finished();

        if turn.has_opinions() {
            match self.persist(conversation_id, question, &turn).await {
                Ok(()) => {
                    return TurnOutcome::Failed {
                        reason: FailureReason::TurnTimeout,
                        turn: Some(turn),
                    };
                }
                Err(error) => warn!(%error, "failed to persist partial turn"),
            }
        }
        TurnOutcome::Failed {
            reason: FailureReason::TurnTimeout,
            turn: None,
        }
    }

    /// Persist the turn boundary: user message, turn artifacts, assistant
    /// message, in one append.
    async fn persist(
        &self,
        conversation_id: &str,
        question: &Question,
        turn: &CouncilTurn,
    ) -> Result<(), StoreError> {
        let user = ChatMessage::user(question.content());
        let assistant = ChatMessage::assistant(turn.final_text.clone());
        self.store
            .append_turn(conversation_id, user, turn.clone(), assistant)
            .await
    }
}
