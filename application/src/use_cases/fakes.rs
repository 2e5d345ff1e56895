//! In-memory fakes for the ports, shared by the use-case tests.

use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::model_client::{ChunkStream, CompletionRequest, ModelClient, ModelClientError};
use crate::registry::RegisteredModel;
use async_trait::async_trait;
use council_domain::{ChatMessage, Conversation, CouncilTurn, ModelDescriptor};
use futures::StreamExt as _;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Scripted behavior for one `stream()` call. Scripts are consumed in
/// order, so a chairman can stream different content in stages 1 and 3.
#[derive(Clone)]
pub(crate) enum StreamScript {
    /// Yield the chunks, then end normally.
    Chunks(Vec<String>),
    /// Yield the chunks, then stall until cancelled or timed out.
    ChunksThenStall(Vec<String>),
    /// Fail to open the stream.
    Fail,
}

impl StreamScript {
    pub fn chunks(chunks: &[&str]) -> Self {
        StreamScript::Chunks(chunks.iter().map(|c| c.to_string()).collect())
    }

    pub fn chunks_then_stall(chunks: &[&str]) -> Self {
        StreamScript::ChunksThenStall(chunks.iter().map(|c| c.to_string()).collect())
    }

    pub fn fail() -> Self {
        StreamScript::Fail
    }
}

/// Scriptable [`ModelClient`].
#[derive(Default)]
pub(crate) struct FakeClient {
    streams: Mutex<VecDeque<StreamScript>>,
    review: Mutex<Option<Result<String, ModelClientError>>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a script for the next `stream()` call.
    pub fn stream(self, script: StreamScript) -> Self {
        self.streams.lock().unwrap().push_back(script);
        self
    }

    /// Fix the reply returned by `complete()`.
    pub fn review(self, reply: &str) -> Self {
        *self.review.lock().unwrap() = Some(Ok(reply.to_string()));
        self
    }

    /// Make `complete()` fail.
    pub fn failing_review(self) -> Self {
        *self.review.lock().unwrap() =
            Some(Err(ModelClientError::Provider("scripted review failure".to_string())));
        self
    }
}

#[async_trait]
impl ModelClient for FakeClient {
    async fn complete(
        &self,
        _request: CompletionRequest,
        _cancel: CancellationToken,
    ) -> Result<String, ModelClientError> {
        match self.review.lock().unwrap().clone() {
            Some(result) => result,
            None => Ok(String::new()),
        }
    }

    async fn stream(
        &self,
        _request: CompletionRequest,
        _cancel: CancellationToken,
    ) -> Result<ChunkStream, ModelClientError> {
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StreamScript::Chunks(Vec::new()));

        match script {
            StreamScript::Chunks(chunks) => {
                Ok(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))))
            }
            StreamScript::ChunksThenStall(chunks) => Ok(Box::pin(
                futures::stream::iter(chunks.into_iter().map(Ok))
                    .chain(futures::stream::pending()),
            )),
            StreamScript::Fail => Err(ModelClientError::Provider(
                "scripted stream failure".to_string(),
            )),
        }
    }
}

/// Wrap a fake client as a registered model.
pub(crate) fn registered(id: &str, client: FakeClient) -> RegisteredModel {
    RegisteredModel {
        descriptor: ModelDescriptor::new(id, id.to_uppercase(), "fake"),
        client: Arc::new(client),
    }
}

/// Hash-map conversation store with sequential ids.
#[derive(Default)]
pub(crate) struct MemoryStore {
    conversations: Mutex<HashMap<String, Conversation>>,
    next_id: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct snapshot for assertions.
    pub fn snapshot(&self, id: &str) -> Option<Conversation> {
        self.conversations.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.conversations.lock().unwrap().len()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn load(&self, id: &str) -> Result<Conversation, StoreError> {
        self.conversations
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create(&self) -> Result<Conversation, StoreError> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let conversation = Conversation::new(format!("conv-{}", *next_id));
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id.clone(), conversation.clone());
        Ok(conversation)
    }

    async fn append_turn(
        &self,
        id: &str,
        user: ChatMessage,
        turn: CouncilTurn,
        assistant: ChatMessage,
    ) -> Result<(), StoreError> {
        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        conversation.record_turn(user, turn, assistant);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.conversations
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Conversation>, StoreError> {
        let mut all: Vec<Conversation> =
            self.conversations.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }
}
