//! In-memory conversation store
//!
//! Default store for ephemeral runs; conversations die with the process.

use async_trait::async_trait;
use council_application::ports::conversation_store::{ConversationStore, StoreError};
use council_domain::{ChatMessage, Conversation, CouncilTurn};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Hash-map store guarded by one async mutex. The mutex also serializes
/// `append_turn`, satisfying the per-conversation atomicity contract.
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: Mutex<HashMap<String, Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, id: &str) -> Result<Conversation, StoreError> {
        self.conversations
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create(&self) -> Result<Conversation, StoreError> {
        let conversation = Conversation::new(Uuid::new_v4().to_string());
        self.conversations
            .lock()
            .await
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
        let mut conversations = self.conversations.lock().await;
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        conversation.record_turn(user, turn, assistant);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.conversations
            .lock()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Conversation>, StoreError> {
        let mut all: Vec<Conversation> =
            self.conversations.lock().await.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }
}
