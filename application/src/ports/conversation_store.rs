//! Conversation store port
//!
//! Append-only persistence capability for conversations. The storage
//! format is an adapter concern; the application sees only this trait.

use async_trait::async_trait;
use council_domain::{ChatMessage, Conversation, CouncilTurn};
use thiserror::Error;

/// Errors surfaced by store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Io(String),

    #[error("Corrupt conversation record: {0}")]
    Corrupt(String),
}

/// Persistence capability keyed by conversation id.
///
/// `append_turn` is the critical section: implementations must serialize
/// concurrent appends to the same conversation (a per-conversation lock or
/// a single writer both satisfy this).
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Load an existing conversation.
    async fn load(&self, id: &str) -> Result<Conversation, StoreError>;

    /// Create a new conversation with a freshly minted id.
    async fn create(&self) -> Result<Conversation, StoreError>;

    /// Atomically append one completed turn together with its user and
    /// assistant messages.
    async fn append_turn(
        &self,
        id: &str,
        user: ChatMessage,
        turn: CouncilTurn,
        assistant: ChatMessage,
    ) -> Result<(), StoreError>;

    /// Delete a conversation.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// All conversations, most recently updated first.
    async fn list(&self) -> Result<Vec<Conversation>, StoreError>;
}
