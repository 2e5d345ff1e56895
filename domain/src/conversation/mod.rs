//! Conversation domain
//!
//! Persisted conversation state: messages exchanged with the caller and the
//! council turns that produced them.

pub mod entities;

pub use entities::{ChatMessage, Conversation, Message, Role};
