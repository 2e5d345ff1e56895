//! Conversation entities

use crate::council::turn::CouncilTurn;
use crate::util::now_ms;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message on the model wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A transient message sent to a model. Built by prompt templates, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A persisted conversation message (Entity).
///
/// Only user and assistant messages are ever stored; system directives are
/// rebuilt from templates on every turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: now_ms(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: now_ms(),
        }
    }
}

/// A conversation: ordered messages plus the council turns that produced
/// them (Entity). Append-only after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub turns: Vec<CouncilTurn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            messages: Vec::new(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append one completed turn with its user and assistant messages,
    /// keeping `messages.len() == 2 * turns.len()`.
    pub fn record_turn(&mut self, user: ChatMessage, turn: CouncilTurn, assistant: ChatMessage) {
        self.messages.push(user);
        self.messages.push(assistant);
        self.turns.push(turn);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ctors() {
        assert_eq!(Message::system("s").role, Role::System);
        assert_eq!(Message::user("u").role, Role::User);
        assert_eq!(Message::assistant("a").role, Role::Assistant);
    }

    #[test]
    fn test_chat_message_is_stamped() {
        let m = ChatMessage::user("hello");
        assert!(m.timestamp > 0);
    }

    #[test]
    fn test_record_turn_keeps_message_turn_ratio() {
        let mut conv = Conversation::new("c1");
        let turn = CouncilTurn::new("t1", "hello");
        conv.record_turn(
            ChatMessage::user("hello"),
            turn,
            ChatMessage::assistant("hi"),
        );

        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.turns.len(), 1);
        assert_eq!(conv.messages[0].role, Role::User);
        assert_eq!(conv.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, r#""assistant""#);
    }
}
