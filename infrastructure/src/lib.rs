//! Infrastructure layer for council
//!
//! Concrete adapters behind the application ports: the OpenRouter model
//! client, in-memory and file-backed conversation stores, configuration
//! loading, and the NDJSON event writer.

pub mod bootstrap;
pub mod config;
pub mod ndjson;
pub mod persistence;
pub mod providers;

// Re-export commonly used types
pub use bootstrap::build_registry;
pub use config::{ConfigError, ConfigLoader, FileConfig};
pub use ndjson::write_events;
pub use persistence::{FileConversationStore, InMemoryConversationStore};
pub use providers::OpenRouterClient;
