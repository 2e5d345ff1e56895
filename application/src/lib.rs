//! Application layer for council
//!
//! Use cases and ports. The orchestrator lives here; concrete model
//! clients and stores are injected from the infrastructure layer.

pub mod config;
pub mod multiplexer;
pub mod ports;
pub mod registry;
pub mod use_cases;

// Re-export commonly used types
pub use config::{CouncilSettings, SettingsError};
pub use multiplexer::{EventSink, EventStream};
pub use ports::conversation_store::{ConversationStore, StoreError};
pub use ports::model_client::{ChunkStream, CompletionRequest, ModelClient, ModelClientError};
pub use registry::{ModelRegistry, ModelRegistryBuilder, RegisteredModel, RegistryError};
pub use use_cases::run_council::{
    CouncilRun, RunCouncilError, RunCouncilInput, RunCouncilUseCase, TurnOutcome,
};
