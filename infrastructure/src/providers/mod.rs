//! Provider adapters
//!
//! One `ModelClient` implementation per upstream provider. The registry
//! maps every descriptor to one of these at startup.

mod openrouter;

pub use openrouter::OpenRouterClient;
