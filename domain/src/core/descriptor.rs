//! Model descriptor value object

use serde::{Deserialize, Serialize};

/// A model known to the council (Value Object).
///
/// Descriptors are built from static configuration at process start and
/// never mutated afterwards. Exactly one descriptor in a registry carries
/// `is_chairman = true`; that model also remains eligible as a regular
/// councilor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Stable identifier, forwarded verbatim to the provider
    /// (e.g. `"anthropic/claude-sonnet-4.5"`).
    pub id: String,
    /// Human-readable name for display surfaces.
    pub display_name: String,
    /// Provider routing tag (e.g. `"openrouter"`).
    pub provider_tag: String,
    /// Whether this model performs stage-3 synthesis.
    pub is_chairman: bool,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        provider_tag: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            provider_tag: provider_tag.into(),
            is_chairman: false,
        }
    }

    /// Mark this descriptor as the chairman.
    pub fn as_chairman(mut self) -> Self {
        self.is_chairman = true;
        self
    }
}

impl std::fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
