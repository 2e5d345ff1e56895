//! Wiring helpers
//!
//! Turn file configuration into live collaborators for dependency
//! injection at the binary edge.

use crate::config::{ConfigError, FileConfig};
use crate::providers::OpenRouterClient;
use council_application::{CouncilSettings, ModelClient, ModelRegistry};
use council_domain::ModelDescriptor;
use std::collections::HashSet;
use std::sync::Arc;

/// Read the provider API key from the configured environment variable.
pub fn resolve_api_key(config: &FileConfig) -> Result<String, ConfigError> {
    std::env::var(&config.provider.api_key_env)
        .map_err(|_| ConfigError::MissingApiKey(config.provider.api_key_env.clone()))
}

/// Build the model registry: one shared provider client, one descriptor
/// per configured councilor, and the chairman registered even when it is
/// not listed as a councilor.
pub fn build_registry(
    config: &FileConfig,
    settings: &CouncilSettings,
    api_key: String,
) -> Result<ModelRegistry, ConfigError> {
    let mut client = OpenRouterClient::new(
        &config.provider.base_url,
        api_key,
        settings.per_call_timeout,
    )
    .map_err(|e| ConfigError::Provider(e.to_string()))?;
    if let Some(referer) = &config.provider.referer {
        client = client.with_header("HTTP-Referer", referer);
    }
    if let Some(title) = &config.provider.title {
        client = client.with_header("X-Title", title);
    }
    let client: Arc<dyn ModelClient> = Arc::new(client);

    let mut builder = ModelRegistry::builder();
    let mut seen: HashSet<&str> = HashSet::new();
    for entry in &config.models.councilors {
        if !seen.insert(entry.id.as_str()) {
            continue;
        }
        builder = builder.register(
            ModelDescriptor::new(&entry.id, entry.display_name(), "openrouter"),
            Arc::clone(&client),
        );
    }
    if !seen.contains(config.models.chairman.as_str()) {
        builder = builder.register(
            ModelDescriptor::new(&config.models.chairman, &config.models.chairman, "openrouter"),
            Arc::clone(&client),
        );
    }

    Ok(builder.chairman(&config.models.chairman).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file_config::{FileModelEntry, FileModelsConfig};

    fn settings(config: &FileConfig) -> CouncilSettings {
        config.settings().unwrap()
    }

    #[test]
    fn test_registry_from_default_config() {
        let config = FileConfig::default();
        let registry = build_registry(&config, &settings(&config), "test-key".to_string()).unwrap();

        assert_eq!(registry.list_all().len(), 4);
        assert_eq!(registry.chairman().id(), "google/gemini-3-pro");
    }

    #[test]
    fn test_chairman_outside_councilors_is_registered() {
        let mut config = FileConfig::default();
        config.models = FileModelsConfig {
            chairman: "anthropic/claude-opus-4.5".to_string(),
            councilors: vec![
                FileModelEntry::new("openai/gpt-5.1", "GPT-5.1"),
                FileModelEntry::new("x-ai/grok-4", "Grok 4"),
            ],
        };
        let registry = build_registry(&config, &settings(&config), "test-key".to_string()).unwrap();

        assert_eq!(registry.list_all().len(), 3);
        assert_eq!(registry.chairman().id(), "anthropic/claude-opus-4.5");
        assert!(registry.get("anthropic/claude-opus-4.5").is_some());
    }

    #[test]
    fn test_duplicate_councilors_collapse() {
        let mut config = FileConfig::default();
        config.models.councilors.push(FileModelEntry::new("openai/gpt-5.1", "again"));
        let registry = build_registry(&config, &settings(&config), "test-key".to_string()).unwrap();
        assert_eq!(registry.list_all().len(), 4);
    }
}
