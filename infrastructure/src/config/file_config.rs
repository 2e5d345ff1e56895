//! Raw TOML configuration data types
//!
//! These structs mirror the exact structure of `council.toml`. They are
//! deserialized directly and validated into [`CouncilSettings`] before the
//! application sees them.

use super::ConfigError;
use council_application::CouncilSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Council membership
    pub models: FileModelsConfig,
    /// Upstream endpoint settings
    pub provider: FileProviderConfig,
    /// Sampling limits
    pub limits: FileLimitsConfig,
    /// Per-call and per-stage timeouts
    pub timeouts: FileTimeoutsConfig,
    /// Output stream settings
    pub stream: FileStreamConfig,
    /// Conversation store settings
    pub store: FileStoreConfig,
}

impl FileConfig {
    /// Validate and convert into typed application settings.
    pub fn settings(&self) -> Result<CouncilSettings, ConfigError> {
        let settings = CouncilSettings {
            chairman_model_id: self.models.chairman.clone(),
            default_models: self.models.councilors.iter().map(|m| m.id.clone()).collect(),
            temperature: self.limits.temperature,
            max_tokens: self.limits.max_tokens,
            per_call_timeout: Duration::from_millis(self.timeouts.per_call_ms),
            stage1_deadline: Duration::from_millis(self.timeouts.stage1_deadline_ms),
            stage2_deadline: Duration::from_millis(self.timeouts.stage2_deadline_ms),
            stage3_deadline: Duration::from_millis(self.timeouts.stage3_deadline_ms),
            turn_deadline: Duration::from_millis(self.timeouts.turn_deadline_ms),
            output_buffer_size: self.stream.output_buffer_size,
        };
        settings
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.models.councilors.iter().any(|m| m.id.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "models.councilors entries must carry an id".to_string(),
            ));
        }
        Ok(settings)
    }

    /// Directory for the file-backed conversation store.
    pub fn store_dir(&self) -> PathBuf {
        self.store.dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("council")
                .join("conversations")
        })
    }
}

/// `[models]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// The synthesis model. Registered even when absent from `councilors`.
    pub chairman: String,
    /// Default councilors, used when a request selects no models.
    pub councilors: Vec<FileModelEntry>,
}

impl Default for FileModelsConfig {
    fn default() -> Self {
        Self {
            chairman: "google/gemini-3-pro".to_string(),
            councilors: vec![
                FileModelEntry::new("openai/gpt-5.1", "GPT-5.1"),
                FileModelEntry::new("anthropic/claude-sonnet-4.5", "Claude Sonnet 4.5"),
                FileModelEntry::new("google/gemini-3-pro", "Gemini 3 Pro"),
                FileModelEntry::new("x-ai/grok-4", "Grok 4"),
            ],
        }
    }
}

/// One councilor entry in `[models]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileModelEntry {
    pub id: String,
    /// Falls back to the id when empty.
    #[serde(default)]
    pub display_name: String,
}

impl FileModelEntry {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.id
        } else {
            &self.display_name
        }
    }
}

/// `[provider]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub base_url: String,
    /// Environment variable holding the API key; never the key itself.
    pub api_key_env: String,
    /// Optional `HTTP-Referer` attribution header.
    pub referer: Option<String>,
    /// Optional `X-Title` attribution header.
    pub title: Option<String>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            referer: None,
            title: None,
        }
    }
}

/// `[limits]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLimitsConfig {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for FileLimitsConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4000,
        }
    }
}

/// `[timeouts]` section, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTimeoutsConfig {
    pub per_call_ms: u64,
    pub stage1_deadline_ms: u64,
    pub stage2_deadline_ms: u64,
    pub stage3_deadline_ms: u64,
    pub turn_deadline_ms: u64,
}

impl Default for FileTimeoutsConfig {
    fn default() -> Self {
        Self {
            per_call_ms: 120_000,
            stage1_deadline_ms: 180_000,
            stage2_deadline_ms: 120_000,
            stage3_deadline_ms: 180_000,
            turn_deadline_ms: 600_000,
        }
    }
}

/// `[stream]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStreamConfig {
    pub output_buffer_size: usize,
}

impl Default for FileStreamConfig {
    fn default() -> Self {
        Self {
            output_buffer_size: 128,
        }
    }
}

/// `[store]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Conversation directory; platform data dir when unset.
    pub dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_convert_to_valid_settings() {
        let config = FileConfig::default();
        let settings = config.settings().unwrap();
        assert_eq!(settings.chairman_model_id, "google/gemini-3-pro");
        assert_eq!(settings.default_models.len(), 4);
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.per_call_timeout, Duration::from_secs(120));
        assert_eq!(settings.turn_deadline, Duration::from_secs(600));
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[models]
chairman = "anthropic/claude-sonnet-4.5"
councilors = [
    { id = "openai/gpt-5.1", display_name = "GPT-5.1" },
    { id = "anthropic/claude-sonnet-4.5" },
]

[provider]
base_url = "http://localhost:8080/v1"
api_key_env = "LOCAL_KEY"
title = "council"

[limits]
temperature = 0.2
max_tokens = 800

[timeouts]
per_call_ms = 30000
turn_deadline_ms = 90000

[stream]
output_buffer_size = 16
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.models.chairman, "anthropic/claude-sonnet-4.5");
        assert_eq!(config.models.councilors.len(), 2);
        assert_eq!(config.models.councilors[1].display_name(), "anthropic/claude-sonnet-4.5");
        assert_eq!(config.provider.api_key_env, "LOCAL_KEY");
        assert_eq!(config.provider.title.as_deref(), Some("council"));
        assert_eq!(config.limits.temperature, 0.2);

        let settings = config.settings().unwrap();
        assert_eq!(settings.per_call_timeout, Duration::from_secs(30));
        // Unspecified timeouts keep their defaults.
        assert_eq!(settings.stage2_deadline, Duration::from_secs(120));
        assert_eq!(settings.output_buffer_size, 16);
    }

    #[test]
    fn test_invalid_temperature_is_rejected() {
        let mut config = FileConfig::default();
        config.limits.temperature = 3.0;
        assert!(matches!(config.settings(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_councilor_id_is_rejected() {
        let mut config = FileConfig::default();
        config.models.councilors.push(FileModelEntry::new("", ""));
        assert!(matches!(config.settings(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_store_dir_override() {
        let mut config = FileConfig::default();
        config.store.dir = Some(PathBuf::from("/tmp/council-test"));
        assert_eq!(config.store_dir(), PathBuf::from("/tmp/council-test"));
    }
}
