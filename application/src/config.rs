//! Typed runtime settings for the orchestrator
//!
//! Raw configuration parsing lives in the infrastructure layer; use cases
//! receive only this validated form.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Settings validation errors
#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("temperature must be within 0.0..=1.0, got {0}")]
    Temperature(f64),

    #[error("max_tokens must be positive")]
    MaxTokens,

    #[error("output_buffer_size must be positive")]
    OutputBufferSize,

    #[error("chairman_model_id must not be empty")]
    MissingChairman,

    #[error("{0} must be positive")]
    ZeroTimeout(&'static str),
}

/// Runtime settings threaded into every turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilSettings {
    /// The stage-3 synthesis model. Always reachable, even when absent
    /// from a request's `selected_models`.
    pub chairman_model_id: String,
    /// Councilors used when the request does not select models.
    pub default_models: Vec<String>,
    /// Sampling temperature forwarded to every model call.
    pub temperature: f64,
    pub max_tokens: u32,
    pub per_call_timeout: Duration,
    pub stage1_deadline: Duration,
    pub stage2_deadline: Duration,
    pub stage3_deadline: Duration,
    pub turn_deadline: Duration,
    /// Bound of the output event buffer; producers suspend when full.
    pub output_buffer_size: usize,
}

impl Default for CouncilSettings {
    fn default() -> Self {
        Self {
            chairman_model_id: String::new(),
            default_models: Vec::new(),
            temperature: 0.7,
            max_tokens: 4000,
            per_call_timeout: Duration::from_secs(120),
            stage1_deadline: Duration::from_secs(180),
            stage2_deadline: Duration::from_secs(120),
            stage3_deadline: Duration::from_secs(180),
            turn_deadline: Duration::from_secs(600),
            output_buffer_size: 128,
        }
    }
}

impl CouncilSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(SettingsError::Temperature(self.temperature));
        }
        if self.max_tokens == 0 {
            return Err(SettingsError::MaxTokens);
        }
        if self.output_buffer_size == 0 {
            return Err(SettingsError::OutputBufferSize);
        }
        if self.chairman_model_id.trim().is_empty() {
            return Err(SettingsError::MissingChairman);
        }
        for (name, value) in [
            ("per_call_timeout", self.per_call_timeout),
            ("stage1_deadline", self.stage1_deadline),
            ("stage2_deadline", self.stage2_deadline),
            ("stage3_deadline", self.stage3_deadline),
            ("turn_deadline", self.turn_deadline),
        ] {
            if value.is_zero() {
                return Err(SettingsError::ZeroTimeout(name));
            }
        }
        Ok(())
    }
}
