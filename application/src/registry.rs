//! Model registry
//!
//! Maps every known model to its descriptor and provider client, and
//! designates the chairman. Built once at startup from static
//! configuration; immutable for the lifetime of the process.

use crate::ports::model_client::ModelClient;
use council_domain::ModelDescriptor;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur while building a registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("No models registered")]
    Empty,

    #[error("Duplicate model id: {0}")]
    DuplicateModel(String),

    #[error("Chairman model not registered: {0}")]
    UnknownChairman(String),

    #[error("No chairman designated")]
    NoChairman,
}

/// A registered model: its descriptor plus the client that reaches it.
#[derive(Clone)]
pub struct RegisteredModel {
    pub descriptor: ModelDescriptor,
    pub client: Arc<dyn ModelClient>,
}

impl RegisteredModel {
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }
}

impl std::fmt::Debug for RegisteredModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredModel")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Registry of all models available to the council.
pub struct ModelRegistry {
    models: Vec<RegisteredModel>,
    index: HashMap<String, usize>,
    chairman: usize,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// All registered models, in registration order.
    pub fn list_all(&self) -> &[RegisteredModel] {
        &self.models
    }

    /// Resolve a caller-provided id selection.
    ///
    /// `None` (or an empty list) resolves to all models. Known ids come
    /// back in the order requested with repeats collapsed to the first
    /// occurrence; unknown ids are collected for the caller to report as
    /// soft warnings, never a failure.
    pub fn resolve(&self, ids: Option<&[String]>) -> (Vec<RegisteredModel>, Vec<String>) {
        let Some(ids) = ids.filter(|ids| !ids.is_empty()) else {
            return (self.models.clone(), Vec::new());
        };

        let mut resolved: Vec<RegisteredModel> = Vec::with_capacity(ids.len());
        let mut unknown: Vec<String> = Vec::new();
        for id in ids {
            match self.index.get(id) {
                Some(&position) => {
                    if !resolved.iter().any(|m| m.id() == id) {
                        resolved.push(self.models[position].clone());
                    }
                }
                None => {
                    warn!(model = %id, "requested model is not registered");
                    unknown.push(id.clone());
                }
            }
        }
        (resolved, unknown)
    }

    /// The designated synthesis model. Always present.
    pub fn chairman(&self) -> &RegisteredModel {
        &self.models[self.chairman]
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredModel> {
        self.index.get(id).map(|&position| &self.models[position])
    }
}

/// Builder validating the one-chairman invariant.
#[derive(Default)]
pub struct ModelRegistryBuilder {
    models: Vec<RegisteredModel>,
    chairman_id: Option<String>,
}

impl ModelRegistryBuilder {
    pub fn register(mut self, descriptor: ModelDescriptor, client: Arc<dyn ModelClient>) -> Self {
        self.models.push(RegisteredModel { descriptor, client });
        self
    }

    pub fn chairman(mut self, id: impl Into<String>) -> Self {
        self.chairman_id = Some(id.into());
        self
    }

    pub fn build(mut self) -> Result<ModelRegistry, RegistryError> {
        if self.models.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut index = HashMap::with_capacity(self.models.len());
        for (position, model) in self.models.iter().enumerate() {
            if index.insert(model.id().to_string(), position).is_some() {
                return Err(RegistryError::DuplicateModel(model.id().to_string()));
            }
        }

        let chairman_id = self.chairman_id.ok_or(RegistryError::NoChairman)?;
        let chairman = *index
            .get(&chairman_id)
            .ok_or(RegistryError::UnknownChairman(chairman_id))?;

        // Exactly one descriptor carries the flag.
        for (position, model) in self.models.iter_mut().enumerate() {
            model.descriptor.is_chairman = position == chairman;
        }

        Ok(ModelRegistry {
            models: self.models,
            index,
            chairman,
        })
    }
}
