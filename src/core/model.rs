//! Models, the model repository and model builders

use crate::config::types::{EngineError, EngineResult};
use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// An opaque model a script can navigate
pub trait Model: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn aliases(&self) -> &[String] {
        &[]
    }

    /// Top-level elements of the model
    fn contents(&self) -> Vec<Value>;

    /// Release the model. Further use is undefined.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;

    fn answers_to(&self, name: &str) -> bool {
        self.name() == name || self.aliases().iter().any(|alias| alias == name)
    }
}

pub type ModelHandle = Arc<dyn Model>;

/// Model settings as a builder collects them
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProperties {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub store_on_disposal: bool,
    #[serde(default)]
    pub read_on_load: bool,
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    #[serde(default)]
    pub use_cache: bool,
}

/// JSON-backed model kept in memory
#[derive(Debug)]
pub struct InMemoryModel {
    properties: ModelProperties,
    elements: RwLock<Vec<serde_json::Value>>,
    disposed: AtomicBool,
}

impl InMemoryModel {
    pub fn new<S: Into<String>>(name: S, elements: Vec<serde_json::Value>) -> Self {
        Self::with_properties(
            ModelProperties {
                name: name.into(),
                ..ModelProperties::default()
            },
            elements,
        )
    }

    pub fn with_properties(properties: ModelProperties, elements: Vec<serde_json::Value>) -> Self {
        Self {
            properties,
            elements: RwLock::new(elements),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn properties(&self) -> &ModelProperties {
        &self.properties
    }

    pub fn push(&self, element: serde_json::Value) {
        if let Ok(mut elements) = self.elements.write() {
            elements.push(element);
        }
    }

    pub fn len(&self) -> usize {
        self.elements.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store(&self, path: &Path) -> EngineResult<()> {
        let elements = self
            .elements
            .read()
            .map_err(|_| EngineError::Model(format!("model {} is poisoned", self.name())))?;
        let text = serde_json::to_string_pretty(&*elements)
            .map_err(|e| EngineError::Model(format!("Failed to serialize model: {}", e)))?;
        std::fs::write(path, text).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Model for InMemoryModel {
    fn name(&self) -> &str {
        &self.properties.name
    }

    fn aliases(&self) -> &[String] {
        &self.properties.aliases
    }

    fn contents(&self) -> Vec<Value> {
        match self.elements.read() {
            Ok(elements) => elements.iter().map(Value::from).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if !self.properties.store_on_disposal {
            return;
        }
        if let Some(path) = &self.properties.model_path {
            if let Err(e) = self.store(path) {
                log::warn!("Failed to store model {} on disposal: {}", self.name(), e);
            }
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// Models registered with an engine context
#[derive(Debug, Default)]
pub struct ModelRepository {
    models: Vec<ModelHandle>,
}

impl ModelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add models, skipping handles already present
    pub fn add_models(&mut self, models: &[ModelHandle]) {
        for model in models {
            if !self.models.iter().any(|m| Arc::ptr_eq(m, model)) {
                self.models.push(Arc::clone(model));
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ModelHandle> {
        let index = self.models.iter().position(|m| m.name() == name)?;
        Some(self.models.remove(index))
    }

    pub fn model(&self, name: &str) -> Option<&ModelHandle> {
        self.models.iter().find(|m| m.answers_to(name))
    }

    pub fn models(&self) -> &[ModelHandle] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Dispose every model, then forget them
    pub fn dispose(&mut self) {
        for model in self.models.drain(..) {
            log::debug!("Disposing model {}", model.name());
            model.dispose();
        }
    }

    /// Forget every model without disposing it
    pub fn clear(&mut self) {
        self.models.clear();
    }
}

/// Builds a model from explicit settings. The name is always required.
pub trait ModelBuilder {
    fn properties_mut(&mut self) -> &mut ModelProperties;

    fn build(self) -> EngineResult<ModelHandle>;

    fn with_name<S: Into<String>>(mut self, name: S) -> Self
    where
        Self: Sized,
    {
        self.properties_mut().name = name.into();
        self
    }

    fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties_mut().aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    fn store_on_disposal(mut self, store: bool) -> Self
    where
        Self: Sized,
    {
        self.properties_mut().store_on_disposal = store;
        self
    }

    fn read_on_load(mut self, read: bool) -> Self
    where
        Self: Sized,
    {
        self.properties_mut().read_on_load = read;
        self
    }

    fn with_model_path<P: Into<PathBuf>>(mut self, path: P) -> Self
    where
        Self: Sized,
    {
        self.properties_mut().model_path = Some(path.into());
        self
    }

    fn use_cache(mut self, cache: bool) -> Self
    where
        Self: Sized,
    {
        self.properties_mut().use_cache = cache;
        self
    }
}

/// Builder for [`InMemoryModel`], reading a JSON array when asked to
#[derive(Debug, Default)]
pub struct InMemoryModelBuilder {
    properties: ModelProperties,
}

impl InMemoryModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_properties(properties: ModelProperties) -> Self {
        Self { properties }
    }
}

impl ModelBuilder for InMemoryModelBuilder {
    fn properties_mut(&mut self) -> &mut ModelProperties {
        &mut self.properties
    }

    fn build(self) -> EngineResult<ModelHandle> {
        let properties = self.properties;
        if properties.name.trim().is_empty() {
            return Err(EngineError::Model(
                "model builder requires a name".to_string(),
            ));
        }

        let elements = match (&properties.model_path, properties.read_on_load) {
            (Some(path), true) => {
                let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str::<Vec<serde_json::Value>>(&text).map_err(|e| {
                    EngineError::Model(format!(
                        "Failed to parse model JSON {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
            (None, true) => {
                return Err(EngineError::Model(format!(
                    "model {} is read on load but has no path",
                    properties.name
                )));
            }
            _ => Vec::new(),
        };

        Ok(Arc::new(InMemoryModel::with_properties(properties, elements)))
    }
}

type BuilderFactory = Box<dyn Fn(ModelProperties) -> EngineResult<ModelHandle> + Send + Sync>;

/// Explicit table from builder kind to factory
#[derive(Default)]
pub struct ModelBuilderRegistry {
    factories: HashMap<String, BuilderFactory>,
}

impl ModelBuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the in-memory builder under "json"
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("json", |properties| {
            InMemoryModelBuilder::from_properties(properties).build()
        });
        registry
    }

    pub fn register<S, F>(&mut self, kind: S, factory: F)
    where
        S: Into<String>,
        F: Fn(ModelProperties) -> EngineResult<ModelHandle> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn build(&self, kind: &str, properties: ModelProperties) -> EngineResult<ModelHandle> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| EngineError::Model(format!("no model builder registered for {kind}")))?;
        factory(properties)
    }
}

impl fmt::Debug for ModelBuilderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBuilderRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
