//! Element Options
//!
//! Style options are resolved per element from dataset-level values. Option
//! names an element understands (`borderColor`) are mapped to dataset keys
//! (`lineBorderColor`) by an [`ElementConfig`]; an [`OptionsResolver`] turns
//! that mapping into concrete [`ResolvedOptions`].
//!
//! # Sharing
//!
//! When every element of a batch would resolve to the same options, the
//! resolver marks the result shared and the batch reuses one instance
//! instead of resolving per element. [`ElementConfig`] caches shared results
//! per update mode for the duration of a batch.
//!
//! # Scoped configuration
//!
//! The controller keeps one *active* element configuration, normally the
//! node one. Updating edges swaps the edge configuration in for the length
//! of the batch with [`ScopedElementConfig`], which swaps back when dropped.
//! The guard holds both configurations mutably, so nothing else can see the
//! swapped state while it is alive.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::{ElementKind, UpdateMode};

/// Options whose values are arrays by nature and never indexed per element.
const ARRAY_VALUED: &[&str] = &["borderDash"];

/// Options resolved for one element (or one shared batch).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedOptions {
    values: IndexMap<String, Value>,
    shared: bool,
}

impl ResolvedOptions {
    pub fn new(values: IndexMap<String, Value>, shared: bool) -> Self {
        Self { values, shared }
    }

    /// Whether every element of the batch can use this same instance.
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn f64_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).and_then(Value::as_f64).unwrap_or(default)
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}

/// Resolves element options.
pub trait OptionsResolver {
    /// Options for element `index` under `config` in `mode`.
    fn resolve(&self, config: &ElementConfig, index: usize, mode: UpdateMode) -> ResolvedOptions;
}

/// Resolves options from the dataset's flat style values.
///
/// An option is looked up under its mapped dataset key, then under its own
/// name. Array values are indexable: element `i` takes entry `i` (wrapping),
/// and the result is no longer shared.
#[derive(Debug, Clone, Default)]
pub struct DatasetOptions {
    values: IndexMap<String, Value>,
}

impl DatasetOptions {
    pub fn new(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }
}

impl OptionsResolver for DatasetOptions {
    fn resolve(&self, config: &ElementConfig, index: usize, _mode: UpdateMode) -> ResolvedOptions {
        let mut shared = true;
        let mut resolved = IndexMap::with_capacity(config.option_keys().len());
        for (name, key) in config.option_keys() {
            let Some(value) = self.values.get(key).or_else(|| self.values.get(name)) else {
                continue;
            };
            let value = match value {
                Value::Array(entries) if !ARRAY_VALUED.contains(&name.as_str()) => {
                    shared = false;
                    if entries.is_empty() {
                        continue;
                    }
                    entries[index % entries.len()].clone()
                }
                other => other.clone(),
            };
            resolved.insert(name.clone(), value);
        }
        ResolvedOptions::new(resolved, shared)
    }
}

/// Per-kind element configuration: the element type name, the option-name
/// to dataset-key mapping, and the batch caches.
#[derive(Debug, Clone)]
pub struct ElementConfig {
    kind: ElementKind,
    element_type: String,
    option_keys: IndexMap<String, String>,
    cache: IndexMap<UpdateMode, Arc<ResolvedOptions>>,
    shared: Option<Arc<ResolvedOptions>>,
}

impl ElementConfig {
    pub fn new(kind: ElementKind, element_type: impl Into<String>, option_keys: IndexMap<String, String>) -> Self {
        Self {
            kind,
            element_type: element_type.into(),
            option_keys,
            cache: IndexMap::new(),
            shared: None,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    pub fn option_keys(&self) -> &IndexMap<String, String> {
        &self.option_keys
    }

    /// Resolve options for element `index`, reusing the cached shared
    /// result for `mode` if there is one.
    pub fn resolve(&mut self, resolver: &dyn OptionsResolver, index: usize, mode: UpdateMode) -> Arc<ResolvedOptions> {
        if let Some(cached) = self.cache.get(&mode) {
            return Arc::clone(cached);
        }
        let resolved = Arc::new(resolver.resolve(self, index, mode));
        if resolved.is_shared() {
            self.cache.insert(mode, Arc::clone(&resolved));
        }
        resolved
    }

    /// The batch-wide options instance, if `first` says the batch can share.
    pub fn shared_options(&mut self, first: &Arc<ResolvedOptions>) -> Option<Arc<ResolvedOptions>> {
        if !first.is_shared() {
            return None;
        }
        Some(Arc::clone(self.shared.get_or_insert_with(|| Arc::clone(first))))
    }

    /// Forget cached results; called when a new batch starts.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.shared = None;
    }
}

/// Whether each element of a batch must get its own resolved options.
pub fn include_options(mode: UpdateMode, shared: Option<&Arc<ResolvedOptions>>) -> bool {
    shared.is_none() || mode.is_direct()
}

/// Options state of one update batch.
///
/// The first element's options decide whether the batch shares one
/// instance. Direct modes still resolve per element.
#[derive(Debug, Clone)]
pub struct OptionsBatch {
    mode: UpdateMode,
    shared: Option<Arc<ResolvedOptions>>,
}

impl OptionsBatch {
    pub fn begin(config: &mut ElementConfig, resolver: &dyn OptionsResolver, start: usize, mode: UpdateMode) -> Self {
        let first = config.resolve(resolver, start, mode);
        let shared = config.shared_options(&first);
        Self { mode, shared }
    }

    pub fn is_shared(&self) -> bool {
        self.shared.is_some()
    }

    /// Options for element `index` of the batch.
    pub fn options_for(
        &self,
        config: &mut ElementConfig,
        resolver: &dyn OptionsResolver,
        index: usize,
    ) -> Arc<ResolvedOptions> {
        match &self.shared {
            Some(shared) if !include_options(self.mode, Some(shared)) => Arc::clone(shared),
            _ => config.resolve(resolver, index, self.mode),
        }
    }
}

/// Guard that makes `replacement` the active configuration until dropped.
pub struct ScopedElementConfig<'a> {
    active: &'a mut ElementConfig,
    parked: &'a mut ElementConfig,
}

impl<'a> ScopedElementConfig<'a> {
    /// Swap `replacement` into `active` and start a fresh batch on it.
    pub fn enter(active: &'a mut ElementConfig, replacement: &'a mut ElementConfig) -> Self {
        std::mem::swap(active, replacement);
        active.clear_cache();
        Self {
            active,
            parked: replacement,
        }
    }
}

impl Deref for ScopedElementConfig<'_> {
    type Target = ElementConfig;

    fn deref(&self) -> &ElementConfig {
        self.active
    }
}

impl DerefMut for ScopedElementConfig<'_> {
    fn deref_mut(&mut self) -> &mut ElementConfig {
        self.active
    }
}

impl Drop for ScopedElementConfig<'_> {
    fn drop(&mut self) {
        std::mem::swap(&mut *self.active, &mut *self.parked);
    }
}
