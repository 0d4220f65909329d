//! Function registry: the callables the planner may use.

use std::fmt;

use docplan_backend::GenerationBackend;
use docplan_core::{FunctionSpec, SymbolPath};
use docplan_symbols::signature_from_source;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::docs::DocGenerator;
use crate::error::RegistrationError;

/// Everything the registry needs to know about one callable.
///
/// Stands in for runtime reflection: callers describe the callable instead of
/// handing over a live object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallableDescriptor {
    pub name: String,
    pub signature: String,
    /// Declared documentation, if any.
    #[serde(default)]
    pub docs: Option<String>,
    /// Source text, used to synthesize docs with the model.
    #[serde(default)]
    pub source: Option<String>,
}

impl CallableDescriptor {
    pub fn new(name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            docs: None,
            source: None,
        }
    }

    pub fn with_docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Build a descriptor from extractor output. The name is the path's last
    /// segment; the signature is read from the source header and left empty
    /// when no header is found.
    pub fn from_symbol(path: &SymbolPath, source: &str) -> Self {
        Self {
            name: path.leaf().to_string(),
            signature: signature_from_source(source).unwrap_or_default(),
            docs: None,
            source: Some(source.to_string()),
        }
    }
}

/// Ordered, duplicate-free set of [`FunctionSpec`]s.
///
/// Insertion order is the order functions appear in the planner prompt.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct FunctionRegistry {
    functions: Vec<FunctionSpec>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function unless a structurally equal entry exists.
    /// Returns whether the entry was inserted.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        signature: impl Into<String>,
        docs: Option<String>,
    ) -> Result<bool, RegistrationError> {
        let spec = FunctionSpec::new(name, signature, docs);
        if spec.name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if spec.signature.trim().is_empty() {
            return Err(RegistrationError::EmptySignature { name: spec.name });
        }
        Ok(self.insert(spec))
    }

    /// Register many callables, skipping the ones that fail.
    ///
    /// With a doc generator, docs are synthesized from each callable's source;
    /// when that fails (or there is no source) the declared docs are kept.
    /// Returns the number of new entries.
    pub fn register_many<B, I>(&mut self, descriptors: I, doc_source: Option<&DocGenerator<B>>) -> usize
    where
        B: GenerationBackend,
        I: IntoIterator<Item = CallableDescriptor>,
    {
        let mut added = 0;
        for descriptor in descriptors {
            let docs = match (doc_source, descriptor.source.as_deref()) {
                (Some(generator), Some(source)) => match generator.document_function(source) {
                    Ok(docs) => Some(docs),
                    Err(err) => {
                        warn!(name = %descriptor.name, error = %err, "unable to generate docs using model, keeping declared docs");
                        descriptor.docs.clone()
                    }
                },
                (Some(_), None) => {
                    warn!(name = %descriptor.name, "no source to document, keeping declared docs");
                    descriptor.docs.clone()
                }
                (None, _) => descriptor.docs.clone(),
            };

            match self.register(descriptor.name.as_str(), descriptor.signature.as_str(), docs) {
                Ok(true) => added += 1,
                Ok(false) => debug!(name = %descriptor.name, "function_already_registered"),
                Err(err) => warn!(name = %descriptor.name, error = %err, "unable to register function, skipping"),
            }
        }
        added
    }

    pub fn contains(&self, spec: &FunctionSpec) -> bool {
        self.functions.contains(spec)
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.iter().find(|spec| spec.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FunctionSpec> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn insert(&mut self, spec: FunctionSpec) -> bool {
        if self.functions.contains(&spec) {
            return false;
        }
        self.functions.push(spec);
        true
    }
}

impl<'a> IntoIterator for &'a FunctionRegistry {
    type Item = &'a FunctionSpec;
    type IntoIter = std::slice::Iter<'a, FunctionSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.iter().map(|s| &s.name).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docplan_backend::{BackendError, ScriptedBackend};

    #[test]
    fn registering_the_same_triple_twice_keeps_one_entry() {
        let mut registry = FunctionRegistry::new();
        assert!(registry.register("read_csv", "(path: str)", Some("reads a csv".into())).unwrap());
        assert!(!registry.register("read_csv", "(path: str)", Some("reads a csv".into())).unwrap());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn specs_differing_in_any_field_are_distinct() {
        let mut registry = FunctionRegistry::new();
        registry.register("read_csv", "(path: str)", None).unwrap();
        registry.register("read_csv", "(path: str)", Some("reads".into())).unwrap();
        registry.register("read_csv", "(path: str, sep: str)", None).unwrap();
        let names: Vec<&str> = registry.iter().map(|s| s.signature.as_str()).collect();
        assert_eq!(names, vec!["(path: str)", "(path: str)", "(path: str, sep: str)"]);
    }

    #[test]
    fn invalid_entries_are_rejected() {
        let mut registry = FunctionRegistry::new();
        assert_eq!(registry.register(" ", "()", None), Err(RegistrationError::EmptyName));
        assert_eq!(
            registry.register("f", "", None),
            Err(RegistrationError::EmptySignature { name: "f".into() })
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn register_many_skips_failures_and_counts_new_entries() {
        let mut registry = FunctionRegistry::new();
        let added = registry.register_many::<ScriptedBackend, _>(
            [
                CallableDescriptor::new("read_csv", "(path: str)").with_docs("reads a csv"),
                CallableDescriptor::new("", "(x)"),
                CallableDescriptor::new("read_csv", "(path: str)").with_docs("reads a csv"),
                CallableDescriptor::new("head", "(n: int = 5)"),
            ],
            None,
        );
        assert_eq!(added, 2);
        assert_eq!(registry.get("head").unwrap().docs, None);
    }

    #[test]
    fn model_docs_fall_back_to_declared_docs() {
        let backend = ScriptedBackend::new();
        backend.push_response("<doc>Model docs.</doc>");
        backend.push_error(BackendError::Model("timeout".into()));
        let generator = DocGenerator::new(backend);

        let mut registry = FunctionRegistry::new();
        registry.register_many(
            [
                CallableDescriptor::new("a", "()").with_source("def a(): ..."),
                CallableDescriptor::new("b", "()").with_docs("declared b").with_source("def b(): ..."),
                CallableDescriptor::new("c", "()").with_docs("declared c"),
            ],
            Some(&generator),
        );

        assert_eq!(registry.get("a").unwrap().docs.as_deref(), Some("Model docs."));
        assert_eq!(registry.get("b").unwrap().docs.as_deref(), Some("declared b"));
        assert_eq!(registry.get("c").unwrap().docs.as_deref(), Some("declared c"));
        assert_eq!(generator.backend().prompts().len(), 2);
    }

    #[test]
    fn descriptor_from_extracted_symbol() {
        let path = SymbolPath::from("pandas.io.read_csv");
        let descriptor = CallableDescriptor::from_symbol(&path, "def read_csv(path: str, sep: str = ',') -> DataFrame:\n    ...");
        assert_eq!(descriptor.name, "read_csv");
        assert_eq!(descriptor.signature, "(path: str, sep: str = ',') -> DataFrame");
        assert!(descriptor.source.is_some());
    }
}
