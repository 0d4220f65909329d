//! Docstring generation for single snippets and whole namespaces.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use docplan_backend::GenerationBackend;
use docplan_core::markers::{self, DOC_NOISE};
use docplan_core::{Marker, SymbolPath};
use docplan_symbols::{SymbolExtractor, SymbolGraph, SymbolId};
use tracing::{debug, info, warn};

use crate::error::DocGenerationError;
use crate::limits::GenerationLimits;
use crate::prompts;

/// Cooperative cancellation token for batch documentation.
///
/// Clones share state; triggering any clone stops every batch checking it.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct DocBatch {
    /// Generated docs for every symbol documented before completion or interruption.
    pub docs: BTreeMap<SymbolPath, String>,
    /// Items whose generation failed; they have no entry in `docs`.
    pub failed: Vec<(SymbolPath, DocGenerationError)>,
    /// True when the batch stopped early on an [`Interrupt`].
    pub interrupted: bool,
}

impl DocBatch {
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Generates documentation from callable source text.
#[derive(Debug)]
pub struct DocGenerator<B> {
    backend: B,
    limits: GenerationLimits,
}

impl<B: GenerationBackend> DocGenerator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            limits: GenerationLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: GenerationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Document one snippet with the few-shot prompt.
    ///
    /// A response without `<doc>` markers is not an error: the text after the
    /// last opening marker (or the whole response) up to the first closing
    /// marker is returned.
    pub fn document(&self, source: &str) -> Result<String, DocGenerationError> {
        self.run(&prompts::docstring(source), source, self.limits.doc)
    }

    /// Document a callable for the planner's function list.
    pub fn document_function(&self, source: &str) -> Result<String, DocGenerationError> {
        self.run(&prompts::function_docs(source), source, self.limits.model_docs)
    }

    /// Extract every public callable below `root` and document each one.
    pub fn document_module(
        &self,
        graph: &SymbolGraph,
        root: SymbolId,
        root_name: &str,
        interrupt: &Interrupt,
    ) -> DocBatch {
        let extraction = SymbolExtractor::new(graph).extract(root, root_name);
        self.document_sources(&extraction.sources, interrupt)
    }

    /// Document already extracted sources in path order.
    ///
    /// The interrupt is checked before each item; on interruption the docs
    /// accumulated so far are returned.
    pub fn document_sources(
        &self,
        sources: &BTreeMap<SymbolPath, String>,
        interrupt: &Interrupt,
    ) -> DocBatch {
        let mut batch = DocBatch::default();
        info!(symbols = sources.len(), backend = %self.backend.describe(), "doc_batch_start");

        for (path, source) in sources {
            if interrupt.is_triggered() {
                warn!(
                    documented = batch.docs.len(),
                    remaining = sources.len() - batch.docs.len() - batch.failed.len(),
                    "interrupted, returning the docs generated so far"
                );
                batch.interrupted = true;
                break;
            }

            debug!(path = %path, "doc_batch_item_start");
            match self.document(source) {
                Ok(doc) => {
                    debug!(path = %path, chars = doc.len(), "doc_batch_item_complete");
                    batch.docs.insert(path.clone(), doc);
                }
                Err(err) => {
                    warn!(path = %path, error = %err, "unable to document symbol, skipping");
                    batch.failed.push((path.clone(), err));
                }
            }
        }

        info!(
            documented = batch.docs.len(),
            failed = batch.failed.len(),
            interrupted = batch.interrupted,
            "doc_batch_complete"
        );
        batch
    }

    fn run(&self, prompt: &str, source: &str, max_tokens: usize) -> Result<String, DocGenerationError> {
        if source.trim().is_empty() {
            return Err(DocGenerationError::EmptySource);
        }
        let raw = self
            .backend
            .generate(prompt, max_tokens)
            .map_err(DocGenerationError::Backend)?;
        let doc = markers::extract_lenient(&raw, Marker::Doc);
        Ok(markers::strip_noise(doc, &DOC_NOISE))
    }
}
