//! Namespace graphs and recursive symbol extraction.
//!
//! Rust has no runtime reflection over arbitrary modules, so the inspectable
//! units are registered explicitly: a [`SymbolGraph`] holds modules, classes
//! and callables (with their source text) connected by named member edges.
//! Members may point anywhere in the graph, so re-exports, aliases into
//! external namespaces and circular module references are all expressible.
//!
//! [`SymbolExtractor`] walks such a graph depth-first and returns a mapping
//! from dotted [`SymbolPath`](docplan_core::SymbolPath) to source text for
//! every reachable public callable.

mod error;
mod extract;
mod graph;
mod manifest;
mod signature;

pub use error::ManifestError;
pub use extract::{
    extract, extract_with, ExtractOptions, Extraction, SkipReason, SkippedSymbol, SymbolExtractor,
};
pub use graph::{ModuleNotFound, ModuleResolver, SymbolGraph, SymbolId, SymbolKind, SymbolNode};
pub use manifest::{ManifestEntry, SymbolManifest};
pub use signature::signature_from_source;
