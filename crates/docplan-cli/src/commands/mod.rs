//! CLI command implementations.

pub mod config;
pub mod doc;
pub mod plan;
pub mod sql;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use docplan_backend::{create_backend, BackendConfig, GenerationBackend};
use docplan_symbols::{SymbolGraph, SymbolId, SymbolManifest};
use tracing::info;

/// Read a whole input file.
pub(crate) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub(crate) fn backend(config: &BackendConfig) -> Result<Box<dyn GenerationBackend>> {
    let backend = create_backend(config).context("Failed to create generation backend")?;
    info!(backend = %backend.describe(), "backend_ready");
    Ok(backend)
}

/// Load a manifest and build its namespace graph.
pub(crate) fn load_manifest(path: &Path) -> Result<(SymbolManifest, SymbolGraph, SymbolId)> {
    let manifest = SymbolManifest::load(path)
        .with_context(|| format!("Failed to load manifest {}", path.display()))?;
    let (graph, root) = manifest
        .into_graph()
        .with_context(|| format!("Invalid manifest {}", path.display()))?;
    Ok((manifest, graph, root))
}
