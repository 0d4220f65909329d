//! Documentation commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use docplan_backend::BackendConfig;
use docplan_ops::{DocGenerator, Interrupt};
use docplan_symbols::{signature_from_source, SymbolExtractor};
use tracing::warn;

use super::{backend, load_manifest, read_text};

/// Document a single snippet read from `file`.
pub fn document_file(config: &BackendConfig, file: &Path) -> Result<()> {
    let source = read_text(file)?;
    let generator = DocGenerator::new(backend(config)?);
    let doc = generator
        .document(&source)
        .with_context(|| format!("Failed to document {}", file.display()))?;
    println!("{}", doc.trim());
    Ok(())
}

/// Document a namespace manifest, optionally restricted to one module.
pub fn document_manifest(
    config: &BackendConfig,
    manifest_path: &Path,
    root: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let (manifest, graph, manifest_root) = load_manifest(manifest_path)?;
    let (root_id, root_name) = match root {
        Some(name) => {
            let id = graph
                .module(name)
                .with_context(|| format!("Module {name} is not described in the manifest"))?;
            (id, name.to_string())
        }
        None => (manifest_root, manifest.name.clone()),
    };

    let interrupt = Interrupt::new();
    let handler = interrupt.clone();
    ctrlc::set_handler(move || handler.trigger()).context("Failed to install Ctrl-C handler")?;

    let generator = DocGenerator::new(backend(config)?);
    let batch = generator.document_module(&graph, root_id, &root_name, &interrupt);

    if batch.interrupted {
        eprintln!("Interrupted: returning the {} docs generated so far.", batch.len());
    }
    for (path, err) in &batch.failed {
        warn!(path = %path, error = %err, "symbol left undocumented");
    }

    let rendered = serde_json::to_string_pretty(&batch.docs)?;
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Wrote {} docs ({} failed) to {}",
                batch.len(),
                batch.failed.len(),
                path.display()
            );
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Print every public callable of a manifest with its signature.
pub fn list_symbols(manifest_path: &Path) -> Result<()> {
    let (manifest, graph, root) = load_manifest(manifest_path)?;
    let extraction = SymbolExtractor::new(&graph).extract(root, &manifest.name);

    for (path, source) in &extraction.sources {
        let signature = signature_from_source(source).unwrap_or_else(|| "(?)".to_string());
        println!("{path}{signature}");
    }
    eprintln!(
        "{} callables, {} skipped",
        extraction.len(),
        extraction.skipped.len()
    );
    Ok(())
}
