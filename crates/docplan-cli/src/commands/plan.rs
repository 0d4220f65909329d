//! Planning commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docplan_backend::BackendConfig;
use docplan_core::Plan;
use docplan_ops::{CallableDescriptor, Planner};
use docplan_symbols::SymbolExtractor;

use super::{backend, load_manifest, read_text};

/// Where the planner's functions come from.
#[derive(Debug, Clone)]
pub enum FunctionSource {
    /// JSON array of [`CallableDescriptor`]s.
    Descriptors(PathBuf),
    /// Every public callable of a namespace manifest.
    Manifest(PathBuf),
}

impl FunctionSource {
    pub fn load(&self) -> Result<Vec<CallableDescriptor>> {
        match self {
            FunctionSource::Descriptors(path) => parse_descriptors(&read_text(path)?)
                .with_context(|| format!("Invalid functions file {}", path.display())),
            FunctionSource::Manifest(path) => {
                let (manifest, graph, root) = load_manifest(path)?;
                let extraction = SymbolExtractor::new(&graph).extract(root, &manifest.name);
                Ok(extraction
                    .sources
                    .iter()
                    .map(|(path, source)| CallableDescriptor::from_symbol(path, source))
                    .collect())
            }
        }
    }
}

fn parse_descriptors(text: &str) -> Result<Vec<CallableDescriptor>> {
    Ok(serde_json::from_str(text)?)
}

pub fn execute(
    config: &BackendConfig,
    source: &FunctionSource,
    question: &str,
    instructions: &str,
    model_docs: bool,
    render_code: bool,
) -> Result<()> {
    let descriptors = source.load()?;
    let total = descriptors.len();

    let mut planner = Planner::new(backend(config)?);
    let registered = planner.register_many(descriptors, model_docs);
    if registered == 0 {
        anyhow::bail!("No functions could be registered ({total} given)");
    }
    eprintln!("Registered {registered} of {total} functions");

    let plan = planner
        .generate_plan(question, instructions)
        .context("Failed to generate plan")?;
    print_plan(&plan)?;

    if render_code {
        let code = planner
            .plan_to_code(&plan)
            .context("Failed to render plan as code")?;
        println!("\n{}", code.trim());
    }
    Ok(())
}

fn print_plan(plan: &Plan) -> Result<()> {
    println!("{}", plan.to_canonical_json()?);
    for dangling in plan.dangling_references() {
        eprintln!(
            "note: task {} parameter `{}` uses `{}`, which no earlier task produces",
            dangling.task_id, dangling.parameter, dangling.variable
        );
    }
    Ok(())
}

pub fn function_call(
    config: &BackendConfig,
    question: &str,
    docs: Option<&Path>,
    code: Option<&Path>,
) -> Result<()> {
    let docs = docs.map(read_text).transpose()?;
    let code = code.map(read_text).transpose()?;

    let planner = Planner::new(backend(config)?);
    let call = planner
        .generate_function_call(question, docs.as_deref(), code.as_deref())
        .context("Failed to generate function call")?;
    println!("{call}");
    Ok(())
}
