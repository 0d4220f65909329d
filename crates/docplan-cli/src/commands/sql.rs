use std::path::Path;

use anyhow::{Context, Result};
use docplan_backend::BackendConfig;
use docplan_ops::SqlGenerator;

use super::{backend, read_text};

pub fn execute(
    config: &BackendConfig,
    schema: &Path,
    question: &str,
    instructions: Option<&str>,
    examples: Option<&Path>,
) -> Result<()> {
    let schema = read_text(schema)?;
    let examples = examples.map(read_text).transpose()?;

    let generator = SqlGenerator::new(backend(config)?);
    let query = generator
        .generate_sql(&schema, question, instructions, examples.as_deref())
        .context("Failed to generate SQL")?;
    println!("{}", query.trim());
    Ok(())
}
