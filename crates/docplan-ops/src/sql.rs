use docplan_backend::GenerationBackend;
use docplan_core::markers::{self, SQL_NOISE};
use docplan_core::Marker;
use tracing::debug;

use crate::error::SqlGenerationError;
use crate::limits::GenerationLimits;
use crate::prompts;

/// Generates SQL queries from a schema description and a question.
#[derive(Debug)]
pub struct SqlGenerator<B> {
    backend: B,
    limits: GenerationLimits,
}

impl<B: GenerationBackend> SqlGenerator<B> {
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

    /// Generate a query. `<sql>` markers are extracted leniently, like `<doc>`.
    pub fn generate_sql(
        &self,
        schema: &str,
        question: &str,
        instructions: Option<&str>,
        examples: Option<&str>,
    ) -> Result<String, SqlGenerationError> {
        let prompt = prompts::sql(schema, question, instructions, examples);
        debug!(prompt_chars = prompt.len(), "sql_generation_start");
        let raw = self
            .backend
            .generate(&prompt, self.limits.sql)
            .map_err(SqlGenerationError::Backend)?;
        let query = markers::strip_noise(markers::extract_lenient(&raw, Marker::Sql), &SQL_NOISE);
        debug!(chars = query.len(), "sql_generation_complete");
        Ok(query)
    }
}
