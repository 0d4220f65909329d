//! Error types for the operations layer.
//!
//! Single-shot operations surface their failure to the caller with the
//! backend cause chained through `source()`. Batch operations log per-item
//! failures and keep going.

use docplan_backend::BackendError;
use docplan_core::{MissingMarker, PlanSchemaViolation};
use thiserror::Error;

/// Documenting one snippet failed.
#[derive(Debug, Error)]
pub enum DocGenerationError {
    #[error("no source text to document")]
    EmptySource,

    #[error("unable to generate the docs using model: {0}")]
    Backend(#[source] BackendError),
}

/// Generating a SQL query failed.
#[derive(Debug, Error)]
pub enum SqlGenerationError {
    #[error("unable to generate the SQL query using model: {0}")]
    Backend(#[source] BackendError),
}

/// Prompt, backend or marker stage of plan generation failed.
#[derive(Debug, Error)]
pub enum PlanGenerationError {
    #[error("unable to generate the plan: {0}")]
    Backend(#[source] BackendError),

    #[error("unable to generate the plan: {0}")]
    MissingMarker(#[from] MissingMarker),
}

/// The extracted plan text was not a valid plan. Carries the offending text.
#[derive(Debug, Error)]
pub enum PlanValidationError {
    #[error("unable to parse the response: {raw}: {source}")]
    Parse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("plan breaks the task structure ({source}): {raw}")]
    Schema {
        raw: String,
        #[source]
        source: PlanSchemaViolation,
    },
}

impl PlanValidationError {
    /// Text extracted from the backend response that failed validation.
    pub fn raw(&self) -> &str {
        match self {
            PlanValidationError::Parse { raw, .. } | PlanValidationError::Schema { raw, .. } => raw,
        }
    }
}

/// Failure of [`crate::Planner::generate_plan`].
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Generation(#[from] PlanGenerationError),

    #[error(transparent)]
    Validation(#[from] PlanValidationError),
}

impl From<BackendError> for PlanError {
    fn from(err: BackendError) -> Self {
        PlanError::Generation(PlanGenerationError::Backend(err))
    }
}

impl From<MissingMarker> for PlanError {
    fn from(err: MissingMarker) -> Self {
        PlanError::Generation(PlanGenerationError::MissingMarker(err))
    }
}

/// Rendering a plan into pseudo-code failed.
#[derive(Debug, Error)]
pub enum CodeRenderError {
    #[error("unable to serialize the plan: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("unable to generate the code: {0}")]
    Backend(#[source] BackendError),

    #[error("unable to generate the code: {0}")]
    MissingMarker(#[from] MissingMarker),
}

/// Generating a single call expression failed.
#[derive(Debug, Error)]
pub enum FunctionCallError {
    #[error("either a docstring or the function code is required")]
    MissingInput,

    #[error("unable to document the function before calling it: {0}")]
    Docs(#[from] DocGenerationError),

    #[error("unable to generate the function call: {0}")]
    Backend(#[source] BackendError),

    #[error("unable to generate the function call: {0}")]
    MissingMarker(#[from] MissingMarker),
}

/// A callable could not be added to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("unable to add function: name is empty")]
    EmptyName,

    #[error("unable to add function {name}: signature is empty")]
    EmptySignature { name: String },
}
