use serde::{Deserialize, Serialize};

/// Token budget passed to the backend for each operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationLimits {
    pub doc: usize,
    pub sql: usize,
    pub plan: usize,
    pub code: usize,
    /// Docs synthesized for callables registered with the planner.
    pub model_docs: usize,
    pub function_call: usize,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            doc: 450,
            sql: 300,
            plan: 900,
            code: 600,
            model_docs: 500,
            function_call: 300,
        }
    }
}
