use serde::{Deserialize, Serialize};

/// Structured description of a callable made available to the planner.
///
/// Equality is structural; the function registry relies on it for dedup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub signature: String,
    #[serde(default)]
    pub docs: Option<String>,
}

impl FunctionSpec {
    pub fn new(
        name: impl Into<String>,
        signature: impl Into<String>,
        docs: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            docs,
        }
    }

    /// Render the entry as it appears inside the planner's `<functions>` block.
    pub fn prompt_entry(&self) -> String {
        format!(
            "--name:{}\n--annotations:{}\n--doc:{}\n\n",
            self.name,
            self.signature,
            self.docs.as_deref().unwrap_or("None")
        )
    }
}
