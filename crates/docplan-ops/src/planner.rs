//! Plan compiler: registry + question -> [`Plan`], and back to pseudo-code.
//!
//! `generate_plan` moves through
//! `idle -> prompt_built -> backend_invoked -> response_extracted -> validated`,
//! failing with a generation error before extraction completes and with a
//! validation error afterwards. Nothing is retried; callers decide.

use docplan_backend::GenerationBackend;
use docplan_core::markers::{self, Marker};
use docplan_core::Plan;
use tracing::{debug, info};

use crate::docs::DocGenerator;
use crate::error::{
    CodeRenderError, FunctionCallError, PlanError, PlanGenerationError, PlanValidationError,
    RegistrationError,
};
use crate::limits::GenerationLimits;
use crate::prompts;
use crate::registry::{CallableDescriptor, FunctionRegistry};

#[derive(Debug)]
pub struct Planner<B> {
    backend: B,
    registry: FunctionRegistry,
    limits: GenerationLimits,
}

impl<B: GenerationBackend> Planner<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            registry: FunctionRegistry::new(),
            limits: GenerationLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: GenerationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Add one function; duplicates are ignored.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        signature: impl Into<String>,
        docs: Option<String>,
    ) -> Result<bool, RegistrationError> {
        self.registry.register(name, signature, docs)
    }

    /// Register callables, optionally documenting them with this planner's
    /// backend. Per-item failures are logged and skipped.
    pub fn register_many<I>(&mut self, descriptors: I, use_model_docs: bool) -> usize
    where
        I: IntoIterator<Item = CallableDescriptor>,
    {
        if use_model_docs {
            let generator = DocGenerator::new(&self.backend).with_limits(self.limits);
            self.registry.register_many(descriptors, Some(&generator))
        } else {
            self.registry
                .register_many::<&B, _>(descriptors, None)
        }
    }

    pub fn build_prompt(&self, question: &str, instructions: &str) -> String {
        prompts::plan(&self.registry, question, instructions)
    }

    /// Ask the backend for a plan answering `question`.
    pub fn generate_plan(&self, question: &str, instructions: &str) -> Result<Plan, PlanError> {
        info!(functions = self.registry.len(), backend = %self.backend.describe(), "plan_generation_start");

        let prompt = self.build_prompt(question, instructions);
        debug!(prompt_chars = prompt.len(), "plan_prompt_built");

        let raw = self
            .backend
            .generate(&prompt, self.limits.plan)
            .map_err(PlanGenerationError::Backend)?;
        debug!(response_chars = raw.len(), "plan_backend_invoked");

        let repaired = markers::repair_json_nulls(&raw);
        let body = markers::extract_strict(&repaired, Marker::Json).map_err(PlanGenerationError::from)?;
        debug!(json_chars = body.len(), "plan_response_extracted");

        let plan = Plan::from_json(body).map_err(|source| PlanValidationError::Parse {
            raw: body.to_string(),
            source,
        })?;
        plan.validate().map_err(|source| PlanValidationError::Schema {
            raw: body.to_string(),
            source,
        })?;

        for dangling in plan.dangling_references() {
            debug!(
                task_id = dangling.task_id,
                parameter = %dangling.parameter,
                variable = %dangling.variable,
                "plan_dangling_reference"
            );
        }
        info!(tasks = plan.len(), "plan_validated");
        Ok(plan)
    }

    /// Render `plan` as commented sequential pseudo-code.
    pub fn plan_to_code(&self, plan: &Plan) -> Result<String, CodeRenderError> {
        let plan_json = plan.to_canonical_json().map_err(CodeRenderError::Serialize)?;
        let prompt = prompts::plan_code(&plan_json);
        debug!(tasks = plan.len(), prompt_chars = prompt.len(), "plan_code_start");

        let raw = self
            .backend
            .generate(&prompt, self.limits.code)
            .map_err(CodeRenderError::Backend)?;
        let code = markers::extract_strict(&raw, Marker::Response)?;
        debug!(chars = code.len(), "plan_code_complete");
        Ok(code.to_string())
    }

    /// Produce a single call expression answering `question`.
    ///
    /// Needs a docstring or the function's code; with code only, docs are
    /// generated first.
    pub fn generate_function_call(
        &self,
        question: &str,
        docstring: Option<&str>,
        code: Option<&str>,
    ) -> Result<String, FunctionCallError> {
        let docs = match (docstring, code) {
            (Some(docs), _) => docs.to_string(),
            (None, Some(code)) => {
                debug!("function_call_documenting_code");
                DocGenerator::new(&self.backend)
                    .with_limits(self.limits)
                    .document_function(code)?
            }
            (None, None) => return Err(FunctionCallError::MissingInput),
        };

        let prompt = prompts::function_call(question, docs.trim(), code);
        debug!(prompt_chars = prompt.len(), "function_call_start");
        let raw = self
            .backend
            .generate(&prompt, self.limits.function_call)
            .map_err(FunctionCallError::Backend)?;
        let call = markers::extract_strict(&raw, Marker::FunctionCall)?;
        debug!(chars = call.len(), "function_call_complete");
        Ok(call.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docplan_backend::{BackendError, ScriptedBackend};
    use docplan_core::{ParamValue, Parameter, PlanSchemaViolation, Task};

    fn planner(responses: &[&str]) -> Planner<ScriptedBackend> {
        let mut planner = Planner::new(ScriptedBackend::with_responses(responses.iter().copied()));
        planner
            .add_function("read_csv", "(path: str)", Some("reads a csv".into()))
            .unwrap();
        planner
    }

    fn sample_plan() -> Plan {
        Plan::new(vec![
            Task {
                task_id: 1,
                function_name: "read_csv".into(),
                parameters: vec![Parameter::new("path", "a.csv", "str", "file path")],
                outputs: vec!["variable_1".into()],
                description: "load csv".into(),
            },
            Task {
                task_id: 2,
                function_name: "DataFrame.head".into(),
                parameters: vec![Parameter::new("self", "variable_1", "DataFrame", "loaded frame")],
                outputs: vec!["variable_2".into()],
                description: "first rows".into(),
            },
        ])
    }

    #[test]
    fn python_none_is_repaired_before_parsing() {
        let planner = planner(&[
            r#"<json>{"tasks":[{"task_id":1,"function_name":"read_csv","parameters":[{"name":"sep","value":None,"dtype":"str","description":"d"}],"outputs":["variable_1"],"description":"x"}]}</json>"#,
        ]);
        let plan = planner.generate_plan("load", "").unwrap();
        assert_eq!(plan.tasks[0].parameters[0].value, ParamValue::Null);
    }

    #[test]
    fn missing_opening_marker_is_a_generation_error() {
        let planner = planner(&[
            r#"{"tasks":[{"task_id":1,"function_name":"read_csv","parameters":[],"outputs":[],"description":""}]}</json>"#,
        ]);
        match planner.generate_plan("load", "").unwrap_err() {
            PlanError::Generation(PlanGenerationError::MissingMarker(missing)) => {
                assert_eq!(missing.missing, "<json>")
            }
            other => panic!("expected missing marker, got {other:?}"),
        }
    }

    #[test]
    fn chatter_with_only_a_closing_marker_is_not_a_validation_error() {
        let planner = planner(&["model chatter, sorry</json>"]);
        assert!(matches!(
            planner.generate_plan("load", "").unwrap_err(),
            PlanError::Generation(PlanGenerationError::MissingMarker(_))
        ));
    }

    #[test]
    fn missing_closing_marker_is_a_generation_error() {
        let planner = planner(&[r#"<json>{"tasks": []"#]);
        let err = planner.generate_plan("load", "").unwrap_err();
        assert!(matches!(
            err,
            PlanError::Generation(PlanGenerationError::MissingMarker(_))
        ));
    }

    #[test]
    fn unparsable_json_is_a_validation_error_with_raw_text() {
        let planner = planner(&["<json>not json</json>"]);
        match planner.generate_plan("load", "").unwrap_err() {
            PlanError::Validation(err) => assert_eq!(err.raw(), "not json"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn out_of_sequence_task_ids_are_rejected() {
        let planner = planner(&[
            r#"<json>{"tasks":[{"task_id":2,"function_name":"read_csv","parameters":[],"outputs":[],"description":""}]}</json>"#,
        ]);
        match planner.generate_plan("load", "").unwrap_err() {
            PlanError::Validation(PlanValidationError::Schema { source, .. }) => assert_eq!(
                source,
                PlanSchemaViolation::TaskIdOutOfSequence {
                    position: 0,
                    expected: 1,
                    found: 2
                }
            ),
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn prompt_and_budget_reach_the_backend() {
        let planner = planner(&[r#"<json>{"tasks":[]}</json>"#]).with_limits(GenerationLimits {
            plan: 1360,
            ..GenerationLimits::default()
        });
        planner.generate_plan("load a.csv", "be brief").unwrap();

        let (prompt, max_tokens) = &planner.backend().prompts()[0];
        assert_eq!(*max_tokens, 1360);
        assert!(prompt.contains("--name:read_csv\n--annotations:(path: str)\n--doc:reads a csv"));
        assert!(prompt.contains("be brief"));
        assert!(prompt.contains("load a.csv"));
    }

    #[test]
    fn plan_to_code_embeds_canonical_json_and_extracts_response() {
        let planner = planner(&["echo <response>\n# load\ndf = read_csv(path='a.csv')\n</response> bye"]);
        let plan = sample_plan();
        let code = planner.plan_to_code(&plan).unwrap();
        assert_eq!(code, "\n# load\ndf = read_csv(path='a.csv')\n");

        let (prompt, max_tokens) = &planner.backend().prompts()[0];
        assert_eq!(*max_tokens, 600);
        assert!(prompt.contains(&plan.to_canonical_json().unwrap()));
    }

    #[test]
    fn plan_to_code_without_closing_marker_fails_cleanly() {
        let planner = planner(&["<response>df = read_csv('a.csv')"]);
        assert!(matches!(
            planner.plan_to_code(&sample_plan()),
            Err(CodeRenderError::MissingMarker(_))
        ));
    }

    #[test]
    fn plan_to_code_without_opening_marker_fails_cleanly() {
        let planner = planner(&["print('x')</response>"]);
        match planner.plan_to_code(&sample_plan()) {
            Err(CodeRenderError::MissingMarker(missing)) => assert_eq!(missing.missing, "<response>"),
            other => panic!("expected missing marker, got {other:?}"),
        }
    }

    #[test]
    fn plan_to_code_surfaces_backend_failure() {
        let planner = planner(&[]);
        assert!(matches!(
            planner.plan_to_code(&sample_plan()),
            Err(CodeRenderError::Backend(BackendError::Exhausted))
        ));
    }

    #[test]
    fn function_call_requires_docs_or_code() {
        let planner = planner(&[]);
        assert!(matches!(
            planner.generate_function_call("q", None, None),
            Err(FunctionCallError::MissingInput)
        ));
    }

    #[test]
    fn function_call_from_docstring() {
        let planner = planner(&["<function_call> read_csv(path='a.csv') </function_call>"]);
        let call = planner
            .generate_function_call("load a.csv", Some("read_csv(path): reads a csv"), None)
            .unwrap();
        assert_eq!(call, "read_csv(path='a.csv')");
        assert_eq!(planner.backend().prompts().len(), 1);
    }

    #[test]
    fn function_call_without_markers_fails() {
        let planner = planner(&["read_csv(path='a.csv')"]);
        assert!(matches!(
            planner.generate_function_call("load a.csv", Some("reads a csv"), None),
            Err(FunctionCallError::MissingMarker(_))
        ));
    }

    #[test]
    fn function_call_without_opening_marker_fails() {
        let planner = planner(&["read_csv(path='a')</function_call>"]);
        match planner.generate_function_call("load a", Some("reads a csv"), None) {
            Err(FunctionCallError::MissingMarker(missing)) => {
                assert_eq!(missing.missing, "<function_call>")
            }
            other => panic!("expected missing marker, got {other:?}"),
        }
    }

    #[test]
    fn function_call_from_code_documents_first() {
        let planner = planner(&[
            "<doc>Reads a csv file.</doc>",
            "<function_call>read_csv(path='a.csv')</function_call>",
        ]);
        let call = planner
            .generate_function_call("load a.csv", None, Some("def read_csv(path): ..."))
            .unwrap();
        assert_eq!(call, "read_csv(path='a.csv')");

        let prompts = planner.backend().prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].1, 500);
        assert!(prompts[1].0.contains("Reads a csv file."));
        assert!(prompts[1].0.contains("def read_csv(path): ..."));
    }

    #[test]
    fn function_call_doc_failure_is_chained() {
        let planner = planner(&[]);
        assert!(matches!(
            planner.generate_function_call("q", None, Some("def f(): ...")),
            Err(FunctionCallError::Docs(_))
        ));
    }

    #[test]
    fn register_many_with_model_docs_uses_planner_backend() {
        let mut planner = Planner::new(ScriptedBackend::with_responses(["<doc>Generated.</doc>"]));
        let added = planner.register_many(
            [CallableDescriptor::new("f", "()").with_source("def f(): ...")],
            true,
        );
        assert_eq!(added, 1);
        assert_eq!(planner.registry().get("f").unwrap().docs.as_deref(), Some("Generated."));
    }
}
