//! Plan data model: an ordered list of tasks produced by the planner backend.
//!
//! A parameter value may name an output variable of an earlier task. That is a
//! textual convention only; [`Plan::dependency_graph`] and
//! [`Plan::dangling_references`] expose it for callers, but parsing never
//! rejects a plan because of it.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use schemars::{schema::RootSchema, schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Value bound to a task parameter.
///
/// Downstream rendering treats these as opaque text substituted into
/// generated code, never as executed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    /// Literal string or the name of an earlier task's output variable.
    Text(String),
    /// Lists and objects are kept as raw JSON.
    Structured(Value),
}

impl ParamValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value.into())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("null"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Text(text) => f.write_str(text),
            ParamValue::Structured(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Parameter {
    pub name: String,
    pub value: ParamValue,
    pub dtype: String,
    pub description: String,
}

impl Parameter {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<ParamValue>,
        dtype: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            dtype: dtype.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Task {
    /// 1-based position of the task in its plan.
    pub task_id: u32,
    pub function_name: String,
    pub parameters: Vec<Parameter>,
    /// Symbolic variable names introduced by this task.
    pub outputs: Vec<String>,
    pub description: String,
}

/// Ordered task graph produced by the planner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    pub tasks: Vec<Task>,
}

/// Structural rule a parsed plan broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanSchemaViolation {
    #[error("task at position {position} has task_id {found}, expected {expected}")]
    TaskIdOutOfSequence {
        position: usize,
        expected: u32,
        found: u32,
    },

    #[error("task {task_id} has an empty function_name")]
    EmptyFunctionName { task_id: u32 },
}

/// Data-flow edge: `to_task` consumes `variable` produced by `from_task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDependency {
    pub from_task: u32,
    pub to_task: u32,
    pub parameter: String,
    pub variable: String,
}

/// A parameter value shaped like a generated output name (`variable_N`)
/// that no earlier task produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub task_id: u32,
    pub parameter: String,
    pub variable: String,
}

impl Plan {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// JSON schema of the exchanged plan form.
    pub fn json_schema() -> RootSchema {
        schema_for!(Plan)
    }

    /// Parse the exchanged JSON form without validating it.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Check structural invariants: `tasks[i].task_id == i + 1` and non-empty
    /// function names.
    pub fn validate(&self) -> Result<(), PlanSchemaViolation> {
        for (position, task) in self.tasks.iter().enumerate() {
            let expected = position as u32 + 1;
            if task.task_id != expected {
                return Err(PlanSchemaViolation::TaskIdOutOfSequence {
                    position,
                    expected,
                    found: task.task_id,
                });
            }
            if task.function_name.trim().is_empty() {
                return Err(PlanSchemaViolation::EmptyFunctionName {
                    task_id: task.task_id,
                });
            }
        }
        Ok(())
    }

    /// Canonical textual form: pretty JSON indented by four spaces.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Every output variable in task order.
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.tasks
            .iter()
            .flat_map(|task| task.outputs.iter().map(String::as_str))
    }

    /// Data-flow edges between tasks, derived from parameter values that name
    /// the output of an earlier task.
    pub fn dependencies(&self) -> Vec<TaskDependency> {
        let mut producers: HashMap<&str, u32> = HashMap::new();
        let mut edges = Vec::new();

        for task in &self.tasks {
            for param in &task.parameters {
                if let Some(variable) = param.value.as_text().map(str::trim) {
                    if let Some(&from_task) = producers.get(variable) {
                        edges.push(TaskDependency {
                            from_task,
                            to_task: task.task_id,
                            parameter: param.name.clone(),
                            variable: variable.to_string(),
                        });
                    }
                }
            }
            for output in &task.outputs {
                producers.insert(output.as_str(), task.task_id);
            }
        }

        edges
    }

    /// Build a petgraph view of the plan: one node per task id, one edge per
    /// [`TaskDependency`] labelled with the variable name.
    pub fn dependency_graph(&self) -> (StableDiGraph<u32, String>, HashMap<u32, NodeIndex>) {
        let mut graph = StableDiGraph::new();
        let mut index = HashMap::new();

        for task in &self.tasks {
            let idx = graph.add_node(task.task_id);
            index.insert(task.task_id, idx);
        }

        for dep in self.dependencies() {
            if let (Some(&from), Some(&to)) = (index.get(&dep.from_task), index.get(&dep.to_task)) {
                graph.add_edge(from, to, dep.variable);
            }
        }

        (graph, index)
    }

    /// Advisory lint: references to `variable_N` names not produced earlier.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut produced: HashSet<&str> = HashSet::new();
        let mut dangling = Vec::new();

        for task in &self.tasks {
            for param in &task.parameters {
                if let Some(variable) = param.value.as_text().map(str::trim) {
                    if looks_like_output_name(variable) && !produced.contains(variable) {
                        dangling.push(DanglingReference {
                            task_id: task.task_id,
                            parameter: param.name.clone(),
                            variable: variable.to_string(),
                        });
                    }
                }
            }
            produced.extend(task.outputs.iter().map(String::as_str));
        }

        dangling
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_canonical_json().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

fn looks_like_output_name(text: &str) -> bool {
    text.strip_prefix("variable_")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_step_plan() -> Plan {
        Plan::new(vec![
            Task {
                task_id: 1,
                function_name: "pandas.read_csv".into(),
                parameters: vec![Parameter::new("filepath_or_buffer", "a.csv", "str", "input file")],
                outputs: vec!["variable_1".into()],
                description: "load the csv".into(),
            },
            Task {
                task_id: 2,
                function_name: "pandas.DataFrame.describe".into(),
                parameters: vec![Parameter::new("self", "variable_1", "DataFrame", "loaded frame")],
                outputs: vec!["variable_2".into()],
                description: "describe it".into(),
            },
        ])
    }

    #[test]
    fn canonical_json_round_trips() {
        let plan = two_step_plan();
        let text = plan.to_canonical_json().unwrap();
        assert!(text.contains("\n    \"tasks\""));
        assert_eq!(Plan::from_json(&text).unwrap(), plan);
        assert_eq!(plan.to_string(), text);
    }

    #[test]
    fn param_values_keep_their_json_shape() {
        let raw = json!({
            "tasks": [{
                "task_id": 1,
                "function_name": "f",
                "parameters": [
                    {"name": "a", "value": null, "dtype": "None", "description": ""},
                    {"name": "b", "value": true, "dtype": "bool", "description": ""},
                    {"name": "c", "value": 3.5, "dtype": "float", "description": ""},
                    {"name": "d", "value": "x", "dtype": "str", "description": ""},
                    {"name": "e", "value": ["x", "y"], "dtype": "list", "description": ""}
                ],
                "outputs": [],
                "description": ""
            }]
        });
        let plan: Plan = serde_json::from_value(raw).unwrap();
        let values: Vec<&ParamValue> = plan.tasks[0].parameters.iter().map(|p| &p.value).collect();
        assert!(values[0].is_null());
        assert_eq!(values[1], &ParamValue::Bool(true));
        assert!(matches!(values[2], ParamValue::Number(_)));
        assert_eq!(values[3].as_text(), Some("x"));
        assert_eq!(values[4], &ParamValue::Structured(json!(["x", "y"])));
    }

    #[test]
    fn validate_rejects_out_of_sequence_ids() {
        let mut plan = two_step_plan();
        assert!(plan.validate().is_ok());

        plan.tasks[1].task_id = 3;
        assert_eq!(
            plan.validate(),
            Err(PlanSchemaViolation::TaskIdOutOfSequence {
                position: 1,
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn validate_rejects_blank_function_name() {
        let mut plan = two_step_plan();
        plan.tasks[0].function_name = "  ".into();
        assert_eq!(
            plan.validate(),
            Err(PlanSchemaViolation::EmptyFunctionName { task_id: 1 })
        );
    }

    #[test]
    fn dependencies_follow_output_references() {
        let plan = two_step_plan();
        let deps = plan.dependencies();
        assert_eq!(
            deps,
            vec![TaskDependency {
                from_task: 1,
                to_task: 2,
                parameter: "self".into(),
                variable: "variable_1".into(),
            }]
        );

        let (graph, index) = plan.dependency_graph();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.find_edge(index[&1], index[&2]).is_some());
    }

    #[test]
    fn dangling_references_are_reported_not_rejected() {
        let mut plan = two_step_plan();
        plan.tasks[1].parameters[0].value = "variable_7".into();
        assert!(plan.validate().is_ok());
        assert_eq!(
            plan.dangling_references(),
            vec![DanglingReference {
                task_id: 2,
                parameter: "self".into(),
                variable: "variable_7".into(),
            }]
        );
        assert!(two_step_plan().dangling_references().is_empty());
    }

    #[test]
    fn schema_describes_tasks() {
        let schema = serde_json::to_value(Plan::json_schema()).unwrap();
        assert!(schema["properties"]["tasks"].is_object());
    }
}
