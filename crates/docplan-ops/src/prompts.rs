//! Prompt templates.
//!
//! Every template ends with the opening marker of the section the backend is
//! expected to fill in. Backends return the prompt followed by the
//! generation, so that marker is present in what the planner extracts from.

use docplan_core::{FunctionSpec, Marker};

const DOC_QUESTION: &str = "Document the python code above giving function description ,parameters and return type and example on how to call the function";

const FUNCTION_DOCS_QUESTION: &str = "Document the function above giving the function description , parameter name and description , dtypes , possible param values, default param value and return type.";

const SQL_PREAMBLE: &str =
    "Generate simple SQL queries from the schema mentioned for the following questions.";

const PLAN_JSON_STRUCTURE: &str = r#"{
  "tasks": [
    {
      "task_id": 1,
      "function_name": "some_library.some_function",
      "parameters": [
        {
          "name": "name of this parameter according to annotations.",
          "value": "value to be passed for this parameter",
          "dtype": "type annotation of the variable",
          "description": "An explanation of why this value should be utilized."
        },
        {
          "name": "self",
          "value": "variable name to be passed for this parameter self.",
          "dtype": "type annotation of the self parameter",
          "description": "An explanation of why the variable should be used for this self parameter."
        }
      ],
      "outputs": ["variable_1"],
      "description": "some description"
    },
    {
      "task_id": 2,
      "function_name": "some_library_2.some_random_function",
      "parameters": [
        {
          "name": "self",
          "value": "variable name to be passed for this parameter self.",
          "dtype": "type annotation of the self parameter",
          "description": "An explanation of why the variable should be used for this self parameter."
        },
        {
          "name": "name of this parameter according to annotations.",
          "value": "value to be passed for this parameter",
          "dtype": "type annotation of the variable",
          "description": "An explanation of why this value should be utilized."
        }
      ],
      "outputs": ["variable_2"],
      "description": "some description"
    }
  ]
}"#;

/// Few-shot docstring prompt for one snippet.
pub fn docstring(source: &str) -> String {
    format!(
        "<example_response>
--code:def divide_by_two(x: float) -> float: return x / 2
--question:{DOC_QUESTION}
--doc:
Description: This function divides a given number by 2.
Parameters:
- x (float): The input value to be divided by 2.
Returns:
- float: The result of x divided by 2.
Example:
divide_by_two(1.0)
</example_response>
<function_code>{source}</function_code>
<instructions> Use the exact path/name of function from the function_code for the example on how to call the function </instructions>
<question>{DOC_QUESTION}</question>
{open}",
        open = Marker::Doc.open(),
    )
}

/// Shorter docs prompt used for callables registered with the planner.
pub fn function_docs(source: &str) -> String {
    format!(
        "
<function_code>
{source}
</function_code>
<question>
{FUNCTION_DOCS_QUESTION}
</question>
{open}
",
        open = Marker::Doc.open(),
    )
}

pub fn sql(schema: &str, question: &str, instructions: Option<&str>, examples: Option<&str>) -> String {
    let mut prompt = SQL_PREAMBLE.to_string();
    if let Some(instructions) = instructions.filter(|text| !text.is_empty()) {
        prompt.push_str(&format!("\n<instructions>{instructions}</instructions>"));
    }
    if let Some(examples) = examples.filter(|text| !text.is_empty()) {
        prompt.push_str(&format!("\n<example>{examples}</example>"));
    }
    prompt.push_str(&format!(
        "\n<schema>{schema}</schema>\n<question>{question}</question>\n{}",
        Marker::Sql.open()
    ));
    prompt
}

/// Planner prompt: registered functions, the expected JSON shape, rules and
/// the question.
pub fn plan<'a, I>(functions: I, question: &str, instructions: &str) -> String
where
    I: IntoIterator<Item = &'a FunctionSpec>,
{
    let functions: String = functions.into_iter().map(FunctionSpec::prompt_entry).collect();
    let mut rules = String::from(
        "- pass a self parameter only when the function's annotations require one, with a value based on the question.
- name outputs as variable_1 , variable_2 , variable_3 , variable_4 and more variables in chronological order.
- give attention to the type annotation of the parameter given while filling values.
",
    );
    if !instructions.trim().is_empty() {
        rules.push_str(instructions.trim_end());
        rules.push('\n');
    }

    format!(
        "
<functions>
{functions}</functions>
<json_structure>
{PLAN_JSON_STRUCTURE}
</json_structure>
<instructions>
{rules}</instructions>
<question>
Given the above functions,
- Do not give the parameters in json which have null values and default values of the function, only give the sequencial function calls with parameters to execute the below question:
{question}
</question>
{open}
",
        open = Marker::Json.open(),
    )
}

/// Pseudo-code rendering prompt around a plan's canonical JSON.
pub fn plan_code(plan_json: &str) -> String {
    format!(
        "
{json}
<question>
Given the above plan json, Only write a python code and add proper comments above each code line.
</question>
{open}
",
        json = Marker::Json.wrap(&format!("\n{plan_json}\n")),
        open = Marker::Response.open(),
    )
}

/// Single call expression prompt.
pub fn function_call(question: &str, docs: &str, code: Option<&str>) -> String {
    let code = code
        .map(|code| format!("<function_code>\n{code}\n</function_code>\n"))
        .unwrap_or_default();
    format!(
        "
{code}<docstring>
{docs}
</docstring>
<question>
Given the above function, write a single python function call that answers the question below. Pass every argument as a named parameter and leave out parameters that keep their default value.
{question}
</question>
{open}
",
        open = Marker::FunctionCall.open(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_end_with_their_opening_marker() {
        assert!(docstring("def f(): pass").ends_with("<doc>"));
        assert!(function_docs("def f(): pass").trim_end().ends_with("<doc>"));
        assert!(sql("t(a int)", "count rows", None, None).ends_with("<sql>"));
        assert!(plan(std::iter::empty(), "q", "").trim_end().ends_with("<json>"));
        assert!(plan_code("{}").trim_end().ends_with("<response>"));
        assert!(function_call("q", "docs", None).trim_end().ends_with("<function_call>"));
    }

    #[test]
    fn docstring_wraps_source_in_function_code() {
        let prompt = docstring("def add(a, b): return a + b");
        assert!(prompt.contains("<function_code>def add(a, b): return a + b</function_code>"));
        assert!(prompt.contains("<example_response>"));
    }

    #[test]
    fn sql_sections_are_optional() {
        let bare = sql("t(a int)", "count rows", None, Some(""));
        assert!(!bare.contains("<instructions>"));
        assert!(!bare.contains("<example>"));

        let full = sql("t(a int)", "count rows", Some("use aliases"), Some("SELECT 1;"));
        assert!(full.starts_with(SQL_PREAMBLE));
        assert!(full.contains("\n<instructions>use aliases</instructions>"));
        assert!(full.contains("\n<example>SELECT 1;</example>"));
        assert!(full.contains("<schema>t(a int)</schema>\n<question>count rows</question>"));
    }

    #[test]
    fn plan_lists_functions_in_order_and_appends_instructions() {
        let specs = [
            FunctionSpec::new("read_csv", "(path: str)", Some("reads a csv".into())),
            FunctionSpec::new("head", "(n: int = 5)", None),
        ];
        let prompt = plan(&specs, "show the first rows", "prefer small outputs");

        let first = prompt.find("--name:read_csv").unwrap();
        let second = prompt.find("--name:head").unwrap();
        assert!(first < second);
        assert!(prompt.contains("--doc:None"));
        assert!(prompt.contains("prefer small outputs\n</instructions>"));
        assert!(prompt.contains("show the first rows\n</question>"));
        assert!(!prompt.contains("<json>\n{"));
    }

    #[test]
    fn function_call_includes_code_only_when_given() {
        assert!(!function_call("q", "docs", None).contains("<function_code>"));
        assert!(function_call("q", "docs", Some("def f(): pass")).contains("<function_code>\ndef f(): pass\n</function_code>"));

    }
    #[test]
    fn plan_rules_ask_for_self_only_when_annotated() {
        let prompt = plan(std::iter::empty(), "q", "");
        assert!(prompt.contains(
            "- pass a self parameter only when the function's annotations require one"
        ));
        assert!(!prompt.contains("- use self parameter"));
    }
}
