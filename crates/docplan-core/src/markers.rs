//! Delimiter protocol shared by every prompt/response pair.
//!
//! Generated text is recovered by locating a pair of literal markers such as
//! `<json>` and `</json>`; anything outside the pair is model chatter.
//!
//! Two extraction policies exist:
//!
//! - [`extract_lenient`] takes the text after the *last* opening marker up to
//!   the *first* closing marker after it. A missing opening marker means the
//!   whole input is used; a missing closing marker means the remainder is used.
//!   Used for `<doc>` and `<sql>`, where local models echo the prompt.
//! - [`extract_strict`] takes the text after the *first* opening marker up to
//!   the *next* closing marker and fails if either is absent. Used for
//!   `<json>`, `<response>` and `<function_call>`.

use std::fmt;

use thiserror::Error;

/// Strings some models wrap around generated documentation.
pub const DOC_NOISE: [&str; 4] = [
    "<p>",
    "</p>",
    "<function_description>",
    "</function_description>",
];

/// Markup stripped from generated SQL.
pub const SQL_NOISE: [&str; 2] = ["<p>", "</p>"];

/// Delimiter pairs used in prompts and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Doc,
    Json,
    Sql,
    Response,
    FunctionCall,
}

impl Marker {
    pub fn tag(&self) -> &'static str {
        match self {
            Marker::Doc => "doc",
            Marker::Json => "json",
            Marker::Sql => "sql",
            Marker::Response => "response",
            Marker::FunctionCall => "function_call",
        }
    }

    pub fn open(&self) -> &'static str {
        match self {
            Marker::Doc => "<doc>",
            Marker::Json => "<json>",
            Marker::Sql => "<sql>",
            Marker::Response => "<response>",
            Marker::FunctionCall => "<function_call>",
        }
    }

    pub fn close(&self) -> &'static str {
        match self {
            Marker::Doc => "</doc>",
            Marker::Json => "</json>",
            Marker::Sql => "</sql>",
            Marker::Response => "</response>",
            Marker::FunctionCall => "</function_call>",
        }
    }

    /// Wrap `content` in this marker pair.
    pub fn wrap(&self, content: &str) -> String {
        format!("{}{}{}", self.open(), content, self.close())
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.open())
    }
}

/// A required marker was not present in the backend output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("backend output is missing the `{missing}` marker")]
pub struct MissingMarker {
    pub marker: Marker,
    pub missing: &'static str,
}

/// Last-opening / first-closing extraction that never fails.
pub fn extract_lenient(raw: &str, marker: Marker) -> &str {
    let after_open = match raw.rfind(marker.open()) {
        Some(idx) => &raw[idx + marker.open().len()..],
        None => raw,
    };
    match after_open.find(marker.close()) {
        Some(idx) => &after_open[..idx],
        None => after_open,
    }
}

/// First-opening / next-closing extraction requiring both markers.
pub fn extract_strict(raw: &str, marker: Marker) -> Result<&str, MissingMarker> {
    let start = raw.find(marker.open()).ok_or(MissingMarker {
        marker,
        missing: marker.open(),
    })? + marker.open().len();
    let rest = &raw[start..];
    let end = rest.find(marker.close()).ok_or(MissingMarker {
        marker,
        missing: marker.close(),
    })?;
    Ok(&rest[..end])
}

/// Remove every occurrence of each noise string.
pub fn strip_noise(text: &str, noise: &[&str]) -> String {
    noise
        .iter()
        .fold(text.to_string(), |acc, needle| acc.replace(needle, ""))
}

/// Replace the literal token `None` with `null`.
///
/// Some backends emit Python-style `None` inside otherwise valid JSON.
pub fn repair_json_nulls(raw: &str) -> String {
    raw.replace("None", "null")
}
