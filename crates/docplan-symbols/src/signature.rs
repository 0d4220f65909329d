//! Signature text recovered from a callable's source.

/// Derive `(params) -> ret` from the first function header in `source`.
///
/// Understands Python (`def`, `async def`) and Rust (`fn`, `pub fn`, ...)
/// headers. Parameter lists spanning several lines are collapsed onto one
/// line. Returns `None` when no header is found or its parentheses are
/// unbalanced.
pub fn signature_from_source(source: &str) -> Option<String> {
    let header = find_header(source)?;
    let open = header.find('(')?;

    let mut depth = 0usize;
    let mut close = None;
    for (offset, ch) in header[open..].char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    close = Some(open + offset);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close?;

    let params = collapse_whitespace(&header[open + 1..close]);
    let params = params.trim_end_matches(',').trim();
    let mut signature = format!("({params})");

    let rest = header[close + 1..].trim_start();
    if let Some(ret) = rest.strip_prefix("->") {
        let end = ret.find(['{', ';']).unwrap_or(ret.len());
        let ret = ret[..end].split(" where ").next().unwrap_or_default();
        let ret = strip_python_body_colon(ret.trim());
        if !ret.is_empty() {
            signature.push_str(" -> ");
            signature.push_str(&collapse_whitespace(ret));
        }
    }

    Some(signature)
}

const HEADER_KEYWORDS: [&str; 7] = [
    "def ",
    "async def ",
    "fn ",
    "pub fn ",
    "pub(crate) fn ",
    "async fn ",
    "pub async fn ",
];

fn find_header(source: &str) -> Option<&str> {
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let keyword = HEADER_KEYWORDS.iter().any(|kw| trimmed.starts_with(kw));
        if keyword {
            return Some(&source[offset..]);
        }
        offset += line.len();
    }
    None
}

/// Python headers end with `:` before the body; Rust paths use `::` but
/// never `: ` in a return type.
fn strip_python_body_colon(ret: &str) -> &str {
    let first_line = ret.lines().next().unwrap_or_default();
    first_line
        .split(": ")
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches(':')
        .trim()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
