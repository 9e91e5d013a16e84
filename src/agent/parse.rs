//! Helpers for pulling structured payloads out of model text.

/// Return the body of the first fenced code block, or `None` if there is none.
///
/// An info string after the opening fence (e.g. ```` ```python ````) is skipped.
/// An unterminated fence yields everything after the opening line.
pub fn extract_fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
    let body = &after_fence[body_start..];
    let end = body.find("```").unwrap_or(body.len());
    Some(body[..end].trim_matches('\n'))
}

/// Source code from a model reply: the fenced block if present, else the whole reply.
pub fn extract_source(text: &str) -> &str {
    extract_fenced_block(text).unwrap_or(text).trim()
}

/// Return the outermost `{...}` span, tolerating prose and fences around it.
///
/// Braces inside JSON strings are respected.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
