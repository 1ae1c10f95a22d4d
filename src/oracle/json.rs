//! Pull structured data out of free-form model replies.

use serde::de::DeserializeOwned;

/// The first balanced `{...}` or `[...]` block in `text`, whichever opens first.
/// Brackets inside JSON strings are ignored.
pub fn first_block(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the first JSON block of `text` as `T`. `None` on any failure.
pub fn parse_first<T: DeserializeOwned>(text: &str) -> Option<T> {
    let block = first_block(text)?;
    match serde_json::from_str(block) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "oracle reply block did not parse");
            None
        }
    }
}
