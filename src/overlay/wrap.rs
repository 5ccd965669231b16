use crate::foundation::error::AdreelResult;

/// Greedy word wrap.
///
/// Words are accumulated onto the current line while `measure(line)` stays within
/// `max_width`; otherwise a new line starts. A word wider than `max_width` is placed alone
/// on its own line and never split or truncated. Runs of whitespace collapse to one space.
pub fn wrap_words<F>(text: &str, max_width: f32, mut measure: F) -> AdreelResult<Vec<String>>
where
    F: FnMut(&str) -> AdreelResult<f32>,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if measure(&candidate)? <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/wrap.rs"]
mod tests;
