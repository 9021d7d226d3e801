/// Truncate to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 3 {
        return s.chars().take(max).collect();
    }
    let kept: String = s.chars().take(max - 3).collect();
    format!("{}...", kept)
}

/// Extract source code from a provider response.
///
/// Grammar:
/// 1. The first ``` fence wins. Anything after the opening backticks up to the
///    end of that line is a language tag and is dropped. The block ends at the
///    next ``` or at the end of the response when the fence is never closed.
/// 2. A fence opened and closed on the same line yields the text between them.
/// 3. Without a fence the whole response, trimmed, is the code.
///
/// Returns `None` when nothing but whitespace remains.
pub fn extract_code_block(response: &str) -> Option<&str> {
    let code = match response.find("```") {
        Some(start) => {
            let after = &response[start + 3..];
            match after.find('\n') {
                Some(newline) if !after[..newline].contains("```") => {
                    let body = &after[newline + 1..];
                    let end = body.find("```").unwrap_or(body.len());
                    body[..end]
                        .trim_start_matches(|c| c == '\n' || c == '\r')
                        .trim_end()
                }
                _ => {
                    let end = after.find("```").unwrap_or(after.len());
                    after[..end].trim()
                }
            }
        }
        None => response.trim(),
    };

    (!code.trim().is_empty()).then_some(code)
}

/// Slice from the first `{` to the last `}`; tools often print banners around their JSON.
pub fn json_object_slice(output: &str) -> Option<&str> {
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    (start <= end).then(|| &output[start..=end])
}
