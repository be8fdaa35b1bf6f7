//! Shared utility functions.

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
///
/// Returns a sub-slice of the original string. If the string is shorter than
/// `max_bytes`, the entire string is returned unchanged.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Extract the first JSON value embedded in a model response.
///
/// Tries, in order:
/// 1. A fenced ` ```json ` block
/// 2. The whole response
/// 3. The widest `{ ... }` span
/// 4. The widest `[ ... ]` span
pub fn extract_json(response: &str) -> Option<serde_json::Value> {
    let mut in_block = false;
    let mut block = String::new();
    for line in response.lines() {
        let trimmed = line.trim();
        if !in_block && (trimmed == "```json" || trimmed == "```JSON") {
            in_block = true;
            block.clear();
        } else if in_block && trimmed == "```" {
            if let Ok(value) = serde_json::from_str(&block) {
                return Some(value);
            }
            in_block = false;
        } else if in_block {
            block.push_str(line);
            block.push('\n');
        }
    }

    if let Ok(value) = serde_json::from_str(response.trim()) {
        return Some(value);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(start) = response.find(open)
            && let Some(end) = response.rfind(close)
            && end > start
            && let Ok(value) = serde_json::from_str(&response[start..=end])
        {
            return Some(value);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_ascii() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn truncate_multibyte_boundary() {
        let s = "äöü"; // 2 bytes each
        assert_eq!(truncate_str(s, 3), "ä");
        assert_eq!(truncate_str(s, 4), "äö");
    }

    #[test]
    fn extract_fenced_json() {
        let response = "Here you go:\n```json\n{\"score\": 8}\n```\nThanks";
        let value = extract_json(response).unwrap();
        assert_eq!(value["score"], 8);
    }

    #[test]
    fn extract_raw_json() {
        let value = extract_json(r#"{"primary": "EXPLAIN"}"#).unwrap();
        assert_eq!(value["primary"], "EXPLAIN");
    }

    #[test]
    fn extract_embedded_object() {
        let value = extract_json(r#"My verdict: {"score": 3, "issues": []} done"#).unwrap();
        assert_eq!(value["score"], 3);
    }

    #[test]
    fn extract_embedded_array() {
        let value = extract_json(r#"Sub-questions: ["a?", "b?"]"#).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn extract_nothing() {
        assert!(extract_json("no json here").is_none());
        assert!(extract_json("").is_none());
    }
}
