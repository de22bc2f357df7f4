//! Tool calls written as text, for models that do not emit structured calls:
//!
//! ```text
//! <tool_call>
//! {"name": "read_records", "arguments": {}}
//! </tool_call>
//! ```

use crate::traits::ToolCall;
use serde_json::Value;

pub const TOOL_CALL_OPEN: &str = "<tool_call>";
pub const TOOL_CALL_CLOSE: &str = "</tool_call>";

/// Splits `response` into its prose and the tool calls found in
/// `<tool_call>` blocks. Malformed blocks are dropped; an unterminated block
/// is left in the prose.
pub fn parse_tool_calls(response: &str) -> (String, Vec<ToolCall>) {
    let mut text_parts = Vec::new();
    let mut calls = Vec::new();
    let mut remaining = response;

    while let Some(start) = remaining.find(TOOL_CALL_OPEN) {
        let after_open = &remaining[start + TOOL_CALL_OPEN.len()..];
        let Some(close_idx) = after_open.find(TOOL_CALL_CLOSE) else {
            break;
        };

        let before = remaining[..start].trim();
        if !before.is_empty() {
            text_parts.push(before.to_string());
        }

        for value in extract_json_values(&after_open[..close_idx]) {
            if let Some(call) = parse_tool_call_value(&value, calls.len()) {
                calls.push(call);
            }
        }

        remaining = &after_open[close_idx + TOOL_CALL_CLOSE.len()..];
    }

    let rest = remaining.trim();
    if !rest.is_empty() {
        text_parts.push(rest.to_string());
    }

    (text_parts.join("\n"), calls)
}

fn extract_json_values(text: &str) -> Vec<Value> {
    let mut values = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0
                    && let Some(s) = start.take()
                    && let Ok(value) = serde_json::from_str::<Value>(&text[s..=i])
                {
                    values.push(value);
                }
            }
            _ => {}
        }
    }

    values
}

fn parse_tool_call_value(value: &Value, index: usize) -> Option<ToolCall> {
    let name = value.get("name")?.as_str()?.to_string();
    let arguments = match value.get("arguments") {
        Some(Value::String(raw)) => serde_json::from_str(raw).ok()?,
        Some(args) => args.clone(),
        None => Value::Object(Default::default()),
    };

    let digest = md5::compute(format!("{}:{}:{}", index, name, arguments).as_bytes());

    Some(ToolCall {
        id: format!("call_{:x}", digest),
        name,
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_calls_and_prose() {
        let response = "Let me check.\n<tool_call>\n{\"name\": \"read_records\", \"arguments\": {}}\n</tool_call>";
        let (text, calls) = parse_tool_calls(response);

        assert_eq!(text, "Let me check.");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "read_records");
        assert_eq!(calls[0].arguments, json!({}));
        assert!(calls[0].id.starts_with("call_"));
    }

    #[test]
    fn keeps_order_across_blocks() {
        let response = concat!(
            "<tool_call>{\"name\":\"read_records\",\"arguments\":{}}</tool_call>",
            "<tool_call>{\"name\":\"write_records\",\"arguments\":{\"content\":\"a, 1, b {x}\"}}</tool_call>"
        );
        let (text, calls) = parse_tool_calls(response);

        assert!(text.is_empty());
        let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["read_records", "write_records"]);
        assert_eq!(calls[1].arguments["content"], "a, 1, b {x}");
        assert_ne!(calls[0].id, calls[1].id);
    }

    #[test]
    fn accepts_stringified_arguments() {
        let response =
            r#"<tool_call>{"name":"append_note","arguments":"{\"content\":\"hi\"}"}</tool_call>"#;
        let (_, calls) = parse_tool_calls(response);
        assert_eq!(calls[0].arguments, json!({"content": "hi"}));
    }

    #[test]
    fn ignores_malformed_and_unterminated_blocks() {
        let (_, calls) = parse_tool_calls("<tool_call>{not json}</tool_call>");
        assert!(calls.is_empty());

        let (text, calls) = parse_tool_calls("Done. <tool_call>{\"name\":\"x\"");
        assert!(calls.is_empty());
        assert_eq!(text, "Done. <tool_call>{\"name\":\"x\"");
    }

    #[test]
    fn plain_text_has_no_calls() {
        let (text, calls) = parse_tool_calls("All records already have comments.");
        assert_eq!(text, "All records already have comments.");
        assert!(calls.is_empty());
    }
}
