use serde_json::Value;

/// Entities produced by [`sanitize_text`]. An `&` that already starts one of
/// these is left alone so sanitizing twice gives the same string.
const ESCAPED_ENTITIES: [&str; 5] = ["&lt;", "&gt;", "&#39;", "&quot;", "&amp;"];

/// Escape HTML-significant characters and trim surrounding whitespace.
pub fn sanitize_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            '&' => match ESCAPED_ENTITIES.iter().find(|e| rest.starts_with(**e)) {
                Some(entity) => {
                    out.push_str(entity);
                    rest = &rest[entity.len()..];
                    continue;
                }
                None => out.push_str("&amp;"),
            },
            other => out.push(other),
        }
        rest = &rest[c.len_utf8()..];
    }

    out.trim().to_string()
}

/// Sanitize an optional JSON string field. Empty results collapse to `None`.
pub fn sanitize_field(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => sanitize_text(s),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Coerce a JSON value to a finite number.
/// Numbers pass through, numeric strings are parsed, anything else is `None`.
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
