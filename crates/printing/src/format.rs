//! Plain-text rendering of structured values piped into the printer.

use serde_json::{Deserializer, Map, Value};

const ELLIPSIS: &str = "...";

/// Reads one JSON value, a sequence of values, or JSON Lines.
pub fn parse_json_stream(text: &str) -> Result<Vec<Value>, serde_json::Error> {
    Deserializer::from_str(text).into_iter::<Value>().collect()
}

/// Renders `values` as printable lines, each cut to `width` characters when set.
pub fn render_values(values: &[Value], width: Option<usize>) -> Vec<String> {
    let mut lines = Vec::new();
    for value in values {
        render_value(value, &mut lines);
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    match width {
        Some(width) => lines.into_iter().map(|line| truncate(&line, width)).collect(),
        None => lines,
    }
}

fn render_value(value: &Value, lines: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if lines.last().is_some_and(|line| !line.is_empty()) {
                lines.push(String::new());
            }
            render_object(map, lines);
            lines.push(String::new());
        }
        Value::Array(items) => {
            for item in items {
                render_value(item, lines);
            }
        }
        scalar => lines.push(scalar_text(scalar)),
    }
}

fn render_object(map: &Map<String, Value>, lines: &mut Vec<String>) {
    let key_width = map.keys().map(|key| key.chars().count()).max().unwrap_or(0);
    for (key, value) in map {
        lines.push(format!("{key:<key_width$} : {}", inline_text(value)));
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Nested containers are shown compactly on the property line.
fn inline_text(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(inline_text).collect();
            format!("{{{}}}", parts.join(", "))
        }
        Value::Object(_) => value.to_string(),
        scalar => scalar_text(scalar),
    }
}

fn truncate(line: &str, width: usize) -> String {
    if line.chars().count() <= width {
        return line.to_string();
    }
    if width <= ELLIPSIS.len() {
        return line.chars().take(width).collect();
    }
    let mut cut: String = line.chars().take(width - ELLIPSIS.len()).collect();
    cut.push_str(ELLIPSIS);
    cut
}
