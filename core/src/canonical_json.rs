//! Canonical JSON encoding: object keys sorted lexicographically, no
//! whitespace. The digest protocol (§4.1) depends on every node producing
//! byte-identical output for structurally equal `payload`/`topology` values,
//! which plain `serde_json::to_string` does not guarantee for maps whose
//! insertion order varies.

use serde_json::Value;

/// Renders `value` as canonical JSON: recursively sorts object keys, emits
/// no insignificant whitespace.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by_key(|(k, _)| k.as_str());
            out.push('{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).expect("string keys always serialize"));
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
