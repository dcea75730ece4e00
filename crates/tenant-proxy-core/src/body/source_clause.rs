//! `_source` walker (§4.5b)

use serde_json::{Map, Value};

use crate::prefixing::prefix;

/// Accepts an array (prefix each string element, preserve non-strings), an
/// object with `includes`/`excludes` (each walked as an array), or any other
/// JSON value (preserved). This also covers the `_source` request-body
/// clause and the `_source` query-parameter equivalent once parsed into a
/// [`Value`].
pub fn prefix_source_clause(base_index: &str, value: Value) -> Value {
    match value {
        Value::Array(items) => prefix_string_array(base_index, items),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, v) in map {
                match key.as_str() {
                    "includes" | "excludes" => {
                        out.insert(key, prefix_source_clause(base_index, v));
                    }
                    _ => {
                        out.insert(key, v);
                    }
                }
            }
            Value::Object(out)
        }
        other => other,
    }
}

fn prefix_string_array(base_index: &str, items: Vec<Value>) -> Value {
    Value::Array(
        items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Value::String(prefix(base_index, &s)),
                other => other,
            })
            .collect(),
    )
}
