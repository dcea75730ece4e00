//! Sort walker (§4.5a)

use serde_json::{Map, Value};

use crate::prefixing::prefix;

/// Accepts an array whose elements may be strings (prefixed), objects (each
/// key prefixed, value walked), or scalars (preserved). A non-array `sort`
/// value is returned verbatim.
pub fn prefix_sort(base_index: &str, value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| prefix_sort_entry(base_index, item))
                .collect(),
        ),
        other => other,
    }
}

fn prefix_sort_entry(base_index: &str, value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(prefix(base_index, &s)),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, v) in map {
                out.insert(prefix(base_index, &key), super::query_dsl::prefix_query_body(base_index, v));
            }
            Value::Object(out)
        }
        scalar => scalar,
    }
}
