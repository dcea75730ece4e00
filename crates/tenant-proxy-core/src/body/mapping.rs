//! Mapping and document-body wrapping for index-per-tenant mode (§4.4)

use serde_json::{Map, Value};

/// Wrap a mapping body's `properties` object under `base_index`, preserving
/// either a top-level `mappings.properties` or a bare top-level `properties`
/// shape.
pub fn wrap_mapping(base_index: &str, body: Value) -> Value {
    let Value::Object(mut map) = body else {
        return body;
    };

    if let Some(mappings) = map.remove("mappings") {
        let wrapped = wrap_properties_holder(base_index, mappings);
        map.insert("mappings".to_string(), wrapped);
        return Value::Object(map);
    }

    wrap_properties_holder(base_index, Value::Object(map))
}

fn wrap_properties_holder(base_index: &str, holder: Value) -> Value {
    let Value::Object(mut map) = holder else {
        return holder;
    };
    if let Some(properties) = map.remove("properties") {
        let mut inner = Map::with_capacity(1);
        inner.insert("properties".to_string(), properties);
        let mut wrapper = Map::with_capacity(1);
        wrapper.insert(base_index.to_string(), Value::Object(inner));
        map.insert("properties".to_string(), Value::Object(wrapper));
    }
    Value::Object(map)
}

/// Wrap a whole document body under `base_index`: `{...} -> {base_index: {...}}`.
pub fn wrap_document(base_index: &str, doc: Value) -> Value {
    let mut wrapper = Map::with_capacity(1);
    wrapper.insert(base_index.to_string(), doc);
    Value::Object(wrapper)
}

/// Shared mode's Index body rewrite: inject `tenant_field` at the top level
/// of the document.
pub fn inject_tenant_field(body: Value, tenant_field: &str, tenant: &str) -> Value {
    match body {
        Value::Object(mut map) => {
            map.insert(tenant_field.to_string(), Value::String(tenant.to_string()));
            Value::Object(map)
        }
        other => other,
    }
}

/// Shared mode's Update body rewrite: inject `tenant_field` into `doc` and
/// `upsert`, not at the top level (those are the only sub-objects that
/// become or touch a document).
pub fn inject_tenant_field_into_update(body: Value, tenant_field: &str, tenant: &str) -> Value {
    let Value::Object(mut map) = body else {
        return body;
    };
    if let Some(doc) = map.remove("doc") {
        map.insert("doc".to_string(), inject_tenant_field(doc, tenant_field, tenant));
    }
    if let Some(upsert) = map.remove("upsert") {
        map.insert("upsert".to_string(), inject_tenant_field(upsert, tenant_field, tenant));
    }
    Value::Object(map)
}

/// Apply the document wrap to an Update body's `doc`/`upsert` fields, and
/// rewrite any `script.source` string's `"ctx._source."` references to
/// `"ctx._source.<base_index>."`.
pub fn wrap_update_body(base_index: &str, body: Value) -> Value {
    let Value::Object(mut map) = body else {
        return body;
    };

    if let Some(doc) = map.remove("doc") {
        map.insert("doc".to_string(), wrap_document(base_index, doc));
    }
    if let Some(upsert) = map.remove("upsert") {
        map.insert("upsert".to_string(), wrap_document(base_index, upsert));
    }
    if let Some(script) = map.remove("script") {
        map.insert("script".to_string(), rewrite_script(base_index, script));
    }

    Value::Object(map)
}

fn rewrite_script(base_index: &str, script: Value) -> Value {
    match script {
        Value::Object(mut map) => {
            if let Some(Value::String(source)) = map.remove("source") {
                let needle = "ctx._source.";
                let replacement = format!("ctx._source.{base_index}.");
                map.insert("source".to_string(), Value::String(source.replace(needle, &replacement)));
            }
            Value::Object(map)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wraps_properties_under_mappings() {
        let body = json!({"mappings": {"properties": {"name": {"type": "text"}}}});
        let out = wrap_mapping("orders", body);
        assert_eq!(
            out,
            json!({"mappings": {"properties": {"orders": {"properties": {"name": {"type": "text"}}}}}})
        );
    }

    #[test]
    fn wraps_top_level_properties() {
        let body = json!({"properties": {"name": {"type": "text"}}});
        let out = wrap_mapping("orders", body);
        assert_eq!(
            out,
            json!({"properties": {"orders": {"properties": {"name": {"type": "text"}}}}})
        );
    }

    #[test]
    fn wraps_document_body() {
        let body = json!({"name": "widget"});
        assert_eq!(wrap_document("orders", body), json!({"orders": {"name": "widget"}}));
    }

    #[test]
    fn injects_tenant_field_at_top_level() {
        let body = json!({"name": "widget"});
        let out = inject_tenant_field(body, "tenant_id", "tenant1");
        assert_eq!(out, json!({"name": "widget", "tenant_id": "tenant1"}));
    }

    #[test]
    fn injects_tenant_field_into_update_doc_and_upsert() {
        let body = json!({"doc": {"name": "widget"}, "upsert": {"name": "new"}});
        let out = inject_tenant_field_into_update(body, "tenant_id", "tenant1");
        assert_eq!(
            out,
            json!({
                "doc": {"name": "widget", "tenant_id": "tenant1"},
                "upsert": {"name": "new", "tenant_id": "tenant1"}
            })
        );
    }

    #[test]
    fn wraps_update_doc_and_upsert() {
        let body = json!({"doc": {"name": "widget"}, "upsert": {"name": "new"}});
        let out = wrap_update_body("orders", body);
        assert_eq!(
            out,
            json!({"doc": {"orders": {"name": "widget"}}, "upsert": {"orders": {"name": "new"}}})
        );
    }

    #[test]
    fn rewrites_script_source_references() {
        let body = json!({"script": {"source": "ctx._source.counter += 1", "lang": "painless"}});
        let out = wrap_update_body("orders", body);
        assert_eq!(
            out["script"]["source"],
            "ctx._source.orders.counter += 1"
        );
        assert_eq!(out["script"]["lang"], "painless");
    }
}
