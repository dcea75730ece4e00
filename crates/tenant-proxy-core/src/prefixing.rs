//! The field-prefixing rule shared by the query-DSL walker, the sort
//! walker, and the `_source` walker.

/// `prefix(index, field) = field` if `field` is empty or already starts with
/// `index + "."`; otherwise `index + "." + field`.
///
/// This makes the transform idempotent: re-prefixing an already-prefixed
/// field is a no-op, so `prefix(index, prefix(index, f)) == prefix(index, f)`
/// for all `f`.
pub fn prefix(index: &str, field: &str) -> String {
    if field.is_empty() {
        return String::new();
    }
    let owned_prefix = format!("{index}.");
    if field.starts_with(&owned_prefix) {
        field.to_string()
    } else {
        format!("{index}.{field}")
    }
}
