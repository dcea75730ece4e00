//! Two-placeholder index/alias name templates
//!
//! A full templating language is not required: every template in this
//! system only ever needs to substitute `{index}` and `{tenant}`. Implemented
//! as a plain string scan rather than pulling in a template engine crate.

use crate::error::{Result, RewriteError};

/// A compiled template with placeholders `{index}` and `{tenant}`.
///
/// Compilation here just means owning the pattern string; substitution is a
/// literal string replacement, not an expression language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pattern: String,
}

impl Template {
    /// Build a template from a raw pattern string.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Render the template for a given `(base_index, tenant)` pair.
    ///
    /// Returns [`RewriteError::Template`] if the rendered result is empty.
    pub fn render(&self, base_index: &str, tenant: &str) -> Result<String> {
        let rendered = self
            .pattern
            .replace("{index}", base_index)
            .replace("{tenant}", tenant);

        if rendered.is_empty() {
            return Err(RewriteError::template(format!(
                "template '{}' rendered to an empty string for index='{}' tenant='{}'",
                self.pattern, base_index, tenant
            )));
        }

        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_both_placeholders() {
        let t = Template::new("{index}-{tenant}");
        assert_eq!(t.render("orders", "tenant2").unwrap(), "orders-tenant2");
    }

    #[test]
    fn renders_literal_template_unchanged() {
        let t = Template::new("shared-index");
        assert_eq!(t.render("orders", "tenant2").unwrap(), "shared-index");
    }

    #[test]
    fn empty_render_is_an_error() {
        let t = Template::new("");
        assert!(matches!(
            t.render("orders", "tenant2"),
            Err(RewriteError::Template(_))
        ));
    }

    #[test]
    fn repeated_placeholders_all_substituted() {
        let t = Template::new("{tenant}-{index}-{tenant}");
        assert_eq!(
            t.render("orders", "t1").unwrap(),
            "t1-orders-t1"
        );
    }
}
