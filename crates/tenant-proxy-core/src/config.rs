//! Immutable configuration for the tenant rewriting engine
//!
//! This module owns the data shapes and the startup-time validation rules
//! described in the external interfaces. Loading these values from a YAML
//! file and environment overrides is an ambient, I/O-performing concern left
//! to the server binary crate (mirroring how the teacher proxy separates
//! `ProxyConfig` data from `ProxyConfig::load`'s file IO).

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RewriteError, Result};
use crate::template::Template;

/// The tenancy strategy the dispatcher selects between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// One physical index (or one per base-index) shared by all tenants,
    /// isolated at read time by a tenant-filtered alias.
    Shared,
    /// One physical index per `(base_index, tenant)` pair.
    IndexPerTenant,
}

/// Raw configuration values as they appear in the config file, before
/// compilation of the regex and templates into [`CompiledConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub upstream_url: String,
    pub mode: Mode,
    pub tenant_regex: String,
    #[serde(default)]
    pub passthrough_paths: Vec<String>,
    pub shared_index: SharedIndexConfig,
    pub index_per_tenant: IndexPerTenantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedIndexConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alias_template: String,
    #[serde(default = "default_tenant_field")]
    pub tenant_field: String,
    #[serde(default)]
    pub deny_patterns: Vec<String>,
}

fn default_tenant_field() -> String {
    "tenant_id".to_string()
}

impl Default for SharedIndexConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            alias_template: String::new(),
            tenant_field: default_tenant_field(),
            deny_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexPerTenantConfig {
    #[serde(default)]
    pub index_template: String,
}

/// [`Config`] after regex/template compilation; this is what the rewriting
/// engine actually operates on, and it is what callers share via `Arc` across
/// request tasks.
pub struct CompiledConfig {
    pub upstream_url: String,
    pub mode: Mode,
    pub tenant_regex: Regex,
    pub passthrough_paths: Vec<String>,
    pub shared_index_name: Template,
    pub shared_alias: Template,
    pub shared_tenant_field: String,
    pub shared_deny_patterns: Vec<Regex>,
    pub index_per_tenant_template: Template,
}

impl Config {
    /// Compile and validate this config, enforcing every rule in the
    /// external-interfaces validation table: the tenant regex must compile,
    /// contain all three named groups, and forbid nested quantifiers; the
    /// template required by the selected mode must be non-empty; deny
    /// patterns must compile.
    pub fn compile(&self) -> Result<CompiledConfig> {
        let tenant_regex = Regex::new(&self.tenant_regex).map_err(|e| {
            RewriteError::Config(format!("invalid tenant_regex '{}': {}", self.tenant_regex, e))
        })?;

        for group in ["prefix", "tenant", "postfix"] {
            if tenant_regex.capture_names().flatten().all(|n| n != group) {
                return Err(RewriteError::Config(format!(
                    "tenant_regex is missing required named group '{}'",
                    group
                )));
            }
        }

        reject_nested_quantifiers(&self.tenant_regex)?;

        match self.mode {
            Mode::Shared => {
                if self.shared_index.name.is_empty() {
                    return Err(RewriteError::Config(
                        "shared_index.name must be non-empty in shared mode".to_string(),
                    ));
                }
                if self.shared_index.alias_template.is_empty() {
                    return Err(RewriteError::Config(
                        "shared_index.alias_template must be non-empty in shared mode"
                            .to_string(),
                    ));
                }
            }
            Mode::IndexPerTenant => {
                if self.index_per_tenant.index_template.is_empty() {
                    return Err(RewriteError::Config(
                        "index_per_tenant.index_template must be non-empty in index-per-tenant mode"
                            .to_string(),
                    ));
                }
            }
        }

        let shared_deny_patterns = self
            .shared_index
            .deny_patterns
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| RewriteError::Config(format!("invalid deny_pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledConfig {
            upstream_url: self.upstream_url.clone(),
            mode: self.mode,
            tenant_regex,
            passthrough_paths: self.passthrough_paths.clone(),
            shared_index_name: Template::new(self.shared_index.name.clone()),
            shared_alias: Template::new(self.shared_index.alias_template.clone()),
            shared_tenant_field: self.shared_index.tenant_field.clone(),
            shared_deny_patterns,
            index_per_tenant_template: Template::new(self.index_per_tenant.index_template.clone()),
        })
    }
}

/// A simple AST walk over the parsed regex pattern that forbids nested
/// quantifiers (e.g. `(a+)+`), which are a classic catastrophic-backtracking
/// vector when the pattern is applied to adversarial, attacker-controlled
/// URL paths.
fn reject_nested_quantifiers(pattern: &str) -> Result<()> {
    use regex_syntax::hir::{Hir, HirKind};
    use regex_syntax::Parser;

    let hir = Parser::new()
        .parse(pattern)
        .map_err(|e| RewriteError::Config(format!("failed to parse tenant_regex: {}", e)))?;

    fn walk(hir: &Hir, inside_repetition: bool) -> bool {
        match hir.kind() {
            HirKind::Repetition(rep) => {
                if inside_repetition {
                    return true;
                }
                walk(&rep.sub, true)
            }
            HirKind::Capture(cap) => walk(&cap.sub, inside_repetition),
            HirKind::Concat(subs) | HirKind::Alternation(subs) => {
                subs.iter().any(|s| walk(s, inside_repetition))
            }
            _ => false,
        }
    }

    if walk(&hir, false) {
        return Err(RewriteError::Config(format!(
            "tenant_regex '{}' contains nested quantifiers, which risks catastrophic backtracking",
            pattern
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            upstream_url: "https://search.internal:9200".to_string(),
            mode: Mode::Shared,
            tenant_regex: "^(?P<prefix>[^-]+)-(?P<tenant>[^-]+)(?P<postfix>.*)$".to_string(),
            passthrough_paths: vec!["/_healthz".to_string()],
            shared_index: SharedIndexConfig {
                name: "shared-index".to_string(),
                alias_template: "{index}-{tenant}".to_string(),
                tenant_field: "tenant_id".to_string(),
                deny_patterns: vec!["^shared-index$".to_string()],
            },
            index_per_tenant: IndexPerTenantConfig::default(),
        }
    }

    #[test]
    fn compiles_valid_shared_config() {
        assert!(base_config().compile().is_ok());
    }

    #[test]
    fn rejects_missing_named_group() {
        let mut cfg = base_config();
        cfg.tenant_regex = "^(?P<prefix>[^-]+)-(?P<tenant>[^-]+)$".to_string();
        assert!(matches!(cfg.compile(), Err(RewriteError::Config(_))));
    }

    #[test]
    fn rejects_nested_quantifiers() {
        let mut cfg = base_config();
        cfg.tenant_regex =
            "^(?P<prefix>(a+)+)-(?P<tenant>[^-]+)(?P<postfix>.*)$".to_string();
        assert!(matches!(cfg.compile(), Err(RewriteError::Config(_))));
    }

    #[test]
    fn rejects_empty_shared_templates() {
        let mut cfg = base_config();
        cfg.shared_index.alias_template = String::new();
        assert!(matches!(cfg.compile(), Err(RewriteError::Config(_))));
    }

    #[test]
    fn rejects_invalid_deny_pattern() {
        let mut cfg = base_config();
        cfg.shared_index.deny_patterns = vec!["(unclosed".to_string()];
        assert!(matches!(cfg.compile(), Err(RewriteError::Config(_))));
    }

    #[test]
    fn index_per_tenant_requires_its_own_template() {
        let mut cfg = base_config();
        cfg.mode = Mode::IndexPerTenant;
        assert!(matches!(cfg.compile(), Err(RewriteError::Config(_))));
        cfg.index_per_tenant.index_template = "{index}-{tenant}".to_string();
        assert!(cfg.compile().is_ok());
    }
}
