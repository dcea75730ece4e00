//! Mode Dispatcher and URL Rewriter (§4.4)
//!
//! Picks the physical (write) or alias (read) target name for a given
//! `(base_index, tenant)` pair under the configured mode, and splices it
//! into a post-tenant path or query parameter.

use crate::config::{CompiledConfig, Mode};
use crate::error::Result;

/// The physical index name a write (index/update/mapping/create/delete,
/// and index-scoped passthrough settings calls) targets.
pub fn render_write_target(cfg: &CompiledConfig, base_index: &str, tenant: &str) -> Result<String> {
    match cfg.mode {
        Mode::Shared => cfg.shared_index_name.render(base_index, tenant),
        Mode::IndexPerTenant => cfg.index_per_tenant_template.render(base_index, tenant),
    }
}

/// The target a read (search, count, msearch, synthesised get/mget/source,
/// update/delete-by-query) addresses. In shared mode this is the
/// tenant-filtered alias; index-per-tenant mode has only one physical name
/// per tenant, so reads and writes share the same template.
pub fn render_read_target(cfg: &CompiledConfig, base_index: &str, tenant: &str) -> Result<String> {
    match cfg.mode {
        Mode::Shared => cfg.shared_alias.render(base_index, tenant),
        Mode::IndexPerTenant => cfg.index_per_tenant_template.render(base_index, tenant),
    }
}

/// Replace the first path segment with `target`, preserving everything
/// after it (`_search`, `_doc/1`, ...). Used for every index-scoped
/// endpoint; root endpoints rewrite a query parameter instead.
pub fn rewrite_first_segment(path: &str, target: &str) -> String {
    let rest = path.trim_start_matches('/').splitn(2, '/').nth(1);
    match rest {
        Some(rest) => format!("/{target}/{rest}"),
        None => format!("/{target}"),
    }
}
