//! Tenant Proxy Core
//!
//! The transport-independent request/response rewriting engine for the
//! multi-tenant search proxy: path classification, tenant extraction, body
//! rewriting for every supported Elasticsearch-shaped API, and the mode
//! dispatcher that picks physical index names from the configured tenancy
//! model.
//!
//! This crate has no knowledge of HTTP transport, sockets, or async
//! runtimes — it is pure, synchronous, and fully testable in isolation. The
//! server crate is the thin boundary adapter that feeds it real requests.

pub mod body;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod http;
pub mod passthrough;
pub mod prefixing;
pub mod request;
pub mod response;
pub mod router;
pub mod rewrite;
pub mod template;

pub use config::{CompiledConfig, Config, Mode};
pub use error::{Result, RewriteError};
pub use http::Method;
pub use request::{Request, RewriteOutcome};
pub use rewrite::rewrite_request;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{CompiledConfig, Config, Mode};
    pub use crate::error::{Result, RewriteError};
    pub use crate::http::Method;
    pub use crate::request::{Request, RewriteOutcome};
    pub use crate::rewrite::rewrite_request;
}
