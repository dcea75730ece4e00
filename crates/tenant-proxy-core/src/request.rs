//! The request/outcome boundary types exchanged with the transport adapter.

use std::collections::BTreeMap;

use crate::http::Method;

/// A raw inbound request as handed to the core by the boundary adapter.
/// Headers are not modelled here: the adapter owns header forwarding and
/// appends the tenant header itself once the core returns a tenant value.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// The result of classifying and rewriting one request, ready for the
/// transport adapter to forward upstream.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub method: Method,
    /// Empty for passthrough requests, which carry no tenant identity.
    pub tenant: String,
    /// True for passthrough requests: the adapter must forward byte-for-byte
    /// and must not append the tenant header.
    pub passthrough: bool,
    /// True for `CatIndices`: the adapter must run the response rewriter on
    /// the upstream reply before returning it to the client.
    pub response_rewrite_required: bool,
}
