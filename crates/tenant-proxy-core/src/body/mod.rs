//! Body rewriting (§4.4, §4.5, §4.6): the per-action transforms applied to
//! request and response bodies once the router has classified a request.

pub mod bulk;
pub mod mapping;
pub mod msearch;
pub mod query_dsl;
pub mod sort;
pub mod source_clause;
pub mod synth;
pub mod transform;
