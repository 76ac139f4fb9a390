//! Source-to-source pass that gives Lua scripts a cross-script calling
//! convention on top of Redis' `EVALSHA`.
//!
//! The pass is purely lexical: `KEYS`/`ARGV` are renamed, `CALL.<name>(...)`
//! lines become registry lookups, and a dispatch header is prepended. The
//! content identity is taken over the final text.

mod call_rewrite;
mod digest;
mod header;
mod mangle;

pub use call_rewrite::{
    resolve_call_target, rewrite_call_sites, CallSite, RewrittenCalls, CALL_MARKER,
};
pub use digest::content_identity;
pub use header::{inject_dispatch_header, DISPATCH_HEADER};
pub use mangle::{mangle_implicit_vectors, ALIAS_PREFIX};

use lc_core::{validate_namespace, ContentIdentity, LuaCallError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedScript {
    pub source: String,
    pub identity: ContentIdentity,
    pub call_sites: Vec<CallSite>,
}

impl TransformedScript {
    /// Qualified names this script calls, in source order, without duplicates.
    pub fn call_targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for site in &self.call_sites {
            if !targets.contains(&site.qualified_name.as_str()) {
                targets.push(site.qualified_name.as_str());
            }
        }
        targets
    }
}

/// Runs the full pass over `source`, resolving bare call targets in `namespace`.
pub fn transform_script(source: &str, namespace: &str) -> Result<TransformedScript, LuaCallError> {
    validate_namespace(namespace)?;

    let mangled = mangle_implicit_vectors(source);
    let RewrittenCalls { source, call_sites } = rewrite_call_sites(&mangled, namespace);
    let source = inject_dispatch_header(&source);
    let identity = content_identity(&source);

    Ok(TransformedScript {
        source,
        identity,
        call_sites,
    })
}
