use std::sync::OnceLock;

use lc_core::{qualify, NAME_SEPARATOR, REGISTRY_KEY};
use regex::{Captures, Regex};

/// Marker that introduces a cross-script call: `CALL.<name>(<keys>, <argv>)`.
pub const CALL_MARKER: &str = "CALL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// 1-based line of the marker in the text handed to the rewriter.
    pub line: usize,
    pub target: String,
    pub qualified_name: String,
    pub args: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenCalls {
    pub source: String,
    pub call_sites: Vec<CallSite>,
}

/// Replaces every single-line call marker with the dispatch code that pushes
/// `{keys, argv}` onto `ARGV` and jumps to the target through `:registry`.
///
/// A marker spanning several lines, or whose arguments contain parentheses,
/// does not match and is kept verbatim.
pub fn rewrite_call_sites(source: &str, namespace: &str) -> RewrittenCalls {
    let mut call_sites = Vec::new();
    let rewritten = call_site_regex()
        .replace_all(source, |captures: &Captures<'_>| {
            let start = captures.get(0).map(|m| m.start()).unwrap_or_default();
            let prefix = &captures[1];
            let target = &captures[2];
            let args = &captures[3];
            let qualified_name = resolve_call_target(target, namespace);
            let replacement = render_call(prefix, args, &qualified_name);
            call_sites.push(CallSite {
                line: line_of(source, start),
                target: target.to_string(),
                qualified_name,
                args: args.to_string(),
            });
            replacement
        })
        .into_owned();

    RewrittenCalls {
        source: rewritten,
        call_sites,
    }
}

/// Dotted targets are already qualified; bare names live in the caller's namespace.
pub fn resolve_call_target(target: &str, namespace: &str) -> String {
    if target.contains(NAME_SEPARATOR) {
        target.to_string()
    } else {
        qualify(namespace, target)
    }
}

fn render_call(prefix: &str, args: &str, qualified_name: &str) -> String {
    format!(
        "table.insert(ARGV, {{{}}});{}_G[redis.call('HGET', '{}', '{}')]();",
        args, prefix, REGISTRY_KEY, qualified_name
    )
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

fn call_site_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(&format!(
            r"(?m)^(.*?){}\.([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\(([^()\n]+)\)[ \t\r]*$",
            CALL_MARKER
        ))
        .expect("call site regex")
    })
}

#[cfg(test)]
mod call_rewrite_tests {
    use super::*;

    #[test]
    fn bare_target_is_qualified_with_namespace() {
        let rewritten = rewrite_call_sites("return CALL.return_args({}, {1, 2, 3})", "app");
        assert_eq!(
            rewritten.source,
            "table.insert(ARGV, {{}, {1, 2, 3}});return _G[redis.call('HGET', ':registry', 'app.return_args')]();"
        );
        assert_eq!(
            rewritten.call_sites,
            vec![CallSite {
                line: 1,
                target: "return_args".to_string(),
                qualified_name: "app.return_args".to_string(),
                args: "{}, {1, 2, 3}".to_string(),
            }]
        );
    }

    #[test]
    fn empty_namespace_leaves_bare_target() {
        let rewritten = rewrite_call_sites("CALL.ping({}, {})", "");
        assert_eq!(
            rewritten.source,
            "table.insert(ARGV, {{}, {}});_G[redis.call('HGET', ':registry', 'ping')]();"
        );
    }

    #[test]
    fn dotted_target_is_used_as_is() {
        let rewritten = rewrite_call_sites("local x = CALL.other.mod.fn(_KEYS, {})", "app");
        assert_eq!(
            rewritten.source,
            "table.insert(ARGV, {_KEYS, {}});local x = _G[redis.call('HGET', ':registry', 'other.mod.fn')]();"
        );
        assert_eq!(rewritten.call_sites[0].qualified_name, "other.mod.fn");
    }

    #[test]
    fn only_matching_lines_change_and_lines_are_counted() {
        let source = "local a = 1\n  CALL.step({}, {a})  \nreturn a\n";
        let rewritten = rewrite_call_sites(source, "jobs");
        assert_eq!(
            rewritten.source,
            "local a = 1\ntable.insert(ARGV, {{}, {a}});  _G[redis.call('HGET', ':registry', 'jobs.step')]();\nreturn a\n"
        );
        assert_eq!(rewritten.call_sites[0].line, 2);
    }

    #[test]
    fn nested_parentheses_pass_through() {
        let source = "return CALL.f({}, {tostring(1)})";
        let rewritten = rewrite_call_sites(source, "app");
        assert_eq!(rewritten.source, source);
        assert!(rewritten.call_sites.is_empty());
    }

    #[test]
    fn multi_line_call_passes_through() {
        let source = "return CALL.f({},\n  {1, 2})\n";
        let rewritten = rewrite_call_sites(source, "app");
        assert_eq!(rewritten.source, source);
        assert!(rewritten.call_sites.is_empty());
    }

    #[test]
    fn trailing_code_after_call_passes_through() {
        let source = "local x = CALL.f({}, {}) + 1";
        assert_eq!(rewrite_call_sites(source, "app").source, source);
    }

    #[test]
    fn every_call_line_is_rewritten() {
        let source = "CALL.a({}, {})\r\nCALL.b({}, {})";
        let rewritten = rewrite_call_sites(source, "");
        let targets = rewritten
            .call_sites
            .iter()
            .map(|site| site.qualified_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(targets, vec!["a", "b"]);
        assert_eq!(rewritten.call_sites[1].line, 2);
    }
}
