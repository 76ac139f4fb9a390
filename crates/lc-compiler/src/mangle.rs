use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Prefix turning `KEYS`/`ARGV` into the script-local `_KEYS`/`_ARGV`.
pub const ALIAS_PREFIX: &str = "_";

/// Rewrites every `KEYS`/`ARGV` reference to its script-local alias.
///
/// Only an occurrence wrapped in quotes on both sides (`'KEYS'`, `"ARGV"`) is
/// left alone. A name sitting inside a longer string literal is still
/// rewritten; callers are expected to keep such literals out of scripts.
pub fn mangle_implicit_vectors(source: &str) -> String {
    let bytes = source.as_bytes();
    implicit_vector_regex()
        .replace_all(source, |captures: &Captures<'_>| {
            let name = &captures[0];
            let quoted = captures
                .get(0)
                .is_some_and(|found| is_quoted(bytes, found.start(), found.end()));
            if quoted {
                name.to_string()
            } else {
                format!("{}{}", ALIAS_PREFIX, name)
            }
        })
        .into_owned()
}

fn implicit_vector_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"KEYS|ARGV").expect("implicit vector regex"))
}

fn is_quote(byte: Option<&u8>) -> bool {
    matches!(byte, Some(b'"') | Some(b'\''))
}

fn is_quoted(bytes: &[u8], start: usize, end: usize) -> bool {
    start > 0 && is_quote(bytes.get(start - 1)) && is_quote(bytes.get(end))
}

#[cfg(test)]
mod mangle_tests {
    use super::*;

    #[test]
    fn bare_references_are_aliased() {
        assert_eq!(
            mangle_implicit_vectors("local passed_keys = KEYS"),
            "local passed_keys = _KEYS"
        );
        assert_eq!(
            mangle_implicit_vectors("local source = KEYS[1]\nlocal arg = ARGV[1]"),
            "local source = _KEYS[1]\nlocal arg = _ARGV[1]"
        );
        assert_eq!(mangle_implicit_vectors("return #ARGV"), "return #_ARGV");
    }

    #[test]
    fn quoted_literals_are_left_alone() {
        assert_eq!(
            mangle_implicit_vectors("local z = redis.call('KEYS', '*')"),
            "local z = redis.call('KEYS', '*')"
        );
        assert_eq!(
            mangle_implicit_vectors(r#"local t = {"ARGV", 'KEYS'}"#),
            r#"local t = {"ARGV", 'KEYS'}"#
        );
    }

    #[test]
    fn names_inside_longer_strings_are_still_mangled() {
        assert_eq!(
            mangle_implicit_vectors("local s = 'this is a string with KEYS and ARGV, oops!'"),
            "local s = 'this is a string with _KEYS and _ARGV, oops!'"
        );
    }

    #[test]
    fn a_quote_on_one_side_only_does_not_protect() {
        assert_eq!(mangle_implicit_vectors("'KEYS:'"), "'_KEYS:'");
        assert_eq!(mangle_implicit_vectors("'x:ARGV'"), "'x:_ARGV'");
    }

    #[test]
    fn embedded_occurrences_are_rewritten_too() {
        assert_eq!(mangle_implicit_vectors("MYKEYS"), "MY_KEYS");
        assert_eq!(mangle_implicit_vectors("KEYSARGV"), "_KEYS_ARGV");
    }

    #[test]
    fn every_match_keeps_its_text_and_neighbours() {
        assert_eq!(
            mangle_implicit_vectors("a'KEYS'b ARGV c\"ARGV\"d KEYS"),
            "a'KEYS'b _ARGV c\"ARGV\"d _KEYS"
        );
    }

    #[test]
    fn text_without_vectors_is_unchanged() {
        let source = "return redis.call('GET', 'x')";
        assert_eq!(mangle_implicit_vectors(source), source);
    }
}
