use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LuaCallError;

/// Separator between the segments of a qualified script name.
pub const NAME_SEPARATOR: char = '.';

/// Hash key holding the qualified name -> content identity mapping in the store.
pub const REGISTRY_KEY: &str = ":registry";

/// Redis compiles every loaded script into a global function named `f_<sha1>`.
pub const IDENTITY_PREFIX: &str = "f_";

/// Only built through `from_digest` or `parse`, so the prefix is always present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ContentIdentity(String);

impl ContentIdentity {
    pub fn from_digest(hex_digest: impl AsRef<str>) -> Self {
        Self(format!("{}{}", IDENTITY_PREFIX, hex_digest.as_ref()))
    }

    pub fn parse(token: &str) -> Option<Self> {
        let digest = token.strip_prefix(IDENTITY_PREFIX)?;
        if digest.is_empty() || !digest.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(token.to_string()))
    }

    /// Digest accepted by `EVALSHA` and returned by `SCRIPT LOAD`.
    pub fn sha(&self) -> &str {
        self.0.strip_prefix(IDENTITY_PREFIX).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrationState {
    Pending,
    Published,
}

pub fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Joins a namespace and a name; an empty namespace leaves the name untouched.
pub fn qualify(namespace: &str, name: &str) -> String {
    let joined = format!("{}{}{}", namespace, NAME_SEPARATOR, name);
    joined.trim_start_matches(NAME_SEPARATOR).to_string()
}

pub fn validate_leaf_name(name: &str) -> Result<(), LuaCallError> {
    if name.is_empty() {
        return Err(LuaCallError::new(
            "NAME_EMPTY",
            "Script name must not be empty.",
        ));
    }
    if name.contains(NAME_SEPARATOR) {
        return Err(LuaCallError::new(
            "NAME_CONFLICT",
            format!(
                "Cannot define script \"{}\" with an included period; pass the namespace separately.",
                name
            ),
        ));
    }
    Ok(())
}

pub fn validate_namespace(namespace: &str) -> Result<(), LuaCallError> {
    if namespace.is_empty() {
        return Ok(());
    }
    if let Some(segment) = namespace
        .split(NAME_SEPARATOR)
        .find(|segment| !is_identifier(segment))
    {
        return Err(LuaCallError::new(
            "NAMESPACE_INVALID",
            format!(
                "Namespace \"{}\" has invalid segment \"{}\".",
                namespace, segment
            ),
        ));
    }
    Ok(())
}
