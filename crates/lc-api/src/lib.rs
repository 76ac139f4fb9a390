use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};

use lc_core::NAME_SEPARATOR;
use serde::Serialize;
use walkdir::WalkDir;

pub use lc_compiler::{transform_script, TransformedScript};
pub use lc_core::{
    ContentIdentity, LuaCallError, NullClient, StoreClient, StoreCommand, StoreValue,
};
pub use lc_registry::{Namespace, RegisteredScript, ScriptInvoker, ScriptRegistry};

pub const BUNDLE_MANIFEST_SCHEMA: &str = "lua-call-bundle.v1";
pub const SCRIPT_EXTENSION: &str = "lua";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleManifest {
    pub schema_version: String,
    pub prefix: String,
    pub scripts: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub name: String,
    pub identity: ContentIdentity,
    pub calls: Vec<String>,
    /// Redis argv of every command needed to publish this script.
    pub commands: Vec<Vec<String>>,
}

/// Maps `a/b/run.lua` to namespace `a.b` and leaf `run`.
pub fn script_name_from_path(relative: &Path) -> Result<(String, String), LuaCallError> {
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str().ok_or_else(|| {
                LuaCallError::new(
                    "SOURCE_PATH_INVALID",
                    format!("Script path is not valid UTF-8: {}", relative.display()),
                )
            })?),
            _ => {
                return Err(LuaCallError::new(
                    "SOURCE_PATH_INVALID",
                    format!("Script path must be relative: {}", relative.display()),
                ))
            }
        }
    }

    let Some(file_name) = segments.pop() else {
        return Err(LuaCallError::new(
            "SOURCE_PATH_INVALID",
            "Script path is empty.",
        ));
    };
    let leaf = file_name
        .strip_suffix(&format!(".{}", SCRIPT_EXTENSION))
        .unwrap_or(file_name);
    let separator = NAME_SEPARATOR.to_string();
    Ok((segments.join(separator.as_str()), leaf.to_string()))
}

/// Reads every `*.lua` file under `root`, keyed by `/`-separated relative path.
pub fn read_lua_sources_from_dir(root: &Path) -> Result<BTreeMap<String, String>, LuaCallError> {
    if !root.is_dir() {
        return Err(LuaCallError::new(
            "SOURCE_NOT_DIR",
            format!("scripts-dir is not a directory: {}", root.display()),
        ));
    }

    let mut sources = BTreeMap::new();
    for entry in WalkDir::new(root).follow_links(false).into_iter() {
        let entry = entry.map_err(|error| LuaCallError::new("SOURCE_SCAN", error.to_string()))?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|ext| ext.to_str()) != Some(SCRIPT_EXTENSION)
        {
            continue;
        }
        let relative = path
            .strip_prefix(root)
            .map_err(|error| LuaCallError::new("SOURCE_SCAN", error.to_string()))?;
        let key = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let source = fs::read_to_string(path)
            .map_err(|error| LuaCallError::new("SOURCE_READ", error.to_string()))?;
        sources.insert(key, source);
    }

    if sources.is_empty() {
        return Err(LuaCallError::new(
            "SOURCE_EMPTY",
            format!("No .lua files under {}.", root.display()),
        ));
    }
    Ok(sources)
}

pub fn register_sources(
    registry: &mut ScriptRegistry,
    sources: &BTreeMap<String, String>,
) -> Result<usize, LuaCallError> {
    for (relative, source) in sources {
        let (namespace, leaf) = script_name_from_path(Path::new(relative))?;
        registry.register(&namespace, &leaf, source)?;
    }
    Ok(sources.len())
}

pub fn bundle_scripts_dir(root: &Path) -> Result<ScriptRegistry, LuaCallError> {
    let sources = read_lua_sources_from_dir(root)?;
    let mut registry = ScriptRegistry::new();
    register_sources(&mut registry, &sources)?;
    Ok(registry)
}

/// Bundles `root` and publishes the scripts under `prefix` through `client`.
pub fn publish_scripts_dir(
    client: &mut dyn StoreClient,
    root: &Path,
    prefix: &str,
) -> Result<ScriptRegistry, LuaCallError> {
    let mut registry = bundle_scripts_dir(root)?;
    registry.publish(client, prefix)?;
    Ok(registry)
}

pub fn build_manifest(registry: &ScriptRegistry, prefix: &str) -> BundleManifest {
    let scripts = registry
        .names_under(prefix)
        .into_iter()
        .filter_map(|name| registry.get(name))
        .map(|script| ManifestEntry {
            name: script.qualified_name.clone(),
            identity: script.identity.clone(),
            calls: script.call_targets.clone(),
            commands: script
                .publish_commands()
                .iter()
                .map(StoreCommand::to_args)
                .collect(),
        })
        .collect();

    BundleManifest {
        schema_version: BUNDLE_MANIFEST_SCHEMA.to_string(),
        prefix: prefix.to_string(),
        scripts,
    }
}
