use std::fs;
use std::path::Path;

use lc_api::{
    build_manifest, bundle_scripts_dir, publish_scripts_dir, LuaCallError, ScriptRegistry,
    SCRIPT_EXTENSION,
};
use lc_sandbox::LuaSandbox;
use tracing::info;

use crate::{map_cli_json, map_cli_source_read, BundleArgs, RunArgs, TransformArgs};

pub(crate) fn run_transform(args: TransformArgs) -> Result<i32, LuaCallError> {
    let path = Path::new(&args.file);
    let source = fs::read_to_string(path).map_err(map_cli_source_read)?;
    let name = match args.name {
        Some(name) => name,
        None => default_script_name(path)?,
    };

    let mut registry = ScriptRegistry::new();
    let invoker = registry.register(&args.namespace, &name, &source)?;
    let script = registry
        .get(invoker.qualified_name())
        .ok_or_else(|| script_not_found(invoker.qualified_name()))?;

    println!("RESULT:OK");
    println!("NAME:{}", script.qualified_name);
    println!("IDENTITY:{}", script.identity);
    println!(
        "CALLS_JSON:{}",
        serde_json::to_string(&script.call_targets).map_err(map_cli_json)?
    );
    println!(
        "SOURCE_JSON:{}",
        serde_json::to_string(&script.source).map_err(map_cli_json)?
    );
    Ok(0)
}

pub(crate) fn run_bundle(args: BundleArgs) -> Result<i32, LuaCallError> {
    let registry = bundle_scripts_dir(Path::new(&args.scripts_dir))?;
    let manifest = build_manifest(&registry, &args.prefix);

    println!("RESULT:OK");
    println!("SCRIPTS:{}", manifest.scripts.len());
    println!(
        "MANIFEST_JSON:{}",
        serde_json::to_string(&manifest).map_err(map_cli_json)?
    );
    Ok(0)
}

pub(crate) fn run_script(args: RunArgs) -> Result<i32, LuaCallError> {
    let mut sandbox = LuaSandbox::new()?;
    let registry = publish_scripts_dir(&mut sandbox, Path::new(&args.scripts_dir), "")?;
    info!(scripts = registry.len(), "sandbox ready");

    let invoker = registry
        .invoker(&args.script)
        .ok_or_else(|| script_not_found(&args.script))?;
    let reply = invoker.call(&mut sandbox, &args.keys, &args.args)?;

    println!("RESULT:OK");
    println!(
        "REPLY_JSON:{}",
        serde_json::to_string(&reply).map_err(map_cli_json)?
    );
    Ok(0)
}

pub(crate) fn default_script_name(path: &Path) -> Result<String, LuaCallError> {
    let stem = if path.extension().and_then(|ext| ext.to_str()) == Some(SCRIPT_EXTENSION) {
        path.file_stem()
    } else {
        path.file_name()
    };
    stem.and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            LuaCallError::new(
                "CLI_NAME_MISSING",
                format!("Cannot derive a script name from {}; pass --name.", path.display()),
            )
        })
}

fn script_not_found(name: &str) -> LuaCallError {
    LuaCallError::new(
        "CLI_SCRIPT_NOT_FOUND",
        format!("Script \"{}\" is not registered.", name),
    )
}
