use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "lua-call")]
#[command(about = "Transform, bundle and run Lua scripts that call each other inside Redis")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Print the transformed text and identity of one script.
    Transform(TransformArgs),
    /// Print a publish manifest for every script under a directory.
    Bundle(BundleArgs),
    /// Publish a directory into an in-process sandbox and invoke one script.
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub(crate) struct TransformArgs {
    #[arg(long = "file")]
    pub(crate) file: String,
    #[arg(long = "namespace", default_value = "")]
    pub(crate) namespace: String,
    #[arg(long = "name")]
    pub(crate) name: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct BundleArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "prefix", default_value = "")]
    pub(crate) prefix: String,
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "script")]
    pub(crate) script: String,
    #[arg(long = "key")]
    pub(crate) keys: Vec<String>,
    #[arg(long = "arg")]
    pub(crate) args: Vec<String>,
}
