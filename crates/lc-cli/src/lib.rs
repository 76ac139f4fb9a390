use std::ffi::OsString;

use clap::Parser;
use lc_api::LuaCallError;

mod cli_args;
mod commands;
mod error_map;
mod logging;

pub(crate) use cli_args::{BundleArgs, Cli, Mode, RunArgs, TransformArgs};
pub(crate) use error_map::{emit_error, map_cli_json, map_cli_source_read};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    logging::init_logging();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, LuaCallError> {
    match cli.command {
        Mode::Transform(args) => commands::run_transform(args),
        Mode::Bundle(args) => commands::run_bundle(args),
        Mode::Run(args) => commands::run_script(args),
    }
}
