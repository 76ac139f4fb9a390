use lc_api::LuaCallError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> LuaCallError {
    LuaCallError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: LuaCallError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).expect("string json")
    );
    1
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> LuaCallError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_json(error: serde_json::Error) -> LuaCallError {
    map_error("CLI_JSON", error)
}
