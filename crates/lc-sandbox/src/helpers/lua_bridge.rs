use mlua::{Lua, Table, Value};
use lc_core::{LuaCallError, StoreValue};

/// Nesting limit for script replies; a self-referencing table would otherwise
/// never finish converting.
pub(crate) const MAX_REPLY_DEPTH: usize = 64;

pub(crate) fn store_value_to_lua(lua: &Lua, value: &StoreValue) -> mlua::Result<Value> {
    match value {
        StoreValue::Nil => Ok(Value::Boolean(false)),
        StoreValue::Integer(value) => Ok(Value::Integer(*value)),
        StoreValue::Bulk(value) => Ok(Value::String(lua.create_string(value)?)),
        StoreValue::Array(values) => {
            let table = lua.create_table()?;
            for (index, value) in values.iter().enumerate() {
                table.raw_set(index + 1, store_value_to_lua(lua, value)?)?;
            }
            Ok(Value::Table(table))
        }
        StoreValue::Status { ok } => {
            let table = lua.create_table()?;
            table.raw_set("ok", ok.as_str())?;
            Ok(Value::Table(table))
        }
    }
}

/// Converts a script's return value the way Redis turns Lua into a reply.
pub(crate) fn lua_to_store_value(value: Value) -> Result<StoreValue, LuaCallError> {
    lua_to_store_value_at(value, 0)
}

fn lua_to_store_value_at(value: Value, depth: usize) -> Result<StoreValue, LuaCallError> {
    if depth > MAX_REPLY_DEPTH {
        return Err(LuaCallError::new(
            "HOST_REPLY_TOO_DEEP",
            format!("Script reply nests deeper than {} levels.", MAX_REPLY_DEPTH),
        ));
    }

    match value {
        Value::Nil | Value::Boolean(false) => Ok(StoreValue::Nil),
        Value::Boolean(true) => Ok(StoreValue::Integer(1)),
        Value::Integer(value) => Ok(StoreValue::Integer(value)),
        Value::Number(value) => Ok(StoreValue::Integer(value as i64)),
        Value::String(value) => Ok(StoreValue::Bulk(String::from(value.to_string_lossy()))),
        Value::Table(table) => table_to_store_value(table, depth),
        _ => Ok(StoreValue::Nil),
    }
}

fn table_to_store_value(table: Table, depth: usize) -> Result<StoreValue, LuaCallError> {
    if let Value::String(message) = table.raw_get::<Value>("err").map_err(map_reply_error)? {
        return Err(LuaCallError::new(
            "HOST_SCRIPT_ERROR",
            String::from(message.to_string_lossy()),
        ));
    }
    if let Value::String(status) = table.raw_get::<Value>("ok").map_err(map_reply_error)? {
        return Ok(StoreValue::status(String::from(status.to_string_lossy())));
    }

    let mut out = Vec::new();
    for index in 1.. {
        let item = table.raw_get::<Value>(index).map_err(map_reply_error)?;
        if matches!(item, Value::Nil) {
            break;
        }
        out.push(lua_to_store_value_at(item, depth + 1)?);
    }
    Ok(StoreValue::Array(out))
}

/// Renders a `redis.call` argument; Redis only accepts strings and numbers.
pub(crate) fn lua_to_command_arg(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(String::from(value.to_string_lossy())),
        Value::Integer(value) => Some(value.to_string()),
        Value::Number(value) if value.is_finite() && value.fract() == 0.0 => {
            Some(format!("{}", *value as i64))
        }
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn map_reply_error(error: mlua::Error) -> LuaCallError {
    LuaCallError::new("HOST_REPLY_INVALID", error.to_string())
}
