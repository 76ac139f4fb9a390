//! In-process stand-in for Redis' scripting engine.
//!
//! `LuaSandbox` runs scripts on an embedded Lua 5.1 the way Redis does: every
//! `SCRIPT LOAD` defines a global `f_<sha1>` function, `EVALSHA` fills the
//! `KEYS`/`ARGV` globals with strings and calls it, and `redis.call` reaches a
//! small in-memory keyspace. It is meant for tests and local runs, not as a
//! Redis replacement.

mod keyspace;
mod helpers {
    pub(crate) mod lua_bridge;
}

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use helpers::lua_bridge::{lua_to_command_arg, lua_to_store_value, store_value_to_lua};
use keyspace::Keyspace;
use lc_core::{LuaCallError, StoreClient, StoreCommand, StoreValue, IDENTITY_PREFIX};
use mlua::{Function, Lua, Value, Variadic};
use sha1::{Digest, Sha1};
use tracing::debug;

pub struct LuaSandbox {
    lua: Lua,
    keyspace: Rc<RefCell<Keyspace>>,
    loaded: BTreeSet<String>,
}

impl LuaSandbox {
    pub fn new() -> Result<Self, LuaCallError> {
        let lua = Lua::new();
        let keyspace = Rc::new(RefCell::new(Keyspace::default()));
        install_redis_api(&lua, Rc::clone(&keyspace)).map_err(map_host_error)?;
        Ok(Self {
            lua,
            keyspace,
            loaded: BTreeSet::new(),
        })
    }

    pub fn script_exists(&self, sha: &str) -> bool {
        self.loaded.contains(sha)
    }

    pub fn loaded_scripts(&self) -> usize {
        self.loaded.len()
    }

    pub fn hget(&self, key: &str, field: &str) -> Option<String> {
        self.keyspace.borrow().hget(key, field).map(str::to_string)
    }

    fn script_load(&mut self, script: &str) -> Result<StoreValue, LuaCallError> {
        let mut hasher = Sha1::new();
        hasher.update(script.as_bytes());
        let sha = hex::encode(hasher.finalize());

        if !self.loaded.contains(&sha) {
            let function_name = format!("{}{}", IDENTITY_PREFIX, sha);
            self.lua
                .load(format!("{} = function() {}\nend", function_name, script))
                .set_name(format!("@user_script:{}", function_name))
                .exec()
                .map_err(|error| {
                    LuaCallError::new(
                        "HOST_SCRIPT_COMPILE",
                        format!("Error compiling script: {}", error),
                    )
                })?;
            debug!(sha = %sha, "loaded script");
            self.loaded.insert(sha.clone());
        }
        Ok(StoreValue::Bulk(sha))
    }

    fn eval_sha(
        &mut self,
        sha: &str,
        num_keys: usize,
        args: &[String],
    ) -> Result<StoreValue, LuaCallError> {
        if !self.loaded.contains(sha) {
            return Err(LuaCallError::new(
                "NOSCRIPT",
                "No matching script. Please use EVAL.",
            ));
        }
        if num_keys > args.len() {
            return Err(LuaCallError::new(
                "ERR",
                "Number of keys can't be greater than number of args",
            ));
        }

        let (keys, argv) = args.split_at(num_keys);
        let globals = self.lua.globals();
        let keys = self
            .lua
            .create_sequence_from(keys.iter().map(String::as_str))
            .map_err(map_host_error)?;
        let argv = self
            .lua
            .create_sequence_from(argv.iter().map(String::as_str))
            .map_err(map_host_error)?;
        globals.set("KEYS", keys).map_err(map_host_error)?;
        globals.set("ARGV", argv).map_err(map_host_error)?;

        let function = globals
            .get::<Function>(format!("{}{}", IDENTITY_PREFIX, sha))
            .map_err(map_host_error)?;
        let reply = function.call::<Value>(()).map_err(map_script_error)?;
        lua_to_store_value(reply)
    }
}

impl StoreClient for LuaSandbox {
    fn execute(&mut self, command: StoreCommand) -> Result<StoreValue, LuaCallError> {
        match command {
            StoreCommand::ScriptLoad { script } => self.script_load(&script),
            StoreCommand::EvalSha {
                sha,
                num_keys,
                args,
            } => self.eval_sha(&sha, num_keys, &args),
            command @ (StoreCommand::HSet { .. } | StoreCommand::HGet { .. }) => {
                self.keyspace.borrow_mut().dispatch(&command.to_args())
            }
        }
    }
}

fn install_redis_api(lua: &Lua, keyspace: Rc<RefCell<Keyspace>>) -> mlua::Result<()> {
    let redis = lua.create_table()?;
    let call = lua.create_function(move |lua, args: Variadic<Value>| {
        let mut argv = Vec::with_capacity(args.len());
        for arg in args.iter() {
            let Some(arg) = lua_to_command_arg(arg) else {
                return Err(mlua::Error::RuntimeError(
                    "Lua redis() command arguments must be strings or integers".to_string(),
                ));
            };
            argv.push(arg);
        }
        let reply = keyspace
            .borrow_mut()
            .dispatch(&argv)
            .map_err(|error| mlua::Error::RuntimeError(error.to_string()))?;
        store_value_to_lua(lua, &reply)
    })?;
    redis.set("call", call)?;
    lua.globals().set("redis", redis)
}

fn map_host_error(error: mlua::Error) -> LuaCallError {
    LuaCallError::new("HOST_ERROR", error.to_string())
}

fn map_script_error(error: mlua::Error) -> LuaCallError {
    LuaCallError::new("HOST_SCRIPT_ERROR", error.to_string())
}
