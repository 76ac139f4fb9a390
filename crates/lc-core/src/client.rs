use crate::error::LuaCallError;
use crate::value::StoreValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    ScriptLoad {
        script: String,
    },
    HSet {
        key: String,
        field: String,
        value: String,
    },
    HGet {
        key: String,
        field: String,
    },
    EvalSha {
        sha: String,
        num_keys: usize,
        args: Vec<String>,
    },
}

impl StoreCommand {
    /// Redis argv for this command, suitable for any RESP client.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Self::ScriptLoad { script } => {
                vec!["SCRIPT".to_string(), "LOAD".to_string(), script.clone()]
            }
            Self::HSet { key, field, value } => vec![
                "HSET".to_string(),
                key.clone(),
                field.clone(),
                value.clone(),
            ],
            Self::HGet { key, field } => vec!["HGET".to_string(), key.clone(), field.clone()],
            Self::EvalSha {
                sha,
                num_keys,
                args,
            } => {
                let mut out = Vec::with_capacity(args.len() + 3);
                out.push("EVALSHA".to_string());
                out.push(sha.clone());
                out.push(num_keys.to_string());
                out.extend(args.iter().cloned());
                out
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ScriptLoad { .. } => "SCRIPT LOAD",
            Self::HSet { .. } => "HSET",
            Self::HGet { .. } => "HGET",
            Self::EvalSha { .. } => "EVALSHA",
        }
    }
}

/// Minimal capability the registry and invokers need from a backing store.
///
/// Timeouts, retries and reconnects are the implementor's business; errors
/// are handed back to callers untouched.
pub trait StoreClient {
    fn execute(&mut self, command: StoreCommand) -> Result<StoreValue, LuaCallError>;

    /// Runs `commands` as one unit. Implementations backed by a real server
    /// should wrap this in MULTI/EXEC; the default only runs them in order.
    fn execute_batch(
        &mut self,
        commands: Vec<StoreCommand>,
    ) -> Result<Vec<StoreValue>, LuaCallError> {
        commands
            .into_iter()
            .map(|command| self.execute(command))
            .collect()
    }

    /// Inert clients accept commands without reaching any store.
    fn is_inert(&self) -> bool {
        false
    }
}

/// Stand-in client used to defer publication until a real client is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullClient;

impl StoreClient for NullClient {
    fn execute(&mut self, _command: StoreCommand) -> Result<StoreValue, LuaCallError> {
        Ok(StoreValue::Nil)
    }

    fn execute_batch(
        &mut self,
        commands: Vec<StoreCommand>,
    ) -> Result<Vec<StoreValue>, LuaCallError> {
        Ok(vec![StoreValue::Nil; commands.len()])
    }

    fn is_inert(&self) -> bool {
        true
    }
}
