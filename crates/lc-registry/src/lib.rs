mod invoker;
mod namespace;
mod registry;

pub use invoker::ScriptInvoker;
pub use namespace::Namespace;
pub use registry::{RegisteredScript, ScriptRegistry};

#[cfg(test)]
pub(crate) mod registry_test_support {
    use lc_core::{LuaCallError, StoreClient, StoreCommand, StoreValue};

    /// Records every batch and answers like a server that accepted it.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingClient {
        pub(crate) batches: Vec<Vec<StoreCommand>>,
        pub(crate) fail_with: Option<LuaCallError>,
    }

    impl RecordingClient {
        pub(crate) fn commands(&self) -> Vec<&StoreCommand> {
            self.batches.iter().flatten().collect()
        }
    }

    impl StoreClient for RecordingClient {
        fn execute(&mut self, command: StoreCommand) -> Result<StoreValue, LuaCallError> {
            Ok(self
                .execute_batch(vec![command])?
                .pop()
                .unwrap_or(StoreValue::Nil))
        }

        fn execute_batch(
            &mut self,
            commands: Vec<StoreCommand>,
        ) -> Result<Vec<StoreValue>, LuaCallError> {
            if let Some(error) = self.fail_with.clone() {
                return Err(error);
            }
            let replies = commands
                .iter()
                .map(|command| match command {
                    StoreCommand::ScriptLoad { script } => {
                        StoreValue::bulk(lc_compiler::content_identity(script).sha())
                    }
                    StoreCommand::HSet { .. } => StoreValue::Integer(1),
                    StoreCommand::HGet { .. } => StoreValue::Nil,
                    StoreCommand::EvalSha { args, .. } => StoreValue::Array(
                        args.iter().cloned().map(StoreValue::Bulk).collect(),
                    ),
                })
                .collect();
            self.batches.push(commands);
            Ok(replies)
        }
    }
}
