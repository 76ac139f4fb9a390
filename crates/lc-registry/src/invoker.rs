use lc_core::{ContentIdentity, LuaCallError, StoreClient, StoreCommand, StoreValue};

/// Callable bound to one transformed script.
///
/// Keys and arguments are sent as strings, the way Redis hands them to any
/// externally invoked script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInvoker {
    qualified_name: String,
    identity: ContentIdentity,
}

impl ScriptInvoker {
    pub fn new(qualified_name: impl Into<String>, identity: ContentIdentity) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            identity,
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn identity(&self) -> &ContentIdentity {
        &self.identity
    }

    /// `EVALSHA` command for this script, for callers batching their own requests.
    pub fn command<K, A>(&self, keys: K, args: A) -> StoreCommand
    where
        K: IntoIterator,
        K::Item: ToString,
        A: IntoIterator,
        A::Item: ToString,
    {
        let mut flattened = keys
            .into_iter()
            .map(|key| key.to_string())
            .collect::<Vec<_>>();
        let num_keys = flattened.len();
        flattened.extend(args.into_iter().map(|arg| arg.to_string()));

        StoreCommand::EvalSha {
            sha: self.identity.sha().to_string(),
            num_keys,
            args: flattened,
        }
    }

    pub fn call<K, A>(
        &self,
        client: &mut dyn StoreClient,
        keys: K,
        args: A,
    ) -> Result<StoreValue, LuaCallError>
    where
        K: IntoIterator,
        K::Item: ToString,
        A: IntoIterator,
        A::Item: ToString,
    {
        client.execute(self.command(keys, args))
    }
}

#[cfg(test)]
mod invoker_tests {
    use super::*;
    use crate::registry_test_support::RecordingClient;

    const NO_KEYS: [&str; 0] = [];

    #[test]
    fn command_flattens_keys_then_args() {
        let invoker = ScriptInvoker::new("app.run", ContentIdentity::from_digest("abcd"));
        let command = invoker.command(["k1", "k2"], [1, 2, 3]);
        assert_eq!(
            command,
            StoreCommand::EvalSha {
                sha: "abcd".to_string(),
                num_keys: 2,
                args: vec!["k1", "k2", "1", "2", "3"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }
        );
    }

    #[test]
    fn call_goes_through_client() {
        let invoker = ScriptInvoker::new("app.run", ContentIdentity::from_digest("abcd"));
        let mut client = RecordingClient::default();
        let reply = invoker
            .call(&mut client, NO_KEYS, ["x"])
            .expect("call should pass");
        assert_eq!(reply, StoreValue::Array(vec![StoreValue::bulk("x")]));
        assert_eq!(
            client.commands()[0].to_args(),
            vec!["EVALSHA", "abcd", "0", "x"]
        );
    }

    #[test]
    fn client_errors_are_returned_untouched() {
        let invoker = ScriptInvoker::new("app.run", ContentIdentity::from_digest("abcd"));
        let mut client = RecordingClient {
            fail_with: Some(LuaCallError::new("STORE_DOWN", "connection refused")),
            ..RecordingClient::default()
        };
        let error = invoker
            .call(&mut client, NO_KEYS, NO_KEYS)
            .expect_err("client failure should surface");
        assert_eq!(error, LuaCallError::new("STORE_DOWN", "connection refused"));
    }
}
