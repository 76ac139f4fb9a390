use std::collections::BTreeMap;

use lc_compiler::{transform_script, TransformedScript};
use lc_core::{
    qualify, validate_leaf_name, validate_namespace, ContentIdentity, LuaCallError, NullClient,
    RegistrationState, StoreClient, StoreCommand, StoreValue, NAME_SEPARATOR, REGISTRY_KEY,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{Namespace, ScriptInvoker};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredScript {
    pub qualified_name: String,
    pub namespace: String,
    pub raw_source: String,
    pub source: String,
    pub identity: ContentIdentity,
    pub call_targets: Vec<String>,
    pub state: RegistrationState,
}

impl RegisteredScript {
    pub fn invoker(&self) -> ScriptInvoker {
        ScriptInvoker::new(self.qualified_name.clone(), self.identity.clone())
    }

    /// `SCRIPT LOAD` followed by the `:registry` binding for this script.
    pub fn publish_commands(&self) -> [StoreCommand; 2] {
        [
            StoreCommand::ScriptLoad {
                script: self.source.clone(),
            },
            StoreCommand::HSet {
                key: REGISTRY_KEY.to_string(),
                field: self.qualified_name.clone(),
                value: self.identity.to_string(),
            },
        ]
    }
}

/// Qualified name -> transformed script, owned by whoever set up the process.
///
/// Mutation takes `&mut self`; share it behind a lock if registration has to
/// happen from several threads.
#[derive(Debug, Clone, Default)]
pub struct ScriptRegistry {
    scripts: BTreeMap<String, RegisteredScript>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(&mut self, namespace: &str) -> Result<Namespace<'_>, LuaCallError> {
        validate_namespace(namespace)?;
        Ok(Namespace::new(self, namespace.to_string()))
    }

    /// Transforms and records `source` without touching any store.
    pub fn register(
        &mut self,
        namespace: &str,
        name: &str,
        source: &str,
    ) -> Result<ScriptInvoker, LuaCallError> {
        self.register_with(&mut NullClient, namespace, name, source)
    }

    /// Transforms `source`, loads and binds it through `client`, then records it.
    ///
    /// The registry is left untouched when the client fails, so it keeps
    /// agreeing with what the store resolves.
    pub fn register_with(
        &mut self,
        client: &mut dyn StoreClient,
        namespace: &str,
        name: &str,
        source: &str,
    ) -> Result<ScriptInvoker, LuaCallError> {
        validate_leaf_name(name)?;
        validate_namespace(namespace)?;

        let qualified_name = qualify(namespace, name);
        let transformed = transform_script(source, namespace)?;
        let call_targets = transformed
            .call_targets()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let TransformedScript {
            source: transformed_source,
            identity,
            ..
        } = transformed;

        let mut script = RegisteredScript {
            qualified_name: qualified_name.clone(),
            namespace: namespace.to_string(),
            raw_source: source.to_string(),
            source: transformed_source,
            identity,
            call_targets,
            state: RegistrationState::Pending,
        };
        publish_batch(client, vec![&mut script])?;

        if let Some(previous) = self.scripts.get(&qualified_name) {
            if previous.identity != script.identity {
                debug!(
                    name = %qualified_name,
                    old = %previous.identity,
                    new = %script.identity,
                    "replacing registered script"
                );
            }
        }
        debug!(
            name = %qualified_name,
            identity = %script.identity,
            calls = ?script.call_targets,
            "registered script"
        );

        let invoker = script.invoker();
        self.scripts.insert(qualified_name, script);
        Ok(invoker)
    }

    /// Loads every script under `prefix` and binds its name in one batch.
    ///
    /// An empty prefix selects everything; otherwise a script matches when its
    /// name equals the prefix or continues it after a separator.
    pub fn publish(
        &mut self,
        client: &mut dyn StoreClient,
        prefix: &str,
    ) -> Result<usize, LuaCallError> {
        let prefix = prefix.trim_end_matches(NAME_SEPARATOR);
        let selected = self
            .scripts
            .iter_mut()
            .filter(|(name, _)| is_under_prefix(name, prefix))
            .map(|(_, script)| script)
            .collect::<Vec<_>>();
        let published = publish_batch(client, selected)?;
        info!(prefix, published, "published scripts");
        Ok(published)
    }

    pub fn names_under(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.trim_end_matches(NAME_SEPARATOR);
        self.scripts
            .keys()
            .filter(|name| is_under_prefix(name, prefix))
            .map(String::as_str)
            .collect()
    }

    pub fn get(&self, qualified_name: &str) -> Option<&RegisteredScript> {
        self.scripts.get(qualified_name)
    }

    pub fn invoker(&self, qualified_name: &str) -> Option<ScriptInvoker> {
        self.get(qualified_name).map(RegisteredScript::invoker)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredScript> {
        self.scripts.values()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// Sends the load and bind commands of `scripts` as one batch and marks them
/// published once a live client accepted it.
fn publish_batch(
    client: &mut dyn StoreClient,
    mut scripts: Vec<&mut RegisteredScript>,
) -> Result<usize, LuaCallError> {
    if scripts.is_empty() {
        return Ok(0);
    }

    let commands = scripts
        .iter()
        .flat_map(|script| script.publish_commands())
        .collect::<Vec<_>>();
    let replies = client.execute_batch(commands)?;
    if client.is_inert() {
        return Ok(scripts.len());
    }

    for (script, replies) in scripts.iter_mut().zip(replies.chunks(2)) {
        check_publish_replies(script, replies);
        script.state = RegistrationState::Published;
    }
    Ok(scripts.len())
}

fn check_publish_replies(script: &RegisteredScript, replies: &[StoreValue]) {
    let [load, bind] = script.publish_commands();
    match replies.first() {
        Some(StoreValue::Bulk(sha)) if sha != script.identity.sha() => warn!(
            name = %script.qualified_name,
            expected = script.identity.sha(),
            reported = %sha,
            "store reported a different script digest"
        ),
        Some(StoreValue::Bulk(_)) => {}
        Some(other) => warn!(
            name = %script.qualified_name,
            command = load.name(),
            reply = other.type_name(),
            "unexpected reply"
        ),
        None => {}
    }
    if let Some(added) = replies.get(1).and_then(StoreValue::as_integer) {
        debug!(
            name = %script.qualified_name,
            command = bind.name(),
            new_binding = added == 1,
            "bound script name"
        );
    }
}

fn is_under_prefix(name: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match name.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with(NAME_SEPARATOR),
        None => false,
    }
}
