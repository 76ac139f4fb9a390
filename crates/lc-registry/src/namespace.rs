use lc_core::{LuaCallError, StoreClient};

use crate::{ScriptInvoker, ScriptRegistry};

/// Registration scope: every script registered through it lives under one
/// namespace, and bare `CALL.name(...)` targets resolve inside it.
pub struct Namespace<'a> {
    registry: &'a mut ScriptRegistry,
    namespace: String,
}

impl<'a> Namespace<'a> {
    pub(crate) fn new(registry: &'a mut ScriptRegistry, namespace: String) -> Self {
        Self {
            registry,
            namespace,
        }
    }

    pub fn name(&self) -> &str {
        &self.namespace
    }

    pub fn register(&mut self, name: &str, source: &str) -> Result<ScriptInvoker, LuaCallError> {
        self.registry.register(&self.namespace, name, source)
    }

    pub fn register_with(
        &mut self,
        client: &mut dyn StoreClient,
        name: &str,
        source: &str,
    ) -> Result<ScriptInvoker, LuaCallError> {
        self.registry
            .register_with(client, &self.namespace, name, source)
    }

    /// Publishes this namespace and everything nested below it.
    pub fn publish(&mut self, client: &mut dyn StoreClient) -> Result<usize, LuaCallError> {
        self.registry.publish(client, &self.namespace)
    }
}
