//! Script callbacks registered per entity

use super::EntityId;
use crate::world::ScriptHooks;
use std::collections::{HashMap, HashSet};

/// A callback invocation recorded by [`ScriptRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCall {
    /// Target entity
    pub entity: EntityId,
    /// Callback name
    pub callback: String,
    /// Seed argument
    pub seed: i32,
}

/// In-memory [`ScriptHooks`] implementation
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    callbacks: HashMap<EntityId, HashSet<String>>,
    calls: Vec<ScriptCall>,
}

impl ScriptRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose a callback on an entity
    pub fn expose(&mut self, entity: EntityId, callback: impl Into<String>) {
        self.callbacks.entry(entity).or_default().insert(callback.into());
    }

    /// Invocations so far, oldest first
    pub fn calls(&self) -> &[ScriptCall] {
        &self.calls
    }
}

impl ScriptHooks for ScriptRegistry {
    fn invoke_callback(&mut self, entity: EntityId, callback: &str, seed: i32) -> bool {
        let exposed = self
            .callbacks
            .get(&entity)
            .is_some_and(|names| names.contains(callback));
        if exposed {
            self.calls.push(ScriptCall {
                entity,
                callback: callback.to_string(),
                seed,
            });
        }
        exposed
    }
}
