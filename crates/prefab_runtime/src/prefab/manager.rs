//! Prefab Manager - session registry of libraries and live instances
//!
//! One manager exists per world. It owns the [`PrefabCatalog`], keeps one
//! [`RuntimePrefab`] per owner entity and counts live instances per
//! template so spawns can be throttled. Level lifecycle events recycle the
//! instances while keeping libraries resident.

use super::catalog::PrefabCatalog;
use super::error::{PrefabError, SpawnOutcome};
use super::library::PrefabLibrary;
use super::runtime::RuntimePrefab;
use super::template::PrefabTemplate;
use crate::assets::LibrarySource;
use crate::config::PrefabConfig;
use crate::ecs::EntityId;
use crate::events::{LevelEvent, LevelEventHandler, LevelEventType};
use crate::foundation::collections::TemplateId;
use crate::world::WorldContext;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Registry of prefab libraries and runtime instances
pub struct PrefabManager<S: LibrarySource> {
    catalog: PrefabCatalog<S>,
    instances: BTreeMap<EntityId, RuntimePrefab>,
    spawn_counts: HashMap<TemplateId, u32>,
}

impl<S: LibrarySource> PrefabManager<S> {
    /// Create a manager reading libraries from `source`
    pub fn new(source: S, config: PrefabConfig) -> Result<Self, PrefabError> {
        config.validate()?;
        Ok(Self {
            catalog: PrefabCatalog::new(source, config),
            instances: BTreeMap::new(),
            spawn_counts: HashMap::new(),
        })
    }

    /// Load a library file; already loaded files are not read again
    pub fn load_prefab_library(&mut self, file_name: &str) -> Result<&PrefabLibrary, PrefabError> {
        self.catalog.load_library(file_name)
    }

    /// Spawn `prefab` from `library` for `owner`.
    ///
    /// With `max_spawn_count > 0` the spawn is refused once the template
    /// has that many live instances; an owner re-spawning the same template
    /// does not count against itself. Any previous instance of the owner is
    /// replaced.
    pub fn spawn_prefab(
        &mut self,
        library: &str,
        prefab: &str,
        owner: EntityId,
        seed: i32,
        max_spawn_count: u32,
        world: &mut WorldContext<'_>,
    ) -> Result<SpawnOutcome, PrefabError> {
        let template = self
            .catalog
            .find_prefab_in_library(library, prefab)
            .map_err(|e| {
                log::error!("Cannot spawn prefab for entity {}: {}", owner, e);
                e
            })?;

        let previous = self
            .instances
            .get(&owner)
            .and_then(RuntimePrefab::source_prefab)
            .map(|source| source.id());

        if max_spawn_count > 0 {
            let mut live = self.live_instances_of(template.id());
            if previous == Some(template.id()) {
                live = live.saturating_sub(1);
            }
            if live >= max_spawn_count {
                log::debug!(
                    "Prefab '{}' throttled for entity {}: {} of {} live",
                    template.qualified_name(),
                    owner,
                    live,
                    max_spawn_count
                );
                return Ok(SpawnOutcome::Throttled);
            }
        }

        if let Some(previous) = previous {
            self.release_count(previous);
        }

        let instance = self
            .instances
            .entry(owner)
            .or_insert_with(|| RuntimePrefab::new(owner, seed));
        instance.set_seed(seed);

        match instance.spawn(&template, &mut self.catalog, world) {
            Ok(bounds) => {
                *self.spawn_counts.entry(template.id()).or_insert(0) += 1;
                Ok(SpawnOutcome::Spawned { bounds })
            }
            Err(e) => {
                if let Some(mut failed) = self.instances.remove(&owner) {
                    failed.clear(world);
                }
                Err(e)
            }
        }
    }

    /// Re-place the instance of `owner` after the owner moved
    pub fn move_prefab(&mut self, owner: EntityId, world: &mut WorldContext<'_>) -> Result<(), PrefabError> {
        self.instance_or_err(owner)?.move_to_owner(world)
    }

    /// Hide or show the instance of `owner`
    pub fn hide_prefab(
        &mut self,
        owner: EntityId,
        hidden: bool,
        world: &mut WorldContext<'_>,
    ) -> Result<(), PrefabError> {
        self.instance_or_err(owner)?.hide(hidden, world);
        Ok(())
    }

    /// Destroy the instance of `owner` and everything it spawned
    pub fn delete_prefab(&mut self, owner: EntityId, world: &mut WorldContext<'_>) -> Result<(), PrefabError> {
        let Some(mut instance) = self.instances.remove(&owner) else {
            log::warn!("No prefab instance to delete for entity {}", owner);
            return Err(PrefabError::InstanceNotFound(owner));
        };
        if let Some(source) = instance.source_prefab() {
            self.release_count(source.id());
        }
        instance.clear(world);
        Ok(())
    }

    /// Destroy every instance and reset counters and the current group.
    /// Libraries are unloaded too when `delete_libs` is set.
    pub fn clear(&mut self, world: &mut WorldContext<'_>, delete_libs: bool) {
        let count = self.instances.len();
        for instance in self.instances.values_mut() {
            instance.clear(world);
        }
        self.instances.clear();
        self.spawn_counts.clear();
        self.catalog.set_current_group(String::new());
        if delete_libs {
            self.catalog.clear_libraries();
        }
        log::info!("Prefab manager cleared {} instances (libraries unloaded: {})", count, delete_libs);
    }

    /// Release everything, libraries included
    pub fn shutdown(&mut self, world: &mut WorldContext<'_>) {
        self.clear(world, true);
    }

    /// A level started loading: recycle instances, keep libraries
    pub fn on_loading_start(&mut self, world: &mut WorldContext<'_>) {
        self.clear(world, false);
    }

    /// A level finished loading: run the spawn callback on every procedural
    /// marker entity. Returns the number of callbacks invoked.
    pub fn on_loading_complete(&mut self, world: &mut WorldContext<'_>) -> usize {
        let config = self.catalog.config();
        let markers = world.entities.entities_of_class(&config.procedural_marker_class);

        let invoked = markers
            .into_iter()
            .filter(|&marker| {
                world
                    .scripts
                    .invoke_callback(marker, &config.spawn_callback, config.session_seed)
            })
            .count();

        log::info!(
            "Invoked '{}' on {} '{}' entities",
            config.spawn_callback,
            invoked,
            config.procedural_marker_class
        );
        invoked
    }

    fn instance_or_err(&self, owner: EntityId) -> Result<&RuntimePrefab, PrefabError> {
        self.instances.get(&owner).ok_or_else(|| {
            log::warn!("No prefab instance for entity {}", owner);
            PrefabError::InstanceNotFound(owner)
        })
    }

    fn release_count(&mut self, template: TemplateId) {
        if let Some(count) = self.spawn_counts.get_mut(&template) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.spawn_counts.remove(&template);
            }
        }
    }

    /// Group-aware lookup of `Library.Name`, loading the library on demand
    pub fn find_prefab(&mut self, qualified_name: &str) -> Option<Rc<PrefabTemplate>> {
        self.catalog.find_prefab(qualified_name)
    }

    /// Group-aware lookup inside a loaded library
    pub fn find_prefab_in_library(&self, library: &str, prefab: &str) -> Result<Rc<PrefabTemplate>, PrefabError> {
        self.catalog.find_prefab_in_library(library, prefab)
    }

    /// Group substituted for `Default` during lookups
    pub fn set_current_group(&mut self, group: impl Into<String>) {
        self.catalog.set_current_group(group);
    }

    /// Current lookup group
    pub fn current_group(&self) -> &str {
        self.catalog.current_group()
    }

    /// Instance owned by `owner`
    pub fn instance(&self, owner: EntityId) -> Option<&RuntimePrefab> {
        self.instances.get(&owner)
    }

    /// Number of live instances
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Live instances spawned from a template
    pub fn live_instances_of(&self, template: TemplateId) -> u32 {
        self.spawn_counts.get(&template).copied().unwrap_or(0)
    }

    /// Library by file name or declared name
    pub fn library(&self, name: &str) -> Option<&PrefabLibrary> {
        self.catalog.library_by_name(name)
    }

    /// Number of loaded libraries
    pub fn library_count(&self) -> usize {
        self.catalog.library_count()
    }

    /// Active configuration
    pub fn config(&self) -> &PrefabConfig {
        self.catalog.config()
    }

    /// Library catalog
    pub fn catalog(&self) -> &PrefabCatalog<S> {
        &self.catalog
    }
}

impl<S: LibrarySource> LevelEventHandler for PrefabManager<S> {
    fn on_level_event(&mut self, event: &LevelEvent, world: &mut WorldContext<'_>) -> bool {
        match event.event_type {
            LevelEventType::LoadingStart => self.on_loading_start(world),
            LevelEventType::LoadingComplete => {
                self.on_loading_complete(world);
            }
        }
        false
    }
}

impl<S: LibrarySource> Drop for PrefabManager<S> {
    fn drop(&mut self) {
        if !self.instances.is_empty() {
            log::warn!(
                "Prefab manager dropped with {} live instances; call shutdown first",
                self.instances.len()
            );
        }
    }
}
