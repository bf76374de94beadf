//! Loaded prefab libraries and the template arena
//!
//! Libraries are keyed by the file they were loaded from. Every template
//! of every library is also stored in a slot map so nested references can
//! hold a [`TemplateId`] instead of a pointer. Cross-library references are
//! resolved by treating the leading name segment as a library name and
//! loading that library on demand, at most once per name.

use super::descriptor::NestedPrefabReference;
use super::error::PrefabError;
use super::library::PrefabLibrary;
use super::template::PrefabTemplate;
use crate::assets::LibrarySource;
use crate::config::PrefabConfig;
use crate::foundation::collections::{SlotMap, TemplateId};
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

/// Root tag of a library tree
pub const LIBRARY_TAG: &str = "PrefabsLibrary";

/// Tag of a template node inside a library tree
pub const PREFAB_TAG: &str = "Prefab";

/// Resolves nested prefab references while an instance is spawned
pub trait PrefabResolver {
    /// Template referenced by `reference` inside `parent`
    fn resolve_nested(
        &mut self,
        parent: &PrefabTemplate,
        reference: &NestedPrefabReference,
    ) -> Option<Rc<PrefabTemplate>>;

    /// Active configuration
    fn config(&self) -> &PrefabConfig;
}

/// Registry of loaded libraries
pub struct PrefabCatalog<S: LibrarySource> {
    source: S,
    config: PrefabConfig,
    libraries: BTreeMap<String, PrefabLibrary>,
    templates: SlotMap<TemplateId, Rc<PrefabTemplate>>,
    current_group: String,
    attempted_loads: HashSet<String>,
}

impl<S: LibrarySource> PrefabCatalog<S> {
    /// Create an empty catalog reading libraries from `source`
    pub fn new(source: S, config: PrefabConfig) -> Self {
        Self {
            source,
            config,
            libraries: BTreeMap::new(),
            templates: SlotMap::with_key(),
            current_group: String::new(),
            attempted_loads: HashSet::new(),
        }
    }

    /// Load a library file. Loading a file that is already loaded does nothing.
    pub fn load_library(&mut self, file_name: &str) -> Result<&PrefabLibrary, PrefabError> {
        self.load_library_with(file_name, true)?;
        self.libraries
            .get(file_name)
            .ok_or_else(|| PrefabError::LibraryNotFound(file_name.to_string()))
    }

    fn load_library_with(&mut self, file_name: &str, allow_nested_loads: bool) -> Result<(), PrefabError> {
        if self.libraries.contains_key(file_name) {
            log::debug!("Prefab library {} already loaded", file_name);
            return Ok(());
        }

        let root = self.source.load(file_name).map_err(|source| {
            log::error!("Failed to load prefab library {}: {}", file_name, source);
            PrefabError::LibrarySource {
                path: file_name.to_string(),
                source,
            }
        })?;
        if root.tag != LIBRARY_TAG {
            log::warn!("Prefab library {} has root <{}>", file_name, root.tag);
        }
        let Some(library_name) = root.attr("Name").filter(|name| !name.is_empty()) else {
            log::error!("Prefab library {} has no name", file_name);
            return Err(PrefabError::MissingLibraryName(file_name.to_string()));
        };

        let mut library = PrefabLibrary::new(library_name, file_name);
        for node in root.children.iter().filter(|child| child.tag == PREFAB_TAG) {
            let Some(prefab_name) = node.attr("Name").filter(|name| !name.is_empty()) else {
                log::warn!("Unnamed prefab in library {} skipped", library_name);
                continue;
            };
            let template = PrefabTemplate::load(prefab_name, library_name, node);
            let id = self
                .templates
                .insert_with_key(|id| Rc::new(template.with_id(id)));
            if let Some(replaced) = library.add_prefab(Rc::clone(&self.templates[id])) {
                self.templates.remove(replaced.id());
            }
        }

        log::info!(
            "Loaded prefab library '{}' from {} ({} prefabs)",
            library.name(),
            file_name,
            library.len()
        );
        self.libraries.insert(file_name.to_string(), library);
        self.resolve_library(file_name, allow_nested_loads);
        Ok(())
    }

    /// Bind every nested reference of a freshly loaded library
    fn resolve_library(&mut self, file_name: &str, allow_nested_loads: bool) {
        let Some(library) = self.libraries.get(file_name) else {
            return;
        };
        let templates: Vec<Rc<PrefabTemplate>> = library.prefabs().cloned().collect();

        for template in &templates {
            for reference in template.nested() {
                if self
                    .resolve_reference(template, reference, allow_nested_loads)
                    .is_none()
                {
                    log::warn!(
                        "Prefab '{}': nested prefab '{}' not resolved",
                        template.qualified_name(),
                        reference.name
                    );
                }
            }
        }
    }

    fn resolve_reference(
        &mut self,
        parent: &PrefabTemplate,
        reference: &NestedPrefabReference,
        allow_load: bool,
    ) -> Option<Rc<PrefabTemplate>> {
        if let Some(target) = reference.target().and_then(|id| self.templates.get(id)) {
            return Some(Rc::clone(target));
        }
        let found = self.resolve_in(parent.library(), &reference.name, allow_load)?;
        reference.resolve(found.id());
        Some(found)
    }

    /// Look `name` up relative to `current_library`.
    ///
    /// The current library is searched first. Otherwise the leading segment
    /// names another library, which is loaded on demand when `allow_load` is
    /// set and no load of it was attempted before.
    pub fn resolve_in(
        &mut self,
        current_library: &str,
        name: &str,
        allow_load: bool,
    ) -> Option<Rc<PrefabTemplate>> {
        if let Some(found) = self
            .library_by_name(current_library)
            .and_then(|library| library.find_prefab(name, &self.current_group))
        {
            return Some(Rc::clone(found));
        }

        let (library_name, rest) = name.split_once('.')?;
        if self.library_by_name(library_name).is_none() && allow_load {
            self.load_on_demand(library_name);
        }
        self.library_by_name(library_name)
            .and_then(|library| library.find_prefab(rest, &self.current_group))
            .cloned()
    }

    fn load_on_demand(&mut self, library_name: &str) {
        if !self.attempted_loads.insert(library_name.to_string()) {
            return;
        }
        let path = self.config.library_path(library_name);
        log::debug!("Loading prefab library '{}' on demand from {}", library_name, path);
        if let Err(e) = self.load_library_with(&path, false) {
            log::warn!("On-demand load of prefab library '{}' failed: {}", library_name, e);
        }
    }

    /// Look up a library by file name or declared name
    pub fn library_by_name(&self, name: &str) -> Option<&PrefabLibrary> {
        self.libraries
            .get(name)
            .or_else(|| self.libraries.values().find(|library| library.name() == name))
    }

    /// Resolve `Library.Name` with group-aware lookup inside the library.
    /// The library is loaded on demand if needed.
    pub fn find_prefab(&mut self, qualified_name: &str) -> Option<Rc<PrefabTemplate>> {
        let (library_name, rest) = qualified_name.split_once('.')?;
        if self.library_by_name(library_name).is_none() {
            self.load_on_demand(library_name);
        }
        self.library_by_name(library_name)
            .and_then(|library| library.find_prefab(rest, &self.current_group))
            .cloned()
    }

    /// Group-aware lookup of `prefab` in a loaded library
    pub fn find_prefab_in_library(
        &self,
        library: &str,
        prefab: &str,
    ) -> Result<Rc<PrefabTemplate>, PrefabError> {
        let found = self
            .library_by_name(library)
            .ok_or_else(|| PrefabError::LibraryNotFound(library.to_string()))?;
        found
            .find_prefab(prefab, &self.current_group)
            .cloned()
            .ok_or_else(|| PrefabError::PrefabNotFound {
                library: library.to_string(),
                name: prefab.to_string(),
            })
    }

    /// Template by arena handle
    pub fn template(&self, id: TemplateId) -> Option<&Rc<PrefabTemplate>> {
        self.templates.get(id)
    }

    /// Loaded libraries ordered by file name
    pub fn libraries(&self) -> impl Iterator<Item = &PrefabLibrary> {
        self.libraries.values()
    }

    /// Number of loaded libraries
    pub fn library_count(&self) -> usize {
        self.libraries.len()
    }

    /// Number of templates across all libraries
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Unload every library. Instances keep their templates alive.
    pub fn clear_libraries(&mut self) {
        self.libraries.clear();
        self.templates.clear();
        self.attempted_loads.clear();
    }

    /// Group substituted for `Default` during lookups
    pub fn set_current_group(&mut self, group: impl Into<String>) {
        self.current_group = group.into();
    }

    /// Current lookup group
    pub fn current_group(&self) -> &str {
        &self.current_group
    }

    /// Active configuration
    pub fn config(&self) -> &PrefabConfig {
        &self.config
    }

    /// Library source
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: LibrarySource> PrefabResolver for PrefabCatalog<S> {
    fn resolve_nested(
        &mut self,
        parent: &PrefabTemplate,
        reference: &NestedPrefabReference,
    ) -> Option<Rc<PrefabTemplate>> {
        self.resolve_reference(parent, reference, true)
    }

    fn config(&self) -> &PrefabConfig {
        &self.config
    }
}
