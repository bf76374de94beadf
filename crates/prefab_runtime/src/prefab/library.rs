//! Named collections of prefab templates

use super::template::PrefabTemplate;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Group used by templates that do not name one
pub const DEFAULT_GROUP: &str = "Default";

/// Templates loaded from one library file
#[derive(Debug, Clone)]
pub struct PrefabLibrary {
    name: String,
    file_name: String,
    prefabs: BTreeMap<String, Rc<PrefabTemplate>>,
}

impl PrefabLibrary {
    /// Create an empty library
    pub fn new(name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            prefabs: BTreeMap::new(),
        }
    }

    /// Declared library name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the library was loaded from
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Insert a template under its own name. The last insert wins; the
    /// replaced template is returned.
    pub fn add_prefab(&mut self, prefab: Rc<PrefabTemplate>) -> Option<Rc<PrefabTemplate>> {
        let replaced = self.prefabs.insert(prefab.name().to_string(), prefab);
        if let Some(old) = &replaced {
            log::warn!("Prefab '{}' defined twice in library '{}'", old.name(), self.name);
        }
        replaced
    }

    /// Exact lookup
    pub fn get_prefab(&self, name: &str) -> Option<&Rc<PrefabTemplate>> {
        self.prefabs.get(name)
    }

    /// Group-aware lookup, see [`candidate_names`]
    pub fn find_prefab(&self, name: &str, current_group: &str) -> Option<&Rc<PrefabTemplate>> {
        candidate_names(name, current_group)
            .iter()
            .find_map(|candidate| self.get_prefab(candidate))
    }

    /// Templates ordered by name
    pub fn prefabs(&self) -> impl Iterator<Item = &Rc<PrefabTemplate>> {
        self.prefabs.values()
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.prefabs.len()
    }

    /// True if the library holds no templates
    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }
}

/// Names tried, in order, when looking up `name` with `current_group` active.
///
/// `Default.Rest` tries `<group>.Rest` first, then itself. A bare name tries
/// `<group>.Name`, `Default.Name` and finally the bare name. A name in any
/// other group is only tried as written.
pub fn candidate_names(name: &str, current_group: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(3);
    let mut push = |candidate: String| {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    match name.split_once('.') {
        Some((DEFAULT_GROUP, rest)) => {
            if !current_group.is_empty() {
                push(format!("{current_group}.{rest}"));
            }
            push(name.to_string());
        }
        Some(_) => push(name.to_string()),
        None => {
            if !current_group.is_empty() {
                push(format!("{current_group}.{name}"));
            }
            push(format!("{DEFAULT_GROUP}.{name}"));
            push(name.to_string());
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library_with(names: &[&str]) -> PrefabLibrary {
        let mut library = PrefabLibrary::new("Lib", "Prefabs/Lib.ron");
        for name in names {
            library.add_prefab(Rc::new(PrefabTemplate::new(*name, "Lib")));
        }
        library
    }

    #[test]
    fn test_candidate_order() {
        assert_eq!(candidate_names("Foo", "Voodoo"), ["Voodoo.Foo", "Default.Foo", "Foo"]);
        assert_eq!(candidate_names("Default.Foo", "Voodoo"), ["Voodoo.Foo", "Default.Foo"]);
        assert_eq!(candidate_names("Props.Foo", "Voodoo"), ["Props.Foo"]);
        assert_eq!(candidate_names("Foo", ""), ["Default.Foo", "Foo"]);
        assert_eq!(candidate_names("Default.Foo", "Default"), ["Default.Foo"]);
    }

    #[test]
    fn test_current_group_falls_back_to_default() {
        let library = library_with(&["Default.Foo"]);
        let found = library.find_prefab("Foo", "Voodoo").expect("fallback to default");
        assert_eq!(found.name(), "Default.Foo");
    }

    #[test]
    fn test_current_group_wins_over_default() {
        let library = library_with(&["Default.Foo", "Voodoo.Foo"]);
        assert_eq!(library.find_prefab("Default.Foo", "Voodoo").map(|p| p.name()), Some("Voodoo.Foo"));
        assert_eq!(library.find_prefab("Default.Foo", "").map(|p| p.name()), Some("Default.Foo"));
    }

    #[test]
    fn test_last_write_wins() {
        let mut library = library_with(&["Default.Foo"]);
        let first = library.get_prefab("Default.Foo").cloned().expect("first");
        let replaced = library.add_prefab(Rc::new(PrefabTemplate::new("Default.Foo", "Lib")));

        assert!(replaced.is_some_and(|old| Rc::ptr_eq(&old, &first)));
        assert_eq!(library.len(), 1);
        assert!(!Rc::ptr_eq(library.get_prefab("Default.Foo").expect("second"), &first));
    }

    #[test]
    fn test_missing_prefab() {
        let library = library_with(&["Default.Foo"]);
        assert!(library.get_prefab("Foo").is_none());
        assert!(library.find_prefab("Other.Foo", "Voodoo").is_none());
    }
}
