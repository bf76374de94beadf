//! Scenario tests for spawning, lifecycle and library handling
//!
//! Shared fixtures build library trees in memory and a scene with one
//! owner entity.

mod spawning;

use crate::assets::{DataNode, MemoryLibrarySource};
use crate::config::PrefabConfig;
use crate::ecs::EntityId;
use crate::foundation::bounds::Aabb;
use crate::foundation::math::Transform;
use crate::prefab::{PrefabManager, LIBRARY_TAG, PREFAB_TAG};
use crate::scene::SceneManager;

pub(super) const CRATE_MESH: &str = "objects/crate.cgf";

pub(super) fn object(object_type: &str, pos: &str) -> DataNode {
    DataNode::new("Object")
        .with_attr("Type", object_type)
        .with_attr("Pos", pos)
}

pub(super) fn entity_object(class: &str, pos: &str) -> DataNode {
    object("Entity", pos).with_attr("EntityClass", class)
}

pub(super) fn brush_object(file: &str, pos: &str) -> DataNode {
    object("Brush", pos).with_attr("File", file)
}

pub(super) fn nested_object(name: &str, pos: &str) -> DataNode {
    object("Prefab", pos).with_attr("PrefabName", name)
}

pub(super) fn prefab_node(name: &str, objects: Vec<DataNode>) -> DataNode {
    let mut list = DataNode::new("Objects");
    for o in objects {
        list.push_child(o);
    }
    DataNode::new(PREFAB_TAG).with_attr("Name", name).with_child(list)
}

pub(super) fn library_node(name: &str, prefabs: Vec<DataNode>) -> DataNode {
    let mut root = DataNode::new(LIBRARY_TAG).with_attr("Name", name);
    for p in prefabs {
        root.push_child(p);
    }
    root
}

/// `Props` library: a crate, a stack of two crates and a lone lamp
pub(super) fn props_library() -> DataNode {
    library_node(
        "Props",
        vec![
            prefab_node(
                "Default.Crate",
                vec![
                    entity_object("Light", "0,0,1"),
                    brush_object(CRATE_MESH, "0,0,0"),
                ],
            ),
            prefab_node(
                "Default.Stack",
                vec![
                    nested_object("Props.Default.Crate", "0,0,0"),
                    nested_object("Props.Default.Crate", "0,0,2"),
                    entity_object("Marker", "1,0,0"),
                    object("Decal", "0,-1,0").with_attr("Material", "decals/dirt"),
                ],
            ),
            prefab_node("Default.Lamp", vec![entity_object("Light", "0,2,0")]),
        ],
    )
}

pub(super) fn props_source() -> MemoryLibrarySource {
    MemoryLibrarySource::new().with_file("Prefabs/Props.ron", props_library())
}

pub(super) fn manager_with(source: MemoryLibrarySource) -> PrefabManager<MemoryLibrarySource> {
    let mut manager = PrefabManager::new(source, PrefabConfig::default()).expect("valid config");
    manager
        .load_prefab_library("Prefabs/Props.ron")
        .map(|_| ())
        .unwrap_or_else(|e| log::debug!("fixture without Props: {}", e));
    manager
}

pub(super) fn scene() -> SceneManager {
    crate::foundation::logging::init_for_tests();
    let mut scene = SceneManager::new();
    scene.geometry.add_asset(CRATE_MESH, Aabb::cube(2.0));
    scene
}

pub(super) fn spawn_owner(scene: &mut SceneManager, transform: &Transform) -> EntityId {
    scene.world.create_entity("Spawner", transform)
}
