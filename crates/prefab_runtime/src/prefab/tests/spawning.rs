//! Spawning: slot correspondence, transforms, bounds and teardown

use super::*;
use crate::config::PrefabConfig;
use crate::foundation::math::{Mat4, Quat, Vec3};
use crate::prefab::{PrefabError, SpawnOutcome};
use crate::scene::{RenderFlags, RenderNodeKind};
use approx::assert_relative_eq;
use base64::Engine;

const EPSILON: f32 = 1e-4;

fn entity_matrix(scene: &SceneManager, entity: EntityId) -> Mat4 {
    scene.world.entity(entity).map(|e| e.matrix).expect("live entity")
}

fn spawned_bounds(outcome: SpawnOutcome) -> Aabb {
    match outcome {
        SpawnOutcome::Spawned { bounds } => bounds,
        SpawnOutcome::Throttled => panic!("spawn was throttled"),
    }
}

#[test]
fn test_slots_match_descriptors_despite_failures() {
    let mut scene = scene();
    scene.world.fail_class("Light");
    scene.geometry.fail_node_kind(RenderNodeKind::Decal);
    let owner = spawn_owner(&mut scene, &Transform::identity());
    let mut manager = manager_with(props_source());

    let outcome = manager
        .spawn_prefab("Props", "Default.Stack", owner, 0, 0, &mut scene.context())
        .expect("spawn");
    assert!(outcome.is_spawned());

    let instance = manager.instance(owner).expect("instance");
    assert_eq!(instance.entities().len(), 1);
    assert_eq!(instance.geometry().len(), 1);
    assert_eq!(instance.children().len(), 2);
    assert!(instance.entities()[0].is_some());
    assert!(instance.geometry()[0].is_none());

    for child in instance.children() {
        assert_eq!(child.owner(), owner);
        assert_eq!(child.entities(), &[None]);
        assert_eq!(child.geometry().len(), 1);
        assert!(child.geometry()[0].is_some());
    }

    let stats = instance.stats();
    assert_eq!(stats.entities, 1);
    assert_eq!(stats.geometry, 2);
    assert_eq!(stats.instances, 2);
    assert_eq!(stats.failed, 3);
}

#[test]
fn test_world_transform_is_owner_times_local() {
    let owners = [
        Transform::identity(),
        Transform::from_position(Vec3::new(10.0, -4.0, 2.5)),
        Transform::new(
            Vec3::new(3.0, 1.0, -7.0),
            Quat::from_axis_angle(&Vec3::z_axis(), 0.7),
            Vec3::new(2.0, 0.5, 3.0),
        ),
    ];

    for owner_transform in &owners {
        let mut scene = scene();
        let owner = spawn_owner(&mut scene, owner_transform);
        let mut manager = manager_with(props_source());
        assert!(manager
            .spawn_prefab("Props", "Lamp", owner, 0, 0, &mut scene.context())
            .is_ok());

        let w = owner_transform.to_matrix();
        let lamp = manager.instance(owner).and_then(|i| i.entities()[0]).expect("lamp");
        let local = Mat4::new_translation(&Vec3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(entity_matrix(&scene, lamp), w * local, epsilon = EPSILON);
    }
}

#[test]
fn test_nested_transforms_compose_through_offsets() {
    let owner_transform = Transform::new(
        Vec3::new(5.0, 5.0, 0.0),
        Quat::from_axis_angle(&Vec3::y_axis(), 1.2),
        Vec3::new(1.0, 2.0, 1.0),
    );
    let mut scene = scene();
    let owner = spawn_owner(&mut scene, &owner_transform);
    let mut manager = manager_with(props_source());
    assert!(manager
        .spawn_prefab("Props", "Stack", owner, 0, 0, &mut scene.context())
        .is_ok());

    let w = owner_transform.to_matrix();
    let instance = manager.instance(owner).expect("instance");
    let upper = &instance.children()[1];
    assert_relative_eq!(*upper.local_offset(), Mat4::new_translation(&Vec3::new(0.0, 0.0, 2.0)));

    let light = upper.entities()[0].expect("light");
    let expected = w * Mat4::new_translation(&Vec3::new(0.0, 0.0, 3.0));
    assert_relative_eq!(entity_matrix(&scene, light), expected, epsilon = EPSILON);

    let brush = upper.geometry()[0].expect("brush");
    let node = scene.geometry.node(brush).expect("node");
    assert_relative_eq!(node.matrix, w * upper.local_offset(), epsilon = EPSILON);
    assert!(node.registered);
}

#[test]
fn test_entity_scale_is_decomposed_from_local() {
    let mut scene = scene();
    let owner = spawn_owner(&mut scene, &Transform::identity());
    let source = MemoryLibrarySource::new().with_file(
        "Prefabs/Props.ron",
        library_node(
            "Props",
            vec![prefab_node(
                "Default.Tall",
                vec![entity_object("Light", "1,2,3").with_attr("Scale", "1,4,1")],
            )],
        ),
    );
    let mut manager = manager_with(source);
    assert!(manager
        .spawn_prefab("Props", "Tall", owner, 0, 0, &mut scene.context())
        .is_ok());

    let light = manager.instance(owner).and_then(|i| i.entities()[0]).expect("light");
    let template = manager.find_prefab("Props.Tall").expect("template");
    assert_relative_eq!(template.entities()[0].scale, Vec3::new(1.0, 4.0, 1.0), epsilon = EPSILON);
    assert_relative_eq!(
        entity_matrix(&scene, light),
        template.entities()[0].local,
        epsilon = EPSILON
    );
}

#[test]
fn test_bounds_cover_brushes_and_entities_but_not_decals() {
    let mut scene = scene();
    let owner = spawn_owner(&mut scene, &Transform::from_position(Vec3::new(50.0, 0.0, 0.0)));
    let mut manager = manager_with(props_source());

    let bounds = spawned_bounds(
        manager
            .spawn_prefab("Props", "Stack", owner, 0, 0, &mut scene.context())
            .expect("spawn"),
    );

    assert_relative_eq!(bounds.min, Vec3::new(-1.0, -1.0, -1.0), epsilon = EPSILON);
    assert_relative_eq!(bounds.max, Vec3::new(1.5, 1.0, 3.5), epsilon = EPSILON);
    assert_eq!(scene.world.entity(owner).map(|e| e.local_bounds), Some(bounds));
}

#[test]
fn test_delete_removes_every_object_transitively() {
    let mut scene = scene();
    let owner = spawn_owner(&mut scene, &Transform::identity());
    let mut manager = manager_with(props_source());
    assert!(manager
        .spawn_prefab("Props", "Stack", owner, 0, 0, &mut scene.context())
        .is_ok());

    let instance = manager.instance(owner).expect("instance");
    let entities = instance.all_entities();
    let nodes = instance.all_geometry();
    assert_eq!(entities.len(), 3);
    assert_eq!(nodes.len(), 3);

    assert!(manager.delete_prefab(owner, &mut scene.context()).is_ok());
    assert!(entities.iter().all(|e| scene.world.entity(*e).is_none()));
    assert!(nodes.iter().all(|n| !scene.geometry.contains(*n)));
    assert!(scene.world.entity(owner).is_some());

    let stats = scene.stats();
    assert_eq!(stats.geometry.live_nodes, 0);
    assert_eq!(stats.geometry.live_static_geometry, 0);
    assert_eq!(stats.entities.live, 1);
}

#[test]
fn test_respawn_replaces_previous_contents() {
    let mut scene = scene();
    let owner = spawn_owner(&mut scene, &Transform::identity());
    let mut manager = manager_with(props_source());

    assert!(manager
        .spawn_prefab("Props", "Stack", owner, 1, 0, &mut scene.context())
        .is_ok());
    let after_first = scene.stats();
    let first_entities = after_first.entities.created - 1;
    let first_nodes = after_first.geometry.nodes_created;

    assert!(manager
        .spawn_prefab("Props", "Lamp", owner, 2, 0, &mut scene.context())
        .is_ok());
    let after_second = scene.stats();
    assert_eq!(after_second.entities.removed, first_entities);
    assert_eq!(after_second.geometry.nodes_deleted, first_nodes);
    assert_eq!(after_second.entities.live, 2);
    assert_eq!(after_second.geometry.live_nodes, 0);

    let instance = manager.instance(owner).expect("instance");
    assert_eq!(instance.seed(), 2);
    assert_eq!(instance.entities().len(), 1);
    assert!(instance.children().is_empty());
    assert_eq!(instance.source_prefab().map(|t| t.name()), Some("Default.Lamp"));
    assert_eq!(manager.instance_count(), 1);
}

#[test]
fn test_missing_owner_is_an_error() {
    let mut scene = scene();
    let mut manager = manager_with(props_source());

    let result = manager.spawn_prefab("Props", "Lamp", EntityId::new(77), 0, 0, &mut scene.context());
    assert!(matches!(result, Err(PrefabError::OwnerNotFound(_))));
    assert_eq!(manager.instance_count(), 0);
    assert_eq!(scene.world.stats().created, 0);
}

#[test]
fn test_unknown_prefab_is_an_error() {
    let mut scene = scene();
    let owner = spawn_owner(&mut scene, &Transform::identity());
    let mut manager = manager_with(props_source());

    assert!(matches!(
        manager.spawn_prefab("Props", "Ghost", owner, 0, 0, &mut scene.context()),
        Err(PrefabError::PrefabNotFound { .. })
    ));
    assert!(matches!(
        manager.spawn_prefab("Nowhere", "Lamp", owner, 0, 0, &mut scene.context()),
        Err(PrefabError::LibraryNotFound(_))
    ));
    assert_eq!(manager.instance_count(), 0);
}

#[test]
fn test_reference_cycle_is_cut() {
    let source = MemoryLibrarySource::new().with_file(
        "Prefabs/Loop.ron",
        library_node(
            "Loop",
            vec![
                prefab_node(
                    "Default.A",
                    vec![nested_object("Loop.Default.B", "0,0,1"), entity_object("Light", "0,0,0")],
                ),
                prefab_node(
                    "Default.B",
                    vec![nested_object("Loop.Default.A", "0,0,1"), entity_object("Light", "0,0,0")],
                ),
                prefab_node(
                    "Default.Self",
                    vec![nested_object("Loop.Default.Self", "0,0,0"), entity_object("Light", "0,0,0")],
                ),
            ],
        ),
    );
    let mut scene = scene();
    let owner = spawn_owner(&mut scene, &Transform::identity());
    let mut manager = manager_with(source);
    assert!(manager.load_prefab_library("Prefabs/Loop.ron").is_ok());

    assert!(manager
        .spawn_prefab("Loop", "A", owner, 0, 0, &mut scene.context())
        .is_ok());
    let instance = manager.instance(owner).expect("instance");
    let b = &instance.children()[0];
    assert_eq!(b.source_prefab().map(|t| t.name()), Some("Default.B"));
    assert_eq!(b.children().len(), 1);
    assert!(b.children()[0].is_empty());
    assert_eq!(instance.stats().entities, 2);

    let other = spawn_owner(&mut scene, &Transform::identity());
    assert!(manager
        .spawn_prefab("Loop", "Self", other, 0, 0, &mut scene.context())
        .is_ok());
    let looped = manager.instance(other).expect("instance");
    assert_eq!(looped.children().len(), 1);
    assert!(looped.children()[0].is_empty());
    assert_eq!(looped.stats().entities, 1);
}

#[test]
fn test_nesting_depth_is_capped() {
    let source = MemoryLibrarySource::new().with_file(
        "Prefabs/Deep.ron",
        library_node(
            "Deep",
            vec![
                prefab_node("Default.A", vec![nested_object("Deep.Default.B", "0,0,0")]),
                prefab_node("Default.B", vec![nested_object("Deep.Default.C", "0,0,0")]),
                prefab_node("Default.C", vec![entity_object("Light", "0,0,0")]),
            ],
        ),
    );
    let mut scene = scene();
    let owner = spawn_owner(&mut scene, &Transform::identity());
    let config = PrefabConfig::default().with_max_nesting_depth(2);
    let mut manager = PrefabManager::new(source, config).expect("valid config");
    assert!(manager.load_prefab_library("Prefabs/Deep.ron").is_ok());

    assert!(manager
        .spawn_prefab("Deep", "A", owner, 0, 0, &mut scene.context())
        .is_ok());
    let instance = manager.instance(owner).expect("instance");
    let b = &instance.children()[0];
    assert!(!b.is_empty());
    assert!(b.children()[0].is_empty());
    assert_eq!(instance.stats().entities, 0);
}

#[test]
fn test_inline_mesh_brush() {
    let positions: [f32; 6] = [-1.0, -1.0, -1.0, 3.0, 1.0, 1.0];
    let bytes: Vec<u8> = positions.iter().flat_map(|v| v.to_ne_bytes()).collect();
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

    let source = MemoryLibrarySource::new().with_file(
        "Prefabs/Shapes.ron",
        library_node(
            "Shapes",
            vec![prefab_node(
                "Default.Blob",
                vec![object("Designer", "0,0,0")
                    .with_attr("MeshData", encoded)
                    .with_attr("Version", 1)],
            )],
        ),
    );
    let mut scene = scene();
    let owner = spawn_owner(&mut scene, &Transform::identity());
    let mut manager = manager_with(source);
    assert!(manager.load_prefab_library("Prefabs/Shapes.ron").is_ok());

    let bounds = spawned_bounds(
        manager
            .spawn_prefab("Shapes", "Blob", owner, 0, 0, &mut scene.context())
            .expect("spawn"),
    );
    assert_relative_eq!(bounds.min, Vec3::new(-1.0, -1.0, -1.0));
    assert_relative_eq!(bounds.max, Vec3::new(3.0, 1.0, 1.0));

    let node = manager.instance(owner).and_then(|i| i.geometry()[0]).expect("node");
    assert!(scene.geometry.node(node).is_some_and(|n| n.static_geometry.is_some()));

    assert!(manager.delete_prefab(owner, &mut scene.context()).is_ok());
    assert_eq!(scene.geometry.stats().live_static_geometry, 0);
}

#[test]
fn test_decal_and_render_settings() {
    let source = MemoryLibrarySource::new().with_file(
        "Prefabs/Props.ron",
        library_node(
            "Props",
            vec![prefab_node(
                "Default.Dressed",
                vec![
                    brush_object(CRATE_MESH, "0,0,0")
                        .with_attr("RndFlags", (1u32 << 20) | 1)
                        .with_attr("LodRatio", 50)
                        .with_attr("ViewDistRatio", 150)
                        .with_attr("Material", "materials/wood"),
                    object("Decal", "0,0,0")
                        .with_attr("ProjectionType", 2)
                        .with_attr("SortPriority", 40)
                        .with_attr("Material", "decals/dirt"),
                ],
            )],
        ),
    );
    let mut scene = scene();
    let owner = spawn_owner(&mut scene, &Transform::identity());
    let mut manager = manager_with(source);
    assert!(manager
        .spawn_prefab("Props", "Dressed", owner, 0, 0, &mut scene.context())
        .is_ok());

    let instance = manager.instance(owner).expect("instance");
    let brush = scene.geometry.node(instance.geometry()[0].expect("brush")).expect("node");
    assert_eq!(brush.kind, RenderNodeKind::Brush);
    assert!(brush.flags.contains(RenderFlags::CAST_SHADOWS));
    assert_eq!(brush.flags.bits(), (1 << 20) | 1);
    assert_eq!(brush.lod_ratio, 50);
    assert_relative_eq!(brush.view_distance_multiplier, 1.5);
    assert_eq!(
        brush.material.and_then(|m| scene.geometry.material_name(m)),
        Some("materials/wood")
    );

    let decal = scene.geometry.node(instance.geometry()[1].expect("decal")).expect("node");
    assert_eq!(decal.kind, RenderNodeKind::Decal);
    let properties = decal.decal.as_ref().expect("decal properties");
    assert_eq!(properties.sort_priority, 40);
    assert!(properties.explicit_basis.is_some());
    assert_eq!(
        properties.material.and_then(|m| scene.geometry.material_name(m)),
        Some("decals/dirt")
    );
    assert!(decal.registered);
}
