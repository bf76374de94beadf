//! Prefab demo application
//!
//! Loads the demo town library from disk, spawns it under a spawner entity,
//! then walks the instance through a move, a hide and a level reload.

use prefab_runtime::prelude::*;
use std::error::Error;

const ASSET_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets");
const CRATE_MESH: &str = "objects/crate.cgf";

fn load_config() -> Result<PrefabConfig, Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("{ASSET_ROOT}/prefab_config.toml"));
    log::info!("Reading prefab config from {}", path);
    Ok(PrefabConfig::load_from_file(&path)?)
}

fn log_scene(label: &str, scene: &SceneManager) {
    let stats = scene.stats();
    log::info!(
        "{}: {} live entities, {} render nodes ({} registered), {} static geometry",
        label,
        stats.entities.live,
        stats.geometry.live_nodes,
        stats.geometry.registered_nodes,
        stats.geometry.live_static_geometry
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    log::info!("Starting prefab demo...");

    let config = load_config()?;
    let mut prefabs = PrefabManager::new(RonLibrarySource::new(ASSET_ROOT), config)?;
    let town = prefabs.load_prefab_library("Prefabs/Town.ron")?;
    log::info!("Loaded library '{}' with {} prefabs", town.name(), town.len());
    log::info!("{} libraries resident after load", prefabs.library_count());

    let mut scene = SceneManager::new();
    scene.geometry.add_asset(CRATE_MESH, Aabb::cube(2.0));
    let spawner = scene.world.create_entity("Spawner", &Transform::identity());

    match prefabs.spawn_prefab("Town", "Square", spawner, 1, 0, &mut scene.context())? {
        SpawnOutcome::Spawned { bounds } => {
            log::info!("Spawned Town.Square, bounds {:?} .. {:?}", bounds.min, bounds.max);
        }
        SpawnOutcome::Throttled => log::warn!("Town.Square was throttled"),
    }
    if let Some(instance) = prefabs.instance(spawner) {
        log::info!("Instance tree: {:?}", instance.stats());
    }
    log_scene("After spawn", &scene);

    let moved = Transform::new(
        Vec3::new(25.0, 0.0, -4.0),
        Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2),
        Vec3::new(1.0, 1.0, 1.0),
    );
    scene.world.set_world_matrix(spawner, &moved.to_matrix());
    prefabs.move_prefab(spawner, &mut scene.context())?;
    log_scene("After move", &scene);

    prefabs.hide_prefab(spawner, true, &mut scene.context())?;
    prefabs.hide_prefab(spawner, false, &mut scene.context())?;

    let mut events = LevelEventQueue::new();
    events.send(LevelEvent::new(LevelEventType::LoadingComplete, "town", 0.0));
    events.send(LevelEvent::new(LevelEventType::LoadingStart, "town", 0.0));
    let delivered = events.dispatch(&mut [&mut prefabs], &mut scene.context());
    log::info!("Delivered {} level events", delivered);
    log_scene("After level reload", &scene);

    let outcome = prefabs.spawn_prefab("Props", "Camp", spawner, 2, 1, &mut scene.context())?;
    log::info!("Respawned Props.Camp: spawned = {}", outcome.is_spawned());
    prefabs.delete_prefab(spawner, &mut scene.context())?;
    prefabs.shutdown(&mut scene.context());
    log_scene("After shutdown", &scene);

    log::info!("Prefab demo finished");
    Ok(())
}
