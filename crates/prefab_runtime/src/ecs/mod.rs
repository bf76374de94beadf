//! Entities
//!
//! Entity identifiers plus in-memory implementations of the entity system
//! and script collaborators.

pub mod world;
pub mod entity;
pub mod scripts;

pub use world::{World, EntityRecord, WorldStats};
pub use entity::{EntityId, EntitySpawnParams};
pub use scripts::{ScriptRegistry, ScriptCall};
