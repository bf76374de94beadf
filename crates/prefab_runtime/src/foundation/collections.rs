//! Handle types backed by slot maps

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle to a parsed prefab template in the template arena
    pub struct TemplateId;

    /// Handle to a render node owned by the world geometry
    pub struct RenderNodeId;

    /// Handle to a loaded static geometry asset
    pub struct StaticGeometryId;

    /// Handle to a loaded material
    pub struct MaterialId;
}
