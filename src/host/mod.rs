//! Capabilities the surface camera consumes from the host engine.
//!
//! The core never owns scene state. It reads the scene graph through [`SceneQuery`],
//! moves and creates nodes through [`TransformHost`] and allocates targets and cameras
//! through [`RenderHost`]. [`MemoryScene`] implements all three in memory.

pub mod fixture;
pub mod memory;

pub use fixture::SceneFixture;
pub use memory::MemoryScene;

use crate::error::Result;
use crate::mesh::MeshData;
use crate::types::{CameraSettings, MaterialId, ObjectId, SurfaceId, TargetId, TextureRef};
use glam::{Quat, Vec3};
use std::sync::Arc;

/// Read-only view of the scene graph and its mesh assets.
pub trait SceneQuery {
    /// All live scene objects in the host's enumeration order.
    fn all_objects(&self) -> Vec<ObjectId>;

    fn object_name(&self, object: ObjectId) -> Option<&str>;

    /// Skinned surfaces on `node` and its descendants, depth-first.
    fn surfaces_under(&self, node: ObjectId, include_inactive: bool) -> Vec<SurfaceId>;

    /// The scene object a surface is attached to.
    fn surface_node(&self, surface: SurfaceId) -> Result<ObjectId>;

    /// The mesh bound to a surface, if any.
    fn surface_mesh(&self, surface: SurfaceId) -> Result<Option<Arc<MeshData>>>;

    /// Materials of a surface, index-aligned with its mesh's submeshes.
    fn surface_materials(&self, surface: SurfaceId) -> Result<Vec<MaterialId>>;

    fn material_name(&self, material: MaterialId) -> Option<&str>;
}

/// Transform and hierarchy mutation.
pub trait TransformHost {
    fn world_rotation(&self, object: ObjectId) -> Result<Quat>;

    fn set_world_rotation(&mut self, object: ObjectId, rotation: Quat) -> Result<()>;

    /// Create an empty, never-rendered object parented under `parent`.
    fn create_child(&mut self, parent: ObjectId, name: &str) -> Result<ObjectId>;

    /// Destroy an object and everything under it.
    fn destroy_object(&mut self, object: ObjectId) -> Result<()>;

    fn set_local_position(&mut self, object: ObjectId, position: Vec3) -> Result<()>;

    fn set_local_scale(&mut self, object: ObjectId, scale: Vec3) -> Result<()>;
}

/// Offscreen targets, camera components and material texture references.
pub trait RenderHost {
    /// Pixel size of the material's current main texture.
    fn texture_size(&self, material: MaterialId) -> Result<(u32, u32)>;

    fn material_texture(&self, material: MaterialId) -> Result<TextureRef>;

    fn set_material_texture(&mut self, material: MaterialId, texture: TextureRef) -> Result<()>;

    fn create_render_target(&mut self, width: u32, height: u32, depth_bits: u32) -> Result<TargetId>;

    /// Give a target back to the host.
    ///
    /// The host may still have draws in flight that sample it, so the actual free
    /// must happen no earlier than the next frame.
    fn release_render_target(&mut self, target: TargetId);

    /// Attach a camera to `object`, replacing any camera already there.
    fn attach_camera(&mut self, object: ObjectId, settings: CameraSettings) -> Result<()>;

    fn detach_camera(&mut self, object: ObjectId);
}

/// Everything the surface camera needs from a host.
pub trait Host: SceneQuery + TransformHost + RenderHost {}

impl<T: SceneQuery + TransformHost + RenderHost> Host for T {}
