//! # Surface Camera
//!
//! Mounts a virtual camera on a face of a skinned mesh and shows what it sees on a
//! material of another mesh, through an offscreen render target.
//!
//! ## Overview
//!
//! The crate works against a host engine through the traits in [`host`]. It searches
//! the scene for candidate objects, lists their material slots, clusters a slot's
//! face normals, places a camera anchor at the center of the slot's submesh looking
//! along a chosen normal, and finally redirects a destination material to sample the
//! camera's render target over the destination submesh's UV rectangle.
//!
//! ## Quick Start
//!
//! ```ignore
//! use surface_camera::{SceneFixture, SurfaceCamera, SurfaceCameraConfig};
//!
//! let mut scene = SceneFixture::load("scene.json")?;
//! let mut camera = SurfaceCamera::new(SurfaceCameraConfig::default());
//! let mut state = camera.new_state();
//!
//! camera.search_objects(&scene, &mut state);
//! camera.on_object_chosen(&scene, &mut state, "[0]Body.menu")?;
//! camera.on_material_chosen(&scene, &mut state, "[0-0]Skin")?;
//! camera.on_normal_chosen(&mut state, "0.00-0.00-1.00")?;
//! camera.on_display_object_chosen(&scene, &mut state, "[1]Phone.menu")?;
//! camera.on_display_chosen(&mut state, "[0-0]Screen")?;
//!
//! let target = camera.apply(&mut scene, &state)?;
//! ```
//!
//! ## Host Integration
//!
//! Engines implement [`SceneQuery`], [`TransformHost`] and [`RenderHost`]; anything
//! that implements all three is a [`Host`]. [`MemoryScene`] is a complete in-memory
//! host used by the tests and the CLI.

pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod extent;
pub mod host;
pub mod mesh;
pub mod normals;
pub mod rig;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use catalog::{find_candidate_objects, find_material_slots, Catalog, MaterialSlot, ObjectHandle, Stamped};
pub use config::SurfaceCameraConfig;
pub use display::{bind_display, unbind_display, DisplayBinding};
pub use error::{Result, SurfaceCameraError};
pub use extent::{local_bounds, uv_bounds, Bounds2, Bounds3, Extent};
pub use host::{Host, MemoryScene, RenderHost, SceneFixture, SceneQuery, TransformHost};
pub use mesh::{MeshBuilder, MeshData};
pub use normals::{compute_normal_clusters, NormalCluster, NormalKey};
pub use rig::{place_camera, teardown_rig, CameraRig, RigSlot, RotationOverride};
pub use session::{SelectionState, SurfaceCamera};
pub use types::{
    CameraSettings, Generation, MaterialId, ObjectId, SurfaceId, TargetId, TextureId, TextureRef,
    Transform, Viewport,
};

/// Load a scene fixture file into an in-memory host.
pub fn load_scene<P: AsRef<std::path::Path>>(path: P) -> Result<MemoryScene> {
    SceneFixture::load(path)
}
