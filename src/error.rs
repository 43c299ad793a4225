//! Error types for surface camera placement.

use crate::types::{MaterialId, ObjectId, SurfaceId};
use thiserror::Error;

/// Result type alias using SurfaceCameraError.
pub type Result<T> = std::result::Result<T, SurfaceCameraError>;

/// Main error type for catalog, placement and binding operations.
///
/// Empty search results are not errors; catalogs and cluster sets are simply empty.
#[derive(Error, Debug)]
pub enum SurfaceCameraError {
    /// Bounds came back inverted (no triangles visited) or a normal had no length.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// A handle was issued by an older catalog generation.
    #[error("Stale handle from catalog generation {handle_generation} (current is {current})")]
    StaleHandle { handle_generation: u64, current: u64 },

    /// A key that is not present in the current catalog.
    #[error("Unknown catalog key: {0}")]
    UnknownKey(String),

    /// A command needs an upstream selection that has not been made.
    #[error("Missing selection: {0}")]
    MissingSelection(&'static str),

    /// Display binding was requested before any camera rig exists.
    #[error("No camera rig has been placed")]
    NoRig,

    /// The host does not know this scene object.
    #[error("Unknown scene object: {0:?}")]
    UnknownObject(ObjectId),

    /// The host does not know this skinned surface.
    #[error("Unknown skinned surface: {0:?}")]
    UnknownSurface(SurfaceId),

    /// The host does not know this material.
    #[error("Unknown material: {0:?}")]
    UnknownMaterial(MaterialId),

    /// The destination material has no texture to size a render target from.
    #[error("Material {0:?} has no texture")]
    MissingTexture(MaterialId),

    /// Submesh index past the end of the mesh's submesh list.
    #[error("Submesh {index} out of range (mesh has {count})")]
    SubmeshOutOfRange { index: usize, count: usize },

    /// Mesh data failed validation.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Scene fixture could not be turned into a scene.
    #[error("Invalid scene fixture: {0}")]
    Fixture(String),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
