//! Shared types used throughout the library.

mod transform;

pub use transform::{look_rotation, mesh_to_camera_axes, Transform};

use serde::{Deserialize, Serialize};

/// A scene object (transform node) owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// A skinned surface component attached to a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

/// A material asset referenced by surface slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// An ordinary texture asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// An offscreen color target allocated by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u32);

/// What a material samples as its main texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureRef {
    #[default]
    None,
    Texture(TextureId),
    RenderTarget(TargetId),
}

/// Catalog generation stamped onto every handle the catalog hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A sub-rectangle in normalized (0..1) viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// The whole target.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Pixel rectangle `(x, y, width, height)` this viewport covers on a target.
    pub fn to_pixels(&self, target_width: u32, target_height: u32) -> (u32, u32, u32, u32) {
        let w = target_width as f32;
        let h = target_height as f32;
        let x0 = (self.x * w).round().clamp(0.0, w) as u32;
        let y0 = (self.y * h).round().clamp(0.0, h) as u32;
        let x1 = ((self.x + self.width) * w).round().clamp(0.0, w) as u32;
        let y1 = ((self.y + self.height) * h).round().clamp(0.0, h) as u32;
        (x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
}

/// Camera component configuration applied to a rig anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub enabled: bool,
    /// Draw order relative to other cameras; higher renders later.
    pub depth: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub viewport: Viewport,
    pub target: Option<TargetId>,
}
