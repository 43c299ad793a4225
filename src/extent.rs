//! Bounding extents of a submesh, in local space or UV space.
//!
//! Both calculators share [`extent_of`], which walks every index of the submesh's
//! triangle list once. Bounds start inverted at (+inf, -inf), so a submesh with no
//! triangles yields a degenerate extent the caller must check before use.

use crate::error::{Result, SurfaceCameraError};
use crate::mesh::MeshData;
use glam::{Vec2, Vec3};

/// A coordinate type an extent can be accumulated over.
pub trait ExtentPoint: Copy + PartialEq + std::fmt::Debug {
    const INFINITY: Self;
    const NEG_INFINITY: Self;

    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;
    /// True when every component of `self` is `<=` the matching one in `other`.
    fn all_le(self, other: Self) -> bool;
}

impl ExtentPoint for Vec3 {
    const INFINITY: Self = Vec3::INFINITY;
    const NEG_INFINITY: Self = Vec3::NEG_INFINITY;

    fn min(self, other: Self) -> Self {
        Vec3::min(self, other)
    }

    fn max(self, other: Self) -> Self {
        Vec3::max(self, other)
    }

    fn all_le(self, other: Self) -> bool {
        self.cmple(other).all()
    }
}

impl ExtentPoint for Vec2 {
    const INFINITY: Self = Vec2::INFINITY;
    const NEG_INFINITY: Self = Vec2::NEG_INFINITY;

    fn min(self, other: Self) -> Self {
        Vec2::min(self, other)
    }

    fn max(self, other: Self) -> Self {
        Vec2::max(self, other)
    }

    fn all_le(self, other: Self) -> bool {
        self.cmple(other).all()
    }
}

/// Componentwise min/max box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent<V> {
    pub min: V,
    pub max: V,
}

/// Local-space bounds of a submesh.
pub type Bounds3 = Extent<Vec3>;

/// UV-space bounds of a submesh.
pub type Bounds2 = Extent<Vec2>;

impl<V: ExtentPoint> Extent<V> {
    /// The inverted box every accumulation starts from.
    pub const EMPTY: Self = Self {
        min: V::INFINITY,
        max: V::NEG_INFINITY,
    };

    pub fn new(min: V, max: V) -> Self {
        Self { min, max }
    }

    /// Grow the box to include `p`.
    pub fn include(&mut self, p: V) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// True unless `min <= max` on every axis. NaN bounds count as degenerate.
    pub fn is_degenerate(&self) -> bool {
        !self.min.all_le(self.max)
    }

    /// `Some(self)` when the box holds data, `None` when it is degenerate.
    pub fn non_degenerate(self) -> Option<Self> {
        (!self.is_degenerate()).then_some(self)
    }
}

impl Extent<Vec3> {
    /// Midpoint, written as half-size plus min.
    pub fn center(&self) -> Vec3 {
        (self.max - self.min) / 2.0 + self.min
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl Extent<Vec2> {
    pub fn center(&self) -> Vec2 {
        (self.max - self.min) / 2.0 + self.min
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Accumulate the extent of `source[i]` for every `i` in `indices`.
///
/// Shared vertices are visited once per triangle that uses them, which is harmless
/// to min/max.
pub fn extent_of<V: ExtentPoint>(indices: &[u32], source: &[V]) -> Extent<V> {
    let mut extent = Extent::EMPTY;
    for &i in indices {
        if let Some(&p) = source.get(i as usize) {
            extent.include(p);
        }
    }
    extent
}

/// Local-space bounding box of a submesh's triangles.
pub fn local_bounds(mesh: &MeshData, submesh: usize) -> Result<Bounds3> {
    Ok(extent_of(mesh.submesh_indices(submesh)?, mesh.positions()))
}

/// UV-space bounding box of a submesh's triangles.
pub fn uv_bounds(mesh: &MeshData, submesh: usize) -> Result<Bounds2> {
    Ok(extent_of(mesh.submesh_indices(submesh)?, mesh.uvs()))
}

/// Reject a degenerate extent with a [`SurfaceCameraError::DegenerateGeometry`].
pub fn require_geometry<V: ExtentPoint>(extent: Extent<V>, what: &str) -> Result<Extent<V>> {
    extent.non_degenerate().ok_or_else(|| {
        SurfaceCameraError::DegenerateGeometry(format!("{} has no triangles", what))
    })
}
