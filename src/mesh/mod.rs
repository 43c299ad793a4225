//! Immutable triangulated mesh assets.
//!
//! [`MeshData`] holds vertex positions, a parallel UV array and one triangle index
//! buffer per submesh. Skinned surfaces reference a mesh through an `Arc` so catalog
//! entries and rigs can read it without borrowing the host.

mod builder;

pub use builder::MeshBuilder;

use crate::error::{Result, SurfaceCameraError};
use glam::{Vec2, Vec3};

/// Triangulated geometry shared by one or more skinned surfaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    submeshes: Vec<Vec<u32>>,
}

impl MeshData {
    /// Create a mesh, checking that every index resolves and every submesh is whole triangles.
    pub fn new(positions: Vec<Vec3>, uvs: Vec<Vec2>, submeshes: Vec<Vec<u32>>) -> Result<Self> {
        if uvs.len() != positions.len() {
            return Err(SurfaceCameraError::InvalidMesh(format!(
                "{} uvs for {} positions",
                uvs.len(),
                positions.len()
            )));
        }

        for (submesh, indices) in submeshes.iter().enumerate() {
            if indices.len() % 3 != 0 {
                return Err(SurfaceCameraError::InvalidMesh(format!(
                    "submesh {} has {} indices, not a multiple of 3",
                    submesh,
                    indices.len()
                )));
            }
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                return Err(SurfaceCameraError::InvalidMesh(format!(
                    "submesh {} references vertex {} but mesh has {}",
                    submesh,
                    bad,
                    positions.len()
                )));
            }
        }

        Ok(Self {
            positions,
            uvs,
            submeshes,
        })
    }

    /// Vertex positions in local mesh space.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Texture coordinates, index-aligned with [`positions`](Self::positions).
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Triangle index list of one submesh.
    pub fn submesh_indices(&self, submesh: usize) -> Result<&[u32]> {
        self.submeshes
            .get(submesh)
            .map(Vec::as_slice)
            .ok_or(SurfaceCameraError::SubmeshOutOfRange {
                index: submesh,
                count: self.submeshes.len(),
            })
    }

    /// Number of triangles in one submesh (0 when out of range).
    pub fn triangle_count(&self, submesh: usize) -> usize {
        self.submeshes.get(submesh).map_or(0, |s| s.len() / 3)
    }

    /// Iterate the corner positions of each triangle in a submesh.
    pub fn triangles(&self, submesh: usize) -> Result<impl Iterator<Item = [Vec3; 3]> + '_> {
        let indices = self.submesh_indices(submesh)?;
        Ok(indices.chunks_exact(3).map(move |tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        }))
    }
}
