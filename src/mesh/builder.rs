//! Incremental construction of [`MeshData`].

use super::MeshData;
use crate::error::Result;
use glam::{Vec2, Vec3};

/// Accumulates vertices and per-submesh triangles.
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    submeshes: Vec<Vec<u32>>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex and return its index.
    pub fn add_vertex(&mut self, position: Vec3, uv: Vec2) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.uvs.push(uv);
        index
    }

    /// Make sure `submesh` exists, creating empty submeshes up to it.
    pub fn ensure_submesh(&mut self, submesh: usize) -> &mut Self {
        if self.submeshes.len() <= submesh {
            self.submeshes.resize_with(submesh + 1, Vec::new);
        }
        self
    }

    /// Add a triangle by vertex indices to a submesh.
    pub fn add_triangle(&mut self, submesh: usize, i0: u32, i1: u32, i2: u32) {
        self.ensure_submesh(submesh);
        self.submeshes[submesh].extend_from_slice(&[i0, i1, i2]);
    }

    /// Add a quad (two triangles) by vertex indices, given in order around the quad.
    pub fn add_quad(&mut self, submesh: usize, i0: u32, i1: u32, i2: u32, i3: u32) {
        self.add_triangle(submesh, i0, i1, i2);
        self.add_triangle(submesh, i0, i2, i3);
    }

    /// Add an axis-aligned box centered at `center` into one submesh.
    ///
    /// Each face gets its own four vertices, wound counter-clockwise seen from outside,
    /// with UVs spanning the whole 0..1 square.
    pub fn add_box(&mut self, submesh: usize, center: Vec3, half_extent: Vec3) {
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];

        for (normal, u, v) in faces {
            let c = center + normal * half_extent;
            let du = u * half_extent;
            let dv = v * half_extent;
            let a = self.add_vertex(c - du - dv, Vec2::new(0.0, 0.0));
            let b = self.add_vertex(c + du - dv, Vec2::new(1.0, 0.0));
            let d = self.add_vertex(c + du + dv, Vec2::new(1.0, 1.0));
            let e = self.add_vertex(c - du + dv, Vec2::new(0.0, 1.0));
            self.add_quad(submesh, a, b, d, e);
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Validate and freeze the accumulated geometry.
    pub fn build(self) -> Result<MeshData> {
        MeshData::new(self.positions, self.uvs, self.submeshes)
    }
}
