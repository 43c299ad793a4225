//! Face-normal clustering for one material slot.
//!
//! Every triangle contributes the normalized cross product of its two edges from the
//! first corner. Components close to zero are snapped to exactly zero, then normals
//! are folded together by a quantized key so that numerically indistinguishable
//! directions become one cluster. Clusters keep the order of first occurrence.

use crate::catalog::{Catalog, MaterialSlot, Stamped};
use crate::config::SurfaceCameraConfig;
use crate::error::Result;
use crate::host::SceneQuery;
use crate::mesh::MeshData;
use crate::types::Generation;
use glam::Vec3;
use std::collections::HashSet;
use std::fmt;

/// Hash-stable identity of a snapped normal: each axis rounded to a fixed number of
/// decimal places and stored as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NormalKey {
    x: i64,
    y: i64,
    z: i64,
    decimals: u32,
}

impl NormalKey {
    pub fn new(normal: Vec3, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        let q = |v: f32| (v as f64 * scale).round() as i64;
        Self {
            x: q(normal.x),
            y: q(normal.y),
            z: q(normal.z),
            decimals,
        }
    }

    /// The quantized direction as floats.
    pub fn to_vec3(&self) -> Vec3 {
        let scale = 10f64.powi(self.decimals as i32);
        Vec3::new(
            (self.x as f64 / scale) as f32,
            (self.y as f64 / scale) as f32,
            (self.z as f64 / scale) as f32,
        )
    }
}

impl fmt::Display for NormalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.to_vec3();
        let d = self.decimals as usize;
        write!(f, "{:.*}-{:.*}-{:.*}", d, v.x, d, v.y, d, v.z)
    }
}

/// A distinct face direction of one material slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalCluster {
    pub key: NormalKey,
    /// Snapped unit normal of the first triangle that produced this key.
    pub normal: Vec3,
    pub slot: MaterialSlot,
}

impl Stamped for NormalCluster {
    fn generation(&self) -> Generation {
        self.slot.generation()
    }
}

/// Unit normal of triangle `(a, b, c)`, or zero when the triangle has no area.
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let side1 = b - a;
    let side2 = c - a;
    side1.cross(side2).normalize_or_zero()
}

/// Replace every component with `|component| < epsilon` by exactly `0.0`.
pub fn snap_to_zero(v: Vec3, epsilon: f32) -> Vec3 {
    let snap = |c: f32| if c.abs() < epsilon { 0.0 } else { c };
    Vec3::new(snap(v.x), snap(v.y), snap(v.z))
}

/// Distinct snapped face normals of a submesh, in order of first occurrence.
///
/// A mesh without submeshes is not supported and yields no clusters. Triangles
/// with no area have no direction and are skipped.
pub fn cluster_face_normals(
    mesh: &MeshData,
    submesh: usize,
    config: &SurfaceCameraConfig,
) -> Result<Vec<(NormalKey, Vec3)>> {
    if mesh.submesh_count() == 0 {
        log::warn!("Meshes without submeshes are not supported");
        return Ok(Vec::new());
    }
    debug_assert!(mesh.submesh_indices(submesh)?.len() % 3 == 0);

    let mut seen = HashSet::new();
    let mut clusters = Vec::new();
    let mut degenerate = 0usize;

    for [a, b, c] in mesh.triangles(submesh)? {
        let normal = snap_to_zero(face_normal(a, b, c), config.snap_epsilon);
        if normal == Vec3::ZERO {
            degenerate += 1;
            continue;
        }
        let key = NormalKey::new(normal, config.normal_key_decimals);
        if seen.insert(key) {
            clusters.push((key, normal));
        }
    }

    log::debug!(
        "Clustered {} triangles of submesh {} into {} normals ({} degenerate)",
        mesh.triangle_count(submesh),
        submesh,
        clusters.len(),
        degenerate
    );
    Ok(clusters)
}

/// Cluster the face normals of a material slot into a catalog keyed by the
/// normal's `"x-y-z"` text.
pub fn compute_normal_clusters<H: SceneQuery + ?Sized>(
    host: &H,
    slot: &MaterialSlot,
    config: &SurfaceCameraConfig,
    generation: Generation,
) -> Result<Catalog<NormalCluster>> {
    slot.ensure_current(generation)?;
    let mut catalog = Catalog::new(generation);

    let Some(mesh) = host.surface_mesh(slot.surface)? else {
        return Ok(catalog);
    };

    for (key, normal) in cluster_face_normals(&mesh, slot.submesh, config)? {
        catalog.push(
            key.to_string(),
            NormalCluster {
                key,
                normal,
                slot: *slot,
            },
        );
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{find_candidate_objects, find_material_slots};
    use crate::host::MemoryScene;
    use crate::mesh::MeshBuilder;
    use crate::types::{TextureRef, Transform};
    use glam::Vec2;
    use std::sync::Arc;

    fn config() -> SurfaceCameraConfig {
        SurfaceCameraConfig::default()
    }

    fn cube(flip_second_triangle_order: bool) -> MeshData {
        let mut builder = MeshBuilder::new();
        builder.add_box(0, Vec3::ZERO, Vec3::splat(1.0));
        let mut mesh = builder.build().unwrap();
        if flip_second_triangle_order {
            // Rotate corner order inside each triangle; winding is unchanged
            let indices: Vec<u32> = mesh
                .submesh_indices(0)
                .unwrap()
                .chunks_exact(3)
                .flat_map(|t| [t[1], t[2], t[0]])
                .collect();
            mesh = MeshData::new(mesh.positions().to_vec(), mesh.uvs().to_vec(), vec![indices])
                .unwrap();
        }
        mesh
    }

    #[test]
    fn test_coplanar_triangles_one_cluster() {
        let mut builder = MeshBuilder::new();
        let v: Vec<u32> = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y]
            .into_iter()
            .map(|p| builder.add_vertex(p, Vec2::ZERO))
            .collect();
        builder.add_quad(0, v[0], v[1], v[2], v[3]);
        let mesh = builder.build().unwrap();

        let clusters = cluster_face_normals(&mesh, 0, &config()).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].1, Vec3::Z);
    }

    #[test]
    fn test_cube_six_clusters() {
        for rotated in [false, true] {
            let clusters = cluster_face_normals(&cube(rotated), 0, &config()).unwrap();
            assert_eq!(clusters.len(), 6);
            let normals: Vec<Vec3> = clusters.iter().map(|c| c.1).collect();
            for axis in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z] {
                assert!(normals.contains(&axis), "missing {axis:?}");
            }
        }
    }

    #[test]
    fn test_snap_to_zero_exact() {
        let v = snap_to_zero(Vec3::new(0.009, -0.0099, 0.5), 0.01);
        assert_eq!(v.x.to_bits(), 0.0f32.to_bits());
        assert_eq!(v.y.to_bits(), 0.0f32.to_bits());
        assert_eq!(v.z, 0.5);

        // Boundary value is kept
        assert_eq!(snap_to_zero(Vec3::new(0.01, 0.0, 0.0), 0.01).x, 0.01);
    }

    #[test]
    fn test_near_axis_faces_fold() {
        // Two nearly flat triangles whose normals differ only in tiny x/y tilt
        let mut builder = MeshBuilder::new();
        let a = builder.add_vertex(Vec3::ZERO, Vec2::ZERO);
        let b = builder.add_vertex(Vec3::new(1.0, 0.0, 0.004), Vec2::ZERO);
        let c = builder.add_vertex(Vec3::new(0.0, 1.0, 0.0), Vec2::ZERO);
        let d = builder.add_vertex(Vec3::new(2.0, 0.0, 0.0), Vec2::ZERO);
        let e = builder.add_vertex(Vec3::new(2.0, 1.0, -0.003), Vec2::ZERO);
        builder.add_triangle(0, a, b, c);
        builder.add_triangle(0, d, e, c);
        let mesh = builder.build().unwrap();

        let clusters = cluster_face_normals(&mesh, 0, &config()).unwrap();
        assert_eq!(clusters.len(), 1);
        let n = clusters[0].1;
        assert_eq!(n.x, 0.0);
        assert_eq!(n.y, 0.0);
        for (_, n) in &clusters {
            for c in n.to_array() {
                assert!(c == 0.0 || c.abs() >= 0.01);
            }
        }
    }

    #[test]
    fn test_empty_submesh_no_clusters() {
        let mut builder = MeshBuilder::new();
        builder.ensure_submesh(0);
        let mesh = builder.build().unwrap();
        assert!(cluster_face_normals(&mesh, 0, &config()).unwrap().is_empty());
    }

    #[test]
    fn test_zero_submesh_mesh_unsupported() {
        let mesh = MeshData::new(vec![Vec3::ZERO], vec![Vec2::ZERO], vec![]).unwrap();
        assert!(cluster_face_normals(&mesh, 0, &config()).unwrap().is_empty());
    }

    #[test]
    fn test_degenerate_triangle_skipped() {
        let mut builder = MeshBuilder::new();
        let a = builder.add_vertex(Vec3::ZERO, Vec2::ZERO);
        let b = builder.add_vertex(Vec3::X, Vec2::ZERO);
        builder.add_triangle(0, a, b, b);
        let mesh = builder.build().unwrap();
        assert!(cluster_face_normals(&mesh, 0, &config()).unwrap().is_empty());
    }

    #[test]
    fn test_key_display() {
        let key = NormalKey::new(Vec3::new(0.0, -1.0, 0.70710677), 2);
        assert_eq!(key.to_string(), "0.00--1.00-0.71");
        assert_eq!(NormalKey::new(Vec3::new(-0.0, 0.0, 1.0), 2), NormalKey::new(Vec3::Z, 2));
    }

    #[test]
    fn test_compute_normal_clusters_from_scene() {
        let mut scene = MemoryScene::new();
        let mat = scene.add_material("Screen", TextureRef::None);
        let root = scene.add_object("Phone.menu", None, Transform::IDENTITY).unwrap();
        scene.add_surface(root, Some(Arc::new(cube(false))), vec![mat]).unwrap();

        let generation = Generation(1);
        let objects = find_candidate_objects(&scene, &config(), generation);
        let slots = find_material_slots(&scene, objects.require("[0]Phone.menu").unwrap(), generation)
            .unwrap();
        let slot = slots.require("[0-0]Screen").unwrap();

        let clusters = compute_normal_clusters(&scene, slot, &config(), generation).unwrap();
        assert_eq!(clusters.len(), 6);
        assert!(clusters.contains("1.00-0.00-0.00"));
        assert_eq!(clusters.get("0.00-0.00--1.00").unwrap().normal, Vec3::NEG_Z);

        assert!(compute_normal_clusters(&scene, slot, &config(), Generation(2)).is_err());
    }
}
