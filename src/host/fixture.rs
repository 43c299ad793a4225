//! JSON scene fixtures for [`MemoryScene`].
//!
//! ```json
//! {
//!   "textures":  [{ "name": "skin", "width": 512, "height": 512 }],
//!   "materials": [{ "name": "Body", "texture": "skin" }],
//!   "meshes":    [{ "name": "body", "positions": [[0,0,0],[1,0,0],[0,1,0]],
//!                   "uvs": [[0,0],[1,0],[0,1]], "submeshes": [[0,1,2]] }],
//!   "objects":   [{ "name": "Body.Menu", "rotation": [0, 90, 0],
//!                   "surfaces": [{ "mesh": "body", "materials": ["Body"] }] }]
//! }
//! ```
//!
//! Objects reference their parent by position in the `objects` array, and a parent
//! must come before its children. A texture may give a `path` to an image instead of
//! an explicit size; relative paths resolve against the fixture file's directory.

use super::MemoryScene;
use crate::error::{Result, SurfaceCameraError};
use crate::mesh::MeshData;
use crate::types::{MaterialId, ObjectId, TextureRef, Transform};
use glam::{Vec2, Vec3};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Top-level fixture document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneFixture {
    #[serde(default)]
    pub textures: Vec<TextureEntry>,
    #[serde(default)]
    pub materials: Vec<MaterialEntry>,
    #[serde(default)]
    pub meshes: Vec<MeshEntry>,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextureEntry {
    pub name: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialEntry {
    pub name: String,
    #[serde(default)]
    pub texture: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeshEntry {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    #[serde(default)]
    pub uvs: Vec<[f32; 2]>,
    #[serde(default)]
    pub submeshes: Vec<Vec<u32>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub position: [f32; 3],
    /// Euler angles in degrees.
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub surfaces: Vec<SurfaceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceEntry {
    #[serde(default)]
    pub mesh: Option<String>,
    #[serde(default)]
    pub materials: Vec<String>,
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_active() -> bool {
    true
}

impl SceneFixture {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a fixture file and build its scene.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<MemoryScene> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let fixture = Self::from_json_str(&content)?;
        fixture.into_scene(path.parent())
    }

    /// Build a [`MemoryScene`]; `base_dir` anchors relative texture paths.
    pub fn into_scene(self, base_dir: Option<&Path>) -> Result<MemoryScene> {
        let mut scene = MemoryScene::new();

        let mut textures = HashMap::new();
        for entry in &self.textures {
            let (width, height) = texture_dimensions(entry, base_dir)?;
            textures.insert(entry.name.as_str(), scene.add_texture(&entry.name, width, height));
        }

        let mut materials: HashMap<&str, MaterialId> = HashMap::new();
        for entry in &self.materials {
            let texture = match &entry.texture {
                Some(name) => TextureRef::Texture(*textures.get(name.as_str()).ok_or_else(|| {
                    SurfaceCameraError::Fixture(format!(
                        "material '{}' references unknown texture '{}'",
                        entry.name, name
                    ))
                })?),
                None => TextureRef::None,
            };
            materials.insert(entry.name.as_str(), scene.add_material(&entry.name, texture));
        }

        let mut meshes = HashMap::new();
        for entry in &self.meshes {
            let mesh = MeshData::new(
                entry.positions.iter().copied().map(Vec3::from).collect(),
                entry.uvs.iter().copied().map(Vec2::from).collect(),
                entry.submeshes.clone(),
            )?;
            meshes.insert(entry.name.as_str(), Arc::new(mesh));
        }

        let mut ids: Vec<ObjectId> = Vec::with_capacity(self.objects.len());
        for (index, entry) in self.objects.iter().enumerate() {
            let parent = match entry.parent {
                Some(p) if p < index => Some(ids[p]),
                Some(p) => {
                    return Err(SurfaceCameraError::Fixture(format!(
                        "object '{}' (#{}) has parent #{} which does not precede it",
                        entry.name, index, p
                    )))
                }
                None => None,
            };

            let local = Transform {
                position: Vec3::from(entry.position),
                scale: Vec3::from(entry.scale),
                ..Transform::IDENTITY
            }
            .with_euler_degrees(entry.rotation[0], entry.rotation[1], entry.rotation[2]);

            let id = scene.add_object(&entry.name, parent, local)?;
            if !entry.active {
                scene.set_active(id, false)?;
            }

            for surface in &entry.surfaces {
                let mesh = match &surface.mesh {
                    Some(name) => Some(meshes.get(name.as_str()).cloned().ok_or_else(|| {
                        SurfaceCameraError::Fixture(format!("unknown mesh '{}'", name))
                    })?),
                    None => None,
                };
                let slots = surface
                    .materials
                    .iter()
                    .map(|name| {
                        materials.get(name.as_str()).copied().ok_or_else(|| {
                            SurfaceCameraError::Fixture(format!("unknown material '{}'", name))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                scene.add_surface(id, mesh, slots)?;
            }

            ids.push(id);
        }

        Ok(scene)
    }
}

fn texture_dimensions(entry: &TextureEntry, base_dir: Option<&Path>) -> Result<(u32, u32)> {
    if let (Some(width), Some(height)) = (entry.width, entry.height) {
        return Ok((width, height));
    }

    let Some(path) = &entry.path else {
        return Err(SurfaceCameraError::Fixture(format!(
            "texture '{}' needs width/height or a path",
            entry.name
        )));
    };

    let resolved = match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.clone(),
    };
    Ok(image::image_dimensions(&resolved)?)
}
