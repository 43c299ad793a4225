//! Scene catalog search.
//!
//! Lists candidate scene objects and, inside a chosen object, the (surface, submesh)
//! material slots. Every handle is stamped with the catalog [`Generation`] it was
//! issued under so later operations can reject handles from an older search.

use crate::config::SurfaceCameraConfig;
use crate::error::{Result, SurfaceCameraError};
use crate::host::SceneQuery;
use crate::types::{Generation, MaterialId, ObjectId, SurfaceId};

/// A handle that belongs to one catalog generation.
pub trait Stamped {
    fn generation(&self) -> Generation;

    /// Fail with [`SurfaceCameraError::StaleHandle`] unless issued under `current`.
    fn ensure_current(&self, current: Generation) -> Result<()> {
        let handle_generation = self.generation();
        if handle_generation == current {
            Ok(())
        } else {
            Err(SurfaceCameraError::StaleHandle {
                handle_generation: handle_generation.0,
                current: current.0,
            })
        }
    }
}

/// A keyed entry in a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry<T> {
    pub key: String,
    pub value: T,
}

/// Ordered, keyed list of selectable handles.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog<T> {
    generation: Generation,
    entries: Vec<CatalogEntry<T>>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self::new(Generation::default())
    }
}

impl<T> Catalog<T> {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            entries: Vec::new(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Append an entry. A key that is already present keeps its first value.
    pub fn push(&mut self, key: String, value: T) -> bool {
        if self.contains(&key) {
            log::debug!("Duplicate catalog key {} ignored", key);
            return false;
        }
        self.entries.push(CatalogEntry { key, value });
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Look up a key, failing with [`SurfaceCameraError::UnknownKey`].
    pub fn require(&self, key: &str) -> Result<&T> {
        self.get(key)
            .ok_or_else(|| SurfaceCameraError::UnknownKey(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and adopt `generation`.
    pub fn reset(&mut self, generation: Generation) {
        self.entries.clear();
        self.generation = generation;
    }
}

/// A listed scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHandle {
    pub id: ObjectId,
    /// Position in the host's enumeration when the search ran.
    pub index: usize,
    generation: Generation,
}

impl Stamped for ObjectHandle {
    fn generation(&self) -> Generation {
        self.generation
    }
}

/// One (surface, submesh) pair and the material drawn with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialSlot {
    /// The catalog object the slot was found under.
    pub object: ObjectId,
    pub surface: SurfaceId,
    /// Object the surface is attached to.
    pub surface_node: ObjectId,
    /// Position of the surface within the object's surfaces.
    pub surface_index: usize,
    pub submesh: usize,
    pub material: MaterialId,
    generation: Generation,
}

impl Stamped for MaterialSlot {
    fn generation(&self) -> Generation {
        self.generation
    }
}

/// Case-insensitive suffix match with a minimum name length.
pub fn is_candidate_name(name: &str, config: &SurfaceCameraConfig) -> bool {
    name.chars().count() >= config.min_name_len
        && name.to_lowercase().ends_with(&config.name_suffix.to_lowercase())
}

/// List scene objects whose name marks them as candidates, keyed `"[index]name"`.
///
/// The index is the object's position in the host's enumeration, counting objects
/// that were not listed, so duplicate names stay distinguishable.
pub fn find_candidate_objects<H: SceneQuery + ?Sized>(
    host: &H,
    config: &SurfaceCameraConfig,
    generation: Generation,
) -> Catalog<ObjectHandle> {
    let mut catalog = Catalog::new(generation);

    for (index, id) in host.all_objects().into_iter().enumerate() {
        let Some(name) = host.object_name(id) else {
            continue;
        };
        if is_candidate_name(name, config) {
            let key = format!("[{}]{}", index, name);
            catalog.push(
                key,
                ObjectHandle {
                    id,
                    index,
                    generation,
                },
            );
        }
    }

    log::debug!("Found {} candidate objects", catalog.len());
    catalog
}

/// List the material slots of every skinned surface under `object`, inactive ones
/// included, keyed `"[surfaceIndex-submeshIndex]materialName"`.
///
/// Surfaces without a mesh contribute nothing, as do material entries past the
/// mesh's last submesh.
pub fn find_material_slots<H: SceneQuery + ?Sized>(
    host: &H,
    object: &ObjectHandle,
    generation: Generation,
) -> Result<Catalog<MaterialSlot>> {
    object.ensure_current(generation)?;
    let mut catalog = Catalog::new(generation);

    for (surface_index, surface) in host.surfaces_under(object.id, true).into_iter().enumerate() {
        let Some(mesh) = host.surface_mesh(surface)? else {
            log::debug!("Surface {:?} has no mesh bound", surface);
            continue;
        };
        let surface_node = host.surface_node(surface)?;
        let materials = host.surface_materials(surface)?;

        for (submesh, material) in materials.into_iter().enumerate() {
            if submesh >= mesh.submesh_count() {
                log::warn!(
                    "Surface {:?} material {} has no matching submesh (mesh has {})",
                    surface,
                    submesh,
                    mesh.submesh_count()
                );
                continue;
            }

            let name = host.material_name(material).unwrap_or_default();
            let key = format!("[{}-{}]{}", surface_index, submesh, name);
            catalog.push(
                key,
                MaterialSlot {
                    object: object.id,
                    surface,
                    surface_node,
                    surface_index,
                    submesh,
                    material,
                    generation,
                },
            );
        }
    }

    log::debug!("Found {} material slots under {:?}", catalog.len(), object.id);
    Ok(catalog)
}
