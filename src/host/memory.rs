//! In-memory host scene.
//!
//! Backs the CLI and the tests. Objects form a parent/child hierarchy with local
//! transforms; world rotations are composed through the parent chain. Render targets
//! carry a real RGBA buffer that enabled cameras clear their viewport into when a
//! frame ends.

use super::{RenderHost, SceneQuery, TransformHost};
use crate::error::{Result, SurfaceCameraError};
use crate::mesh::MeshData;
use crate::types::{
    CameraSettings, MaterialId, ObjectId, SurfaceId, TargetId, TextureId, TextureRef, Transform,
};
use glam::{Quat, Vec3};
use image::{Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Color a camera writes over its viewport when a frame is drawn.
pub const CAMERA_CLEAR_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    local: Transform,
    active: bool,
    surfaces: Vec<SurfaceId>,
    camera: Option<CameraSettings>,
}

#[derive(Debug, Clone)]
struct Surface {
    node: ObjectId,
    mesh: Option<Arc<MeshData>>,
    materials: Vec<MaterialId>,
}

#[derive(Debug, Clone)]
struct Material {
    name: String,
    texture: TextureRef,
}

/// An ordinary texture asset; only its size matters here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// An offscreen color buffer.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub depth_bits: u32,
    pub color: RgbaImage,
}

impl RenderTarget {
    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }
}

/// A scene graph held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    nodes: Vec<Option<Node>>,
    surfaces: Vec<Option<Surface>>,
    materials: Vec<Material>,
    textures: Vec<TextureInfo>,
    targets: BTreeMap<TargetId, RenderTarget>,
    next_target: u32,
    pending_release: Vec<(u64, TargetId)>,
    frame: u64,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, optionally under a parent.
    pub fn add_object(
        &mut self,
        name: impl Into<String>,
        parent: Option<ObjectId>,
        local: Transform,
    ) -> Result<ObjectId> {
        if let Some(p) = parent {
            self.node(p)?;
        }

        let id = ObjectId(self.nodes.len() as u32);
        self.nodes.push(Some(Node {
            name: name.into(),
            parent,
            children: Vec::new(),
            local,
            active: true,
            surfaces: Vec::new(),
            camera: None,
        }));
        if let Some(p) = parent {
            self.node_mut(p)?.children.push(id);
        }
        Ok(id)
    }

    pub fn set_active(&mut self, object: ObjectId, active: bool) -> Result<()> {
        self.node_mut(object)?.active = active;
        Ok(())
    }

    pub fn add_texture(&mut self, name: impl Into<String>, width: u32, height: u32) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(TextureInfo {
            name: name.into(),
            width,
            height,
        });
        id
    }

    pub fn add_material(&mut self, name: impl Into<String>, texture: TextureRef) -> MaterialId {
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(Material {
            name: name.into(),
            texture,
        });
        id
    }

    /// Attach a skinned surface to an object.
    pub fn add_surface(
        &mut self,
        node: ObjectId,
        mesh: Option<Arc<MeshData>>,
        materials: Vec<MaterialId>,
    ) -> Result<SurfaceId> {
        if let Some(&bad) = materials.iter().find(|m| m.0 as usize >= self.materials.len()) {
            return Err(SurfaceCameraError::UnknownMaterial(bad));
        }

        let id = SurfaceId(self.surfaces.len() as u32);
        self.node_mut(node)?.surfaces.push(id);
        self.surfaces.push(Some(Surface {
            node,
            mesh,
            materials,
        }));
        Ok(id)
    }

    /// Number of live objects, including inactive ones.
    pub fn object_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn contains(&self, object: ObjectId) -> bool {
        self.node(object).is_ok()
    }

    /// First live object with this exact name.
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.nodes
            .iter()
            .enumerate()
            .find(|(_, n)| n.as_ref().is_some_and(|n| n.name == name))
            .map(|(i, _)| ObjectId(i as u32))
    }

    pub fn parent(&self, object: ObjectId) -> Option<ObjectId> {
        self.node(object).ok().and_then(|n| n.parent)
    }

    pub fn children(&self, object: ObjectId) -> &[ObjectId] {
        self.node(object)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn local_transform(&self, object: ObjectId) -> Result<Transform> {
        Ok(self.node(object)?.local)
    }

    pub fn set_local_rotation(&mut self, object: ObjectId, rotation: Quat) -> Result<()> {
        self.node_mut(object)?.local.rotation = rotation;
        Ok(())
    }

    /// World-space position of an object's origin.
    pub fn world_position(&self, object: ObjectId) -> Result<Vec3> {
        let node = self.node(object)?;
        match node.parent {
            Some(p) => {
                let parent_rot = self.world_rotation(p)?;
                let parent_scale = self.world_scale(p)?;
                Ok(self.world_position(p)? + parent_rot * (parent_scale * node.local.position))
            }
            None => Ok(node.local.position),
        }
    }

    fn world_scale(&self, object: ObjectId) -> Result<Vec3> {
        let node = self.node(object)?;
        match node.parent {
            Some(p) => Ok(self.world_scale(p)? * node.local.scale),
            None => Ok(node.local.scale),
        }
    }

    /// Camera attached to an object, if any.
    pub fn camera(&self, object: ObjectId) -> Option<&CameraSettings> {
        self.node(object).ok().and_then(|n| n.camera.as_ref())
    }

    /// Number of camera components in the scene.
    pub fn camera_count(&self) -> usize {
        self.nodes
            .iter()
            .flatten()
            .filter(|n| n.camera.is_some())
            .count()
    }

    pub fn texture(&self, texture: TextureId) -> Option<&TextureInfo> {
        self.textures.get(texture.0 as usize)
    }

    pub fn render_target(&self, target: TargetId) -> Option<&RenderTarget> {
        self.targets.get(&target)
    }

    /// Number of allocated targets, including ones waiting to be freed.
    pub fn render_target_count(&self) -> usize {
        self.targets.len()
    }

    /// Targets released but not yet freed.
    pub fn pending_releases(&self) -> Vec<TargetId> {
        self.pending_release.iter().map(|&(_, id)| id).collect()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Draw every enabled camera into its target, then advance the frame counter.
    ///
    /// Targets released during frame `n` are freed once frame `n + 1` has also ended.
    pub fn end_frame(&mut self) {
        let cameras: Vec<CameraSettings> = self
            .nodes
            .iter()
            .flatten()
            .filter_map(|n| n.camera.clone())
            .filter(|c| c.enabled)
            .collect();

        for camera in cameras {
            let Some(target) = camera.target.and_then(|t| self.targets.get_mut(&t)) else {
                continue;
            };
            let (x, y, w, h) = camera.viewport.to_pixels(target.width(), target.height());
            for py in y..y + h {
                for px in x..x + w {
                    target.color.put_pixel(px, py, CAMERA_CLEAR_COLOR);
                }
            }
        }

        self.frame += 1;
        let frame = self.frame;
        let targets = &mut self.targets;
        self.pending_release.retain(|&(requested, id)| {
            if frame > requested + 1 {
                targets.remove(&id);
                log::debug!("Freed render target {:?}", id);
                false
            } else {
                true
            }
        });
    }

    fn node(&self, object: ObjectId) -> Result<&Node> {
        self.nodes
            .get(object.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(SurfaceCameraError::UnknownObject(object))
    }

    fn node_mut(&mut self, object: ObjectId) -> Result<&mut Node> {
        self.nodes
            .get_mut(object.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(SurfaceCameraError::UnknownObject(object))
    }

    fn surface(&self, surface: SurfaceId) -> Result<&Surface> {
        self.surfaces
            .get(surface.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(SurfaceCameraError::UnknownSurface(surface))
    }

    fn material(&self, material: MaterialId) -> Result<&Material> {
        self.materials
            .get(material.0 as usize)
            .ok_or(SurfaceCameraError::UnknownMaterial(material))
    }

    fn active_in_hierarchy(&self, object: ObjectId) -> bool {
        let mut current = Some(object);
        while let Some(id) = current {
            match self.node(id) {
                Ok(node) if node.active => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    fn collect_surfaces(&self, node: ObjectId, include_inactive: bool, out: &mut Vec<SurfaceId>) {
        let Ok(n) = self.node(node) else {
            return;
        };
        if !include_inactive && !n.active {
            return;
        }
        out.extend_from_slice(&n.surfaces);
        for &child in &n.children {
            self.collect_surfaces(child, include_inactive, out);
        }
    }
}

impl SceneQuery for MemoryScene {
    fn all_objects(&self) -> Vec<ObjectId> {
        (0..self.nodes.len() as u32)
            .map(ObjectId)
            .filter(|&id| self.active_in_hierarchy(id))
            .collect()
    }

    fn object_name(&self, object: ObjectId) -> Option<&str> {
        self.node(object).ok().map(|n| n.name.as_str())
    }

    fn surfaces_under(&self, node: ObjectId, include_inactive: bool) -> Vec<SurfaceId> {
        let mut out = Vec::new();
        if include_inactive || self.active_in_hierarchy(node) {
            self.collect_surfaces(node, include_inactive, &mut out);
        }
        out
    }

    fn surface_node(&self, surface: SurfaceId) -> Result<ObjectId> {
        Ok(self.surface(surface)?.node)
    }

    fn surface_mesh(&self, surface: SurfaceId) -> Result<Option<Arc<MeshData>>> {
        Ok(self.surface(surface)?.mesh.clone())
    }

    fn surface_materials(&self, surface: SurfaceId) -> Result<Vec<MaterialId>> {
        Ok(self.surface(surface)?.materials.clone())
    }

    fn material_name(&self, material: MaterialId) -> Option<&str> {
        self.material(material).ok().map(|m| m.name.as_str())
    }
}

impl TransformHost for MemoryScene {
    fn world_rotation(&self, object: ObjectId) -> Result<Quat> {
        let node = self.node(object)?;
        match node.parent {
            Some(p) => Ok(self.world_rotation(p)? * node.local.rotation),
            None => Ok(node.local.rotation),
        }
    }

    fn set_world_rotation(&mut self, object: ObjectId, rotation: Quat) -> Result<()> {
        let parent_rotation = match self.node(object)?.parent {
            Some(p) => self.world_rotation(p)?,
            None => Quat::IDENTITY,
        };
        self.node_mut(object)?.local.rotation = (parent_rotation.inverse() * rotation).normalize();
        Ok(())
    }

    fn create_child(&mut self, parent: ObjectId, name: &str) -> Result<ObjectId> {
        self.add_object(name, Some(parent), Transform::IDENTITY)
    }

    fn destroy_object(&mut self, object: ObjectId) -> Result<()> {
        let node = self
            .nodes
            .get_mut(object.0 as usize)
            .and_then(Option::take)
            .ok_or(SurfaceCameraError::UnknownObject(object))?;

        for surface in &node.surfaces {
            if let Some(slot) = self.surfaces.get_mut(surface.0 as usize) {
                *slot = None;
            }
        }
        if let Some(parent) = node.parent.and_then(|p| self.node_mut(p).ok()) {
            parent.children.retain(|&c| c != object);
        }
        for child in node.children {
            self.destroy_object(child)?;
        }
        Ok(())
    }

    fn set_local_position(&mut self, object: ObjectId, position: Vec3) -> Result<()> {
        self.node_mut(object)?.local.position = position;
        Ok(())
    }

    fn set_local_scale(&mut self, object: ObjectId, scale: Vec3) -> Result<()> {
        self.node_mut(object)?.local.scale = scale;
        Ok(())
    }
}

impl RenderHost for MemoryScene {
    fn texture_size(&self, material: MaterialId) -> Result<(u32, u32)> {
        match self.material(material)?.texture {
            TextureRef::Texture(id) => self
                .texture(id)
                .map(|t| (t.width, t.height))
                .ok_or(SurfaceCameraError::MissingTexture(material)),
            TextureRef::RenderTarget(id) => self
                .targets
                .get(&id)
                .map(|t| (t.width(), t.height()))
                .ok_or(SurfaceCameraError::MissingTexture(material)),
            TextureRef::None => Err(SurfaceCameraError::MissingTexture(material)),
        }
    }

    fn material_texture(&self, material: MaterialId) -> Result<TextureRef> {
        Ok(self.material(material)?.texture)
    }

    fn set_material_texture(&mut self, material: MaterialId, texture: TextureRef) -> Result<()> {
        self.materials
            .get_mut(material.0 as usize)
            .ok_or(SurfaceCameraError::UnknownMaterial(material))?
            .texture = texture;
        Ok(())
    }

    fn create_render_target(&mut self, width: u32, height: u32, depth_bits: u32) -> Result<TargetId> {
        let id = TargetId(self.next_target);
        self.next_target += 1;
        self.targets.insert(
            id,
            RenderTarget {
                depth_bits,
                color: RgbaImage::new(width, height),
            },
        );
        Ok(id)
    }

    fn release_render_target(&mut self, target: TargetId) {
        if self.targets.contains_key(&target) && !self.pending_release.iter().any(|&(_, t)| t == target) {
            self.pending_release.push((self.frame, target));
        }
    }

    fn attach_camera(&mut self, object: ObjectId, settings: CameraSettings) -> Result<()> {
        self.node_mut(object)?.camera = Some(settings);
        Ok(())
    }

    fn detach_camera(&mut self, object: ObjectId) {
        if let Ok(node) = self.node_mut(object) {
            node.camera = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Viewport;

    fn camera_settings(target: TargetId) -> CameraSettings {
        CameraSettings {
            enabled: true,
            depth: 9.0,
            near_clip: 0.01,
            far_clip: 1000.0,
            fov: 36.0,
            viewport: Viewport::new(0.5, 0.5, 0.5, 0.5),
            target: Some(target),
        }
    }

    #[test]
    fn test_world_rotation_composes() {
        let mut scene = MemoryScene::new();
        let root = scene
            .add_object("root", None, Transform::IDENTITY.with_euler_degrees(0.0, 90.0, 0.0))
            .unwrap();
        let child = scene
            .add_object("child", Some(root), Transform::IDENTITY.with_euler_degrees(0.0, 90.0, 0.0))
            .unwrap();

        let world = scene.world_rotation(child).unwrap();
        assert!((world * Vec3::Z).abs_diff_eq(Vec3::NEG_Z, 1e-5));

        scene.set_world_rotation(child, Quat::IDENTITY).unwrap();
        assert!(scene.world_rotation(child).unwrap().abs_diff_eq(Quat::IDENTITY, 1e-5));
        // Parent untouched
        assert!((scene.world_rotation(root).unwrap() * Vec3::Z).abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn test_world_position() {
        let mut scene = MemoryScene::new();
        let root = scene
            .add_object(
                "root",
                None,
                Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).with_euler_degrees(0.0, 90.0, 0.0),
            )
            .unwrap();
        let child = scene
            .add_object("child", Some(root), Transform::from_position(Vec3::Z))
            .unwrap();
        assert!(scene
            .world_position(child)
            .unwrap()
            .abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_all_objects_skips_inactive() {
        let mut scene = MemoryScene::new();
        let a = scene.add_object("a", None, Transform::IDENTITY).unwrap();
        let b = scene.add_object("b", Some(a), Transform::IDENTITY).unwrap();
        let c = scene.add_object("c", None, Transform::IDENTITY).unwrap();
        assert_eq!(scene.all_objects(), vec![a, b, c]);

        scene.set_active(a, false).unwrap();
        assert_eq!(scene.all_objects(), vec![c]);
    }

    #[test]
    fn test_surfaces_under_inactive() {
        let mut scene = MemoryScene::new();
        let mat = scene.add_material("m", TextureRef::None);
        let root = scene.add_object("root", None, Transform::IDENTITY).unwrap();
        let hidden = scene.add_object("hidden", Some(root), Transform::IDENTITY).unwrap();
        let s0 = scene.add_surface(root, None, vec![mat]).unwrap();
        let s1 = scene.add_surface(hidden, None, vec![mat]).unwrap();
        scene.set_active(hidden, false).unwrap();

        assert_eq!(scene.surfaces_under(root, true), vec![s0, s1]);
        assert_eq!(scene.surfaces_under(root, false), vec![s0]);
    }

    #[test]
    fn test_destroy_removes_subtree() {
        let mut scene = MemoryScene::new();
        let root = scene.add_object("root", None, Transform::IDENTITY).unwrap();
        let anchor = scene.create_child(root, "anchor").unwrap();
        let grandchild = scene.create_child(anchor, "grandchild").unwrap();

        scene.destroy_object(anchor).unwrap();
        assert!(!scene.contains(anchor));
        assert!(!scene.contains(grandchild));
        assert!(scene.children(root).is_empty());
        assert_eq!(scene.object_count(), 1);
        assert!(scene.destroy_object(anchor).is_err());
    }

    #[test]
    fn test_texture_size_follows_reference() {
        let mut scene = MemoryScene::new();
        let tex = scene.add_texture("skin", 256, 128);
        let mat = scene.add_material("m", TextureRef::Texture(tex));
        assert_eq!(scene.texture_size(mat).unwrap(), (256, 128));

        let target = scene.create_render_target(64, 32, 24).unwrap();
        scene.set_material_texture(mat, TextureRef::RenderTarget(target)).unwrap();
        assert_eq!(scene.texture_size(mat).unwrap(), (64, 32));

        scene.set_material_texture(mat, TextureRef::None).unwrap();
        assert!(matches!(
            scene.texture_size(mat),
            Err(SurfaceCameraError::MissingTexture(_))
        ));
    }

    #[test]
    fn test_release_is_deferred() {
        let mut scene = MemoryScene::new();
        let target = scene.create_render_target(4, 4, 24).unwrap();
        scene.release_render_target(target);
        scene.release_render_target(target);
        assert_eq!(scene.pending_releases(), vec![target]);

        scene.end_frame();
        assert!(scene.render_target(target).is_some());
        scene.end_frame();
        assert!(scene.render_target(target).is_none());
        assert!(scene.pending_releases().is_empty());
    }

    #[test]
    fn test_camera_draws_viewport() {
        let mut scene = MemoryScene::new();
        let root = scene.add_object("root", None, Transform::IDENTITY).unwrap();
        let target = scene.create_render_target(4, 4, 24).unwrap();
        scene.attach_camera(root, camera_settings(target)).unwrap();
        scene.end_frame();

        let color = &scene.render_target(target).unwrap().color;
        assert_eq!(*color.get_pixel(3, 3), CAMERA_CLEAR_COLOR);
        assert_eq!(*color.get_pixel(0, 0), Rgba([0, 0, 0, 0]));

        scene.detach_camera(root);
        assert_eq!(scene.camera_count(), 0);
    }
}
