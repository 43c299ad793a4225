//! Selection state and the command methods a front end drives.
//!
//! The front end owns a [`SelectionState`] and passes it into each command. The
//! [`SurfaceCamera`] itself only keeps configuration, the catalog generation counter
//! and the single live rig.
//!
//! Two selection chains exist side by side:
//!
//! - camera chain: object, then material slot, then face normal
//! - display chain: object, then material slot
//!
//! Choosing something upstream clears everything below it on the same chain.
//! [`SurfaceCamera::apply`] places the rig and binds the display once both chains are
//! complete.

use crate::catalog::{
    find_candidate_objects, find_material_slots, Catalog, MaterialSlot, ObjectHandle, Stamped,
};
use crate::config::SurfaceCameraConfig;
use crate::display::{bind_display, destination_uv_bounds};
use crate::error::{Result, SurfaceCameraError};
use crate::host::Host;
use crate::normals::{compute_normal_clusters, NormalCluster};
use crate::rig::{CameraRig, RigSlot};
use crate::types::{Generation, TargetId};

/// Choices on the camera side.
#[derive(Debug, Clone, Default)]
pub struct CameraChain {
    pub object: Option<String>,
    pub materials: Catalog<MaterialSlot>,
    pub material: Option<String>,
    pub normals: Catalog<NormalCluster>,
    pub normal: Option<String>,
}

impl CameraChain {
    /// The chosen cluster, if the chain is complete.
    pub fn selected(&self) -> Option<&NormalCluster> {
        self.normal.as_deref().and_then(|key| self.normals.get(key))
    }
}

/// Choices on the display side.
#[derive(Debug, Clone, Default)]
pub struct DisplayChain {
    pub object: Option<String>,
    pub materials: Catalog<MaterialSlot>,
    pub material: Option<String>,
}

impl DisplayChain {
    pub fn selected(&self) -> Option<&MaterialSlot> {
        self.material.as_deref().and_then(|key| self.materials.get(key))
    }
}

/// Everything the user has picked so far.
#[derive(Debug, Clone)]
pub struct SelectionState {
    pub objects: Catalog<ObjectHandle>,
    pub camera: CameraChain,
    pub display: DisplayChain,
    /// Degrees about the camera's forward axis.
    pub roll: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
}

impl SelectionState {
    pub fn new(config: &SurfaceCameraConfig) -> Self {
        Self {
            objects: Catalog::default(),
            camera: CameraChain::default(),
            display: DisplayChain::default(),
            roll: config.clamp_roll(config.default_roll),
            fov: config.clamp_fov(config.default_fov),
        }
    }

    /// True once a face normal is chosen.
    pub fn camera_ready(&self) -> bool {
        self.camera.selected().is_some()
    }

    /// True once a destination material slot is chosen.
    pub fn display_ready(&self) -> bool {
        self.display.selected().is_some()
    }
}

/// The surface camera controller.
#[derive(Debug)]
pub struct SurfaceCamera {
    config: SurfaceCameraConfig,
    generation: Generation,
    rig: RigSlot,
}

impl SurfaceCamera {
    pub fn new(config: SurfaceCameraConfig) -> Self {
        Self {
            config,
            generation: Generation::default(),
            rig: RigSlot::new(),
        }
    }

    pub fn config(&self) -> &SurfaceCameraConfig {
        &self.config
    }

    /// Generation of the current object catalog.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The live rig, if one has been placed.
    pub fn rig(&self) -> Option<&CameraRig> {
        self.rig.get()
    }

    /// A fresh selection state using the configured roll and fov defaults.
    pub fn new_state(&self) -> SelectionState {
        SelectionState::new(&self.config)
    }

    /// Re-run the object search.
    ///
    /// Starts a new catalog generation, so every handle issued before is stale, and
    /// clears both selection chains. The live rig is left in place.
    pub fn search_objects<'s, H: Host + ?Sized>(
        &mut self,
        host: &H,
        state: &'s mut SelectionState,
    ) -> &'s Catalog<ObjectHandle> {
        self.generation = self.generation.next();
        state.objects = find_candidate_objects(host, &self.config, self.generation);
        state.camera = CameraChain::default();
        state.display = DisplayChain::default();
        &state.objects
    }

    /// Pick the object the camera will sit on and list its material slots.
    pub fn on_object_chosen<'s, H: Host + ?Sized>(
        &mut self,
        host: &H,
        state: &'s mut SelectionState,
        key: &str,
    ) -> Result<&'s Catalog<MaterialSlot>> {
        let object = state.objects.require(key)?;
        let materials = find_material_slots(host, object, self.generation)?;
        state.camera = CameraChain {
            object: Some(key.to_string()),
            materials,
            ..CameraChain::default()
        };
        Ok(&state.camera.materials)
    }

    /// Pick the camera's material slot and cluster its face normals.
    pub fn on_material_chosen<'s, H: Host + ?Sized>(
        &mut self,
        host: &H,
        state: &'s mut SelectionState,
        key: &str,
    ) -> Result<&'s Catalog<NormalCluster>> {
        let chain = &mut state.camera;
        if chain.object.is_none() {
            return Err(SurfaceCameraError::MissingSelection("camera object"));
        }
        let slot = chain.materials.require(key)?;
        let normals = compute_normal_clusters(host, slot, &self.config, self.generation)?;
        chain.material = Some(key.to_string());
        chain.normals = normals;
        chain.normal = None;
        Ok(&chain.normals)
    }

    /// Pick the face the camera looks along.
    pub fn on_normal_chosen(&mut self, state: &mut SelectionState, key: &str) -> Result<()> {
        let chain = &mut state.camera;
        if chain.material.is_none() {
            return Err(SurfaceCameraError::MissingSelection("camera material"));
        }
        chain.normals.require(key)?;
        chain.normal = Some(key.to_string());
        Ok(())
    }

    /// Pick the object the picture is shown on and list its material slots.
    pub fn on_display_object_chosen<'s, H: Host + ?Sized>(
        &mut self,
        host: &H,
        state: &'s mut SelectionState,
        key: &str,
    ) -> Result<&'s Catalog<MaterialSlot>> {
        let object = state.objects.require(key)?;
        let materials = find_material_slots(host, object, self.generation)?;
        state.display = DisplayChain {
            object: Some(key.to_string()),
            materials,
            material: None,
        };
        Ok(&state.display.materials)
    }

    /// Pick the material slot that will show the picture.
    pub fn on_display_chosen(&mut self, state: &mut SelectionState, key: &str) -> Result<()> {
        let chain = &mut state.display;
        if chain.object.is_none() {
            return Err(SurfaceCameraError::MissingSelection("display object"));
        }
        chain.materials.require(key)?;
        chain.material = Some(key.to_string());
        Ok(())
    }

    /// Set the roll, clamped into the configured range. Returns the stored value.
    pub fn set_roll(&self, state: &mut SelectionState, roll: f32) -> f32 {
        state.roll = self.config.clamp_roll(roll);
        state.roll
    }

    /// Set the field of view, clamped into the configured range.
    pub fn set_fov(&self, state: &mut SelectionState, fov: f32) -> f32 {
        state.fov = self.config.clamp_fov(fov);
        state.fov
    }

    /// Place the rig for the chosen normal and bind it to the chosen display slot.
    ///
    /// Both chains must be complete. Geometry on both sides and the destination's
    /// texture are checked before the live rig is touched, so a bad choice leaves the
    /// previous rig working.
    pub fn apply<H: Host + ?Sized>(&mut self, host: &mut H, state: &SelectionState) -> Result<TargetId> {
        let cluster = *state
            .camera
            .selected()
            .ok_or(SurfaceCameraError::MissingSelection("camera normal"))?;
        let dest = *state
            .display
            .selected()
            .ok_or(SurfaceCameraError::MissingSelection("display material"))?;

        dest.ensure_current(self.generation)?;
        destination_uv_bounds(host, &dest)?;
        host.texture_size(dest.material)?;

        self.rig
            .place(host, &cluster, state.roll, &self.config, self.generation)?;
        let rig = self.rig.get_mut().ok_or(SurfaceCameraError::NoRig)?;
        bind_display(host, rig, &dest, state.fov, &self.config, self.generation)
    }

    /// Remove the live rig and its binding, if any.
    pub fn teardown<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        self.rig.teardown(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryScene, RenderHost};
    use crate::normals::{face_normal, snap_to_zero};
    use crate::mesh::MeshBuilder;
    use crate::types::{TextureRef, Transform};
    use glam::{Vec2, Vec3};
    use std::sync::Arc;

    /// "Body.Menu" with a box (material "Body"); "Phone.menu" with a screen quad
    /// covering UV (0..0.5, 0..0.5) and an empty submesh; an unrelated "Light".
    fn scene() -> MemoryScene {
        let mut scene = MemoryScene::new();
        let screen_tex = scene.add_texture("screen", 256, 128);
        let body = scene.add_material("Body", TextureRef::None);
        let glass = scene.add_material("Glass", TextureRef::Texture(screen_tex));
        let frame = scene.add_material("Frame", TextureRef::Texture(screen_tex));

        scene.add_object("Light", None, Transform::IDENTITY).unwrap();
        let body_obj = scene
            .add_object("Body.Menu", None, Transform::IDENTITY.with_euler_degrees(0.0, 90.0, 0.0))
            .unwrap();
        let mut cube = MeshBuilder::new();
        cube.add_box(0, Vec3::ZERO, Vec3::splat(0.5));
        scene
            .add_surface(body_obj, Some(Arc::new(cube.build().unwrap())), vec![body])
            .unwrap();

        let phone = scene
            .add_object("Phone.menu", None, Transform::from_position(Vec3::new(0.0, 0.0, 3.0)))
            .unwrap();
        let mut quad = MeshBuilder::new();
        let v: Vec<u32> = [
            (Vec3::ZERO, Vec2::ZERO),
            (Vec3::X, Vec2::new(0.5, 0.0)),
            (Vec3::new(1.0, 1.0, 0.0), Vec2::new(0.5, 0.5)),
            (Vec3::Y, Vec2::new(0.0, 0.5)),
        ]
        .into_iter()
        .map(|(p, uv)| quad.add_vertex(p, uv))
        .collect();
        quad.add_quad(0, v[0], v[1], v[2], v[3]);
        quad.ensure_submesh(1);
        scene
            .add_surface(phone, Some(Arc::new(quad.build().unwrap())), vec![glass, frame])
            .unwrap();
        scene
    }

    fn choose_all(camera: &mut SurfaceCamera, scene: &MemoryScene, state: &mut SelectionState) {
        camera.search_objects(scene, state);
        camera.on_object_chosen(scene, state, "[1]Body.Menu").unwrap();
        camera.on_material_chosen(scene, state, "[0-0]Body").unwrap();
        camera.on_normal_chosen(state, "0.00-0.00-1.00").unwrap();
        camera.on_display_object_chosen(scene, state, "[2]Phone.menu").unwrap();
        camera.on_display_chosen(state, "[0-0]Glass").unwrap();
    }

    #[test]
    fn test_end_to_end() {
        let mut scene = scene();
        let mut camera = SurfaceCamera::new(SurfaceCameraConfig::default());
        let mut state = camera.new_state();
        assert_eq!(state.fov, 36.0);
        assert_eq!(state.roll, 0.0);

        let keys: Vec<String> = camera
            .search_objects(&scene, &mut state)
            .keys()
            .map(str::to_string)
            .collect();
        assert_eq!(keys, vec!["[1]Body.Menu", "[2]Phone.menu"]);

        let slots = camera.on_object_chosen(&scene, &mut state, "[1]Body.Menu").unwrap();
        assert_eq!(slots.keys().collect::<Vec<_>>(), vec!["[0-0]Body"]);

        let normals = camera.on_material_chosen(&scene, &mut state, "[0-0]Body").unwrap();
        assert_eq!(normals.len(), 6);
        assert!(!state.camera_ready());

        camera.on_normal_chosen(&mut state, "0.00-0.00-1.00").unwrap();
        assert!(state.camera_ready());
        assert!(!state.display_ready());

        camera
            .on_display_object_chosen(&scene, &mut state, "[2]Phone.menu")
            .unwrap();
        camera.on_display_chosen(&mut state, "[0-0]Glass").unwrap();
        assert!(state.display_ready());

        camera.set_fov(&mut state, 60.0);
        let target = camera.apply(&mut scene, &state).unwrap();

        let rig = camera.rig().unwrap();
        assert_eq!(rig.render_target(), Some(target));
        let settings = scene.camera(rig.anchor).unwrap();
        assert_eq!(settings.fov, 60.0);
        assert_eq!(settings.viewport.width, 0.5);
        assert_eq!(settings.viewport.height, 0.5);

        let rt = scene.render_target(target).unwrap();
        assert_eq!((rt.width(), rt.height()), (256, 128));
        let glass = state.display.selected().unwrap().material;
        assert_eq!(scene.material_texture(glass).unwrap(), TextureRef::RenderTarget(target));
    }

    #[test]
    fn test_apply_replaces_rig() {
        let mut scene = scene();
        let mut camera = SurfaceCamera::new(SurfaceCameraConfig::default());
        let mut state = camera.new_state();
        choose_all(&mut camera, &scene, &mut state);

        let first = camera.apply(&mut scene, &state).unwrap();
        let first_anchor = camera.rig().unwrap().anchor;

        camera.on_normal_chosen(&mut state, "1.00-0.00-0.00").unwrap();
        camera.set_roll(&mut state, 90.0);
        let second = camera.apply(&mut scene, &state).unwrap();

        assert_ne!(first, second);
        assert!(!scene.contains(first_anchor));
        assert_eq!(scene.camera_count(), 1);
        assert_eq!(scene.pending_releases(), vec![first]);
        assert_eq!(camera.rig().unwrap().placement.roll, 90.0);

        camera.teardown(&mut scene).unwrap();
        assert!(camera.rig().is_none());
        assert_eq!(scene.camera_count(), 0);
        let glass = state.display.selected().unwrap().material;
        assert!(matches!(scene.material_texture(glass).unwrap(), TextureRef::Texture(_)));
    }

    #[test]
    fn test_degenerate_display_keeps_rig() {
        let mut scene = scene();
        let mut camera = SurfaceCamera::new(SurfaceCameraConfig::default());
        let mut state = camera.new_state();
        choose_all(&mut camera, &scene, &mut state);
        let target = camera.apply(&mut scene, &state).unwrap();
        let anchor = camera.rig().unwrap().anchor;

        camera.on_display_chosen(&mut state, "[0-1]Frame").unwrap();
        let err = camera.apply(&mut scene, &state).unwrap_err();
        assert!(matches!(err, SurfaceCameraError::DegenerateGeometry(_)));
        assert_eq!(camera.rig().unwrap().anchor, anchor);
        assert_eq!(camera.rig().unwrap().render_target(), Some(target));
    }

    #[test]
    fn test_untextured_display_keeps_rig() {
        let mut scene = scene();
        let mut camera = SurfaceCamera::new(SurfaceCameraConfig::default());
        let mut state = camera.new_state();
        choose_all(&mut camera, &scene, &mut state);
        let target = camera.apply(&mut scene, &state).unwrap();
        let anchor = camera.rig().unwrap().anchor;
        let objects_before = scene.object_count();

        // "Body" has UVs but no texture to size a target from
        camera
            .on_display_object_chosen(&scene, &mut state, "[1]Body.Menu")
            .unwrap();
        camera.on_display_chosen(&mut state, "[0-0]Body").unwrap();
        let err = camera.apply(&mut scene, &state).unwrap_err();

        assert!(matches!(err, SurfaceCameraError::MissingTexture(_)));
        assert_eq!(camera.rig().unwrap().anchor, anchor);
        assert_eq!(camera.rig().unwrap().render_target(), Some(target));
        assert_eq!(scene.object_count(), objects_before);
        assert!(scene.camera(anchor).is_some());
    }

    #[test]
    fn test_single_triangle_scene() {
        let mut scene = MemoryScene::new();
        let skin = scene.add_material("Skin", TextureRef::None);
        let body = scene.add_object("Body.Menu", None, Transform::IDENTITY).unwrap();
        let corners = [Vec3::ZERO, Vec3::X, Vec3::new(0.0, 1.0, 0.005)];
        let mut builder = MeshBuilder::new();
        let v: Vec<u32> = corners.iter().map(|&p| builder.add_vertex(p, Vec2::ZERO)).collect();
        builder.add_triangle(0, v[0], v[1], v[2]);
        scene
            .add_surface(body, Some(Arc::new(builder.build().unwrap())), vec![skin])
            .unwrap();

        let mut camera = SurfaceCamera::new(SurfaceCameraConfig::default());
        let mut state = camera.new_state();

        let objects = camera.search_objects(&scene, &mut state);
        assert_eq!(objects.keys().collect::<Vec<_>>(), vec!["[0]Body.Menu"]);

        let slots = camera.on_object_chosen(&scene, &mut state, "[0]Body.Menu").unwrap();
        assert_eq!(slots.keys().collect::<Vec<_>>(), vec!["[0-0]Skin"]);

        let normals = camera.on_material_chosen(&scene, &mut state, "[0-0]Skin").unwrap();
        assert_eq!(normals.len(), 1);
        let expected = snap_to_zero(face_normal(corners[0], corners[1], corners[2]), 0.01);
        let cluster = normals.get("0.00-0.00-1.00").unwrap();
        assert_eq!(cluster.normal, expected);
        assert_eq!(cluster.normal.y, 0.0);
    }

    #[test]
    fn test_upstream_choice_clears_downstream() {
        let scene = scene();
        let mut camera = SurfaceCamera::new(SurfaceCameraConfig::default());
        let mut state = camera.new_state();
        choose_all(&mut camera, &scene, &mut state);

        camera.on_material_chosen(&scene, &mut state, "[0-0]Body").unwrap();
        assert!(state.camera.normal.is_none());
        assert!(state.display_ready());

        camera.on_object_chosen(&scene, &mut state, "[1]Body.Menu").unwrap();
        assert!(state.camera.material.is_none());
        assert!(state.camera.normals.is_empty());

        camera.search_objects(&scene, &mut state);
        assert!(state.camera.object.is_none());
        assert!(state.display.object.is_none());
        assert!(state.display.materials.is_empty());
    }

    #[test]
    fn test_missing_selections() {
        let mut scene = scene();
        let mut camera = SurfaceCamera::new(SurfaceCameraConfig::default());
        let mut state = camera.new_state();
        camera.search_objects(&scene, &mut state);

        assert!(matches!(
            camera.on_material_chosen(&scene, &mut state, "[0-0]Body"),
            Err(SurfaceCameraError::MissingSelection(_))
        ));
        assert!(matches!(
            camera.on_normal_chosen(&mut state, "0.00-0.00-1.00"),
            Err(SurfaceCameraError::MissingSelection(_))
        ));
        assert!(matches!(
            camera.on_display_chosen(&mut state, "[0-0]Glass"),
            Err(SurfaceCameraError::MissingSelection(_))
        ));
        assert!(matches!(
            camera.apply(&mut scene, &state),
            Err(SurfaceCameraError::MissingSelection("camera normal"))
        ));
        assert!(matches!(
            camera.on_object_chosen(&scene, &mut state, "[0]Light"),
            Err(SurfaceCameraError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_research_makes_handles_stale() {
        let scene = scene();
        let mut camera = SurfaceCamera::new(SurfaceCameraConfig::default());
        let mut state = camera.new_state();
        choose_all(&mut camera, &scene, &mut state);

        let old_slot = *state.camera.materials.require("[0-0]Body").unwrap();
        let old_cluster = *state.camera.selected().unwrap();
        camera.search_objects(&scene, &mut state);

        assert!(matches!(
            old_slot.ensure_current(camera.generation()),
            Err(SurfaceCameraError::StaleHandle { .. })
        ));
        assert!(compute_normal_clusters(&scene, &old_slot, camera.config(), camera.generation()).is_err());
        assert!(old_cluster.ensure_current(camera.generation()).is_err());

        // Same keys resolve again in the new generation
        let slots = camera.on_object_chosen(&scene, &mut state, "[1]Body.Menu").unwrap();
        assert!(slots.require("[0-0]Body").unwrap().ensure_current(camera.generation()).is_ok());
    }

    #[test]
    fn test_roll_and_fov_clamped() {
        let camera = SurfaceCamera::new(SurfaceCameraConfig::default());
        let mut state = camera.new_state();
        assert_eq!(camera.set_roll(&mut state, 720.0), 360.0);
        assert_eq!(camera.set_fov(&mut state, -5.0), 0.0);
        assert_eq!(camera.set_fov(&mut state, 75.0), 75.0);
    }
}
