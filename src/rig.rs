//! Camera rig construction.
//!
//! A rig is an invisible anchor object parented under the source surface's object,
//! placed at the center of the submesh's local bounds and turned to look along the
//! chosen face normal. That parent's world rotation is neutralized while the anchor is
//! oriented, so position and rotation both land in the parent's frame, and restored
//! afterwards by [`RotationOverride`] on every exit path.

use crate::catalog::{MaterialSlot, Stamped};
use crate::config::SurfaceCameraConfig;
use crate::display::{unbind_display, DisplayBinding};
use crate::error::{Result, SurfaceCameraError};
use crate::extent::{local_bounds, require_geometry, Bounds3};
use crate::host::{Host, TransformHost};
use crate::normals::NormalCluster;
use crate::types::{look_rotation, mesh_to_camera_axes, CameraSettings, Generation, ObjectId, TargetId};
use glam::{Quat, Vec3};

/// Scoped reset of an object's world rotation to identity.
///
/// The rotation captured on creation is written back when the guard drops.
pub struct RotationOverride<'a, H: TransformHost + ?Sized> {
    host: &'a mut H,
    object: ObjectId,
    saved: Quat,
}

impl<'a, H: TransformHost + ?Sized> RotationOverride<'a, H> {
    pub fn new(host: &'a mut H, object: ObjectId) -> Result<Self> {
        let saved = host.world_rotation(object)?;
        host.set_world_rotation(object, Quat::IDENTITY)?;
        Ok(Self {
            host,
            object,
            saved,
        })
    }

    /// The host, for work done while the override is in effect.
    pub fn host(&mut self) -> &mut H {
        self.host
    }

    pub fn saved(&self) -> Quat {
        self.saved
    }
}

impl<H: TransformHost + ?Sized> Drop for RotationOverride<'_, H> {
    fn drop(&mut self) {
        if let Err(e) = self.host.set_world_rotation(self.object, self.saved) {
            log::error!("Failed to restore rotation of {:?}: {}", self.object, e);
        }
    }
}

/// Everything needed to build a rig, computed before the scene is touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub source: NormalCluster,
    pub bounds: Bounds3,
    /// Anchor position in the parent's local space (axis-remapped bounds center).
    pub local_position: Vec3,
    /// Unit look direction (axis-remapped face normal).
    pub forward: Vec3,
    /// Roll about `forward`, in degrees.
    pub roll: f32,
}

impl Placement {
    /// World rotation of the anchor while the owner sits at identity.
    pub fn rotation(&self) -> Result<Quat> {
        let look = look_rotation(self.forward, Vec3::Y).ok_or_else(|| {
            SurfaceCameraError::DegenerateGeometry("face normal has no direction".to_string())
        })?;
        Ok(Quat::from_axis_angle(self.forward, self.roll.to_radians()) * look)
    }
}

/// Work out where a rig for `cluster` would go, without touching the scene.
///
/// Fails with [`SurfaceCameraError::DegenerateGeometry`] when the submesh has no
/// triangles (or no mesh) or the normal has no usable direction.
pub fn prepare_placement<H: Host + ?Sized>(
    host: &H,
    cluster: &NormalCluster,
    roll: f32,
    generation: Generation,
) -> Result<Placement> {
    cluster.ensure_current(generation)?;
    let slot = &cluster.slot;

    let mesh = host.surface_mesh(slot.surface)?.ok_or_else(|| {
        SurfaceCameraError::DegenerateGeometry(format!("surface {:?} has no mesh", slot.surface))
    })?;
    let bounds = require_geometry(
        local_bounds(&mesh, slot.submesh)?,
        &format!("submesh {}", slot.submesh),
    )?;

    let forward = mesh_to_camera_axes(cluster.normal)
        .try_normalize()
        .ok_or_else(|| {
            SurfaceCameraError::DegenerateGeometry("face normal has no direction".to_string())
        })?;

    Ok(Placement {
        source: *cluster,
        bounds,
        local_position: mesh_to_camera_axes(bounds.center()),
        forward,
        roll,
    })
}

/// A placed camera anchor and, once bound, its render-to-texture camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub anchor: ObjectId,
    /// Object the anchor is parented under (the source surface's object). Its rotation
    /// is neutralized during placement.
    pub parent: ObjectId,
    /// Catalog object the source slot was found under.
    pub owner: ObjectId,
    pub placement: Placement,
    pub(crate) binding: Option<DisplayBinding>,
}

impl Stamped for CameraRig {
    fn generation(&self) -> Generation {
        self.placement.source.generation()
    }
}

impl CameraRig {
    pub fn source_slot(&self) -> &MaterialSlot {
        &self.placement.source.slot
    }

    pub fn binding(&self) -> Option<&DisplayBinding> {
        self.binding.as_ref()
    }

    pub fn camera(&self) -> Option<&CameraSettings> {
        self.binding.as_ref().map(|b| &b.camera)
    }

    pub fn render_target(&self) -> Option<TargetId> {
        self.binding.as_ref().map(|b| b.target)
    }
}

/// Create the anchor for a prepared placement.
pub fn build_rig<H: Host + ?Sized>(
    host: &mut H,
    placement: Placement,
    config: &SurfaceCameraConfig,
) -> Result<CameraRig> {
    let slot = placement.source.slot;
    let rotation = placement.rotation()?;

    let mut guard = RotationOverride::new(host, slot.surface_node)?;
    let host = guard.host();

    let anchor = host.create_child(slot.surface_node, &config.anchor_name)?;
    if let Err(e) = orient_anchor(host, anchor, &placement, rotation, config) {
        if let Err(cleanup) = host.destroy_object(anchor) {
            log::warn!("Failed to remove half-built anchor {:?}: {}", anchor, cleanup);
        }
        return Err(e);
    }
    drop(guard);

    log::info!(
        "Placed camera rig {:?} at {:?} looking {:?} (roll {})",
        anchor,
        placement.local_position,
        placement.forward,
        placement.roll
    );

    Ok(CameraRig {
        anchor,
        parent: slot.surface_node,
        owner: slot.object,
        placement,
        binding: None,
    })
}

fn orient_anchor<H: Host + ?Sized>(
    host: &mut H,
    anchor: ObjectId,
    placement: &Placement,
    rotation: Quat,
    config: &SurfaceCameraConfig,
) -> Result<()> {
    host.set_local_scale(anchor, Vec3::splat(config.anchor_scale))?;
    host.set_local_position(anchor, placement.local_position)?;
    host.set_world_rotation(anchor, rotation)?;
    Ok(())
}

/// Place a camera for `cluster`, replacing whatever rig `rigs` holds.
///
/// See [`RigSlot::place`] for the ordering guarantees.
pub fn place_camera<'r, H: Host + ?Sized>(
    host: &mut H,
    rigs: &'r mut RigSlot,
    cluster: &NormalCluster,
    roll: f32,
    config: &SurfaceCameraConfig,
    generation: Generation,
) -> Result<&'r CameraRig> {
    rigs.place(host, cluster, roll, config, generation)
}

/// Remove a rig from the scene: its display binding first, then the anchor.
pub fn teardown_rig<H: Host + ?Sized>(host: &mut H, mut rig: CameraRig) -> Result<()> {
    unbind_display(host, &mut rig)?;
    host.destroy_object(rig.anchor)?;
    log::info!("Removed camera rig {:?}", rig.anchor);
    Ok(())
}

/// Holder for the single live rig.
#[derive(Debug, Default)]
pub struct RigSlot {
    current: Option<CameraRig>,
}

impl RigSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&CameraRig> {
        self.current.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut CameraRig> {
        self.current.as_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Replace the live rig with one for `cluster`.
    ///
    /// The placement is validated first; if it fails the existing rig stays. Otherwise
    /// the existing rig is torn down before the new anchor is created.
    pub fn place<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        cluster: &NormalCluster,
        roll: f32,
        config: &SurfaceCameraConfig,
        generation: Generation,
    ) -> Result<&CameraRig> {
        let placement = prepare_placement(host, cluster, roll, generation)?;
        self.teardown(host)?;
        let rig = build_rig(host, placement, config)?;
        Ok(self.current.insert(rig))
    }

    /// Tear down the live rig, if any.
    pub fn teardown<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        match self.current.take() {
            Some(rig) => teardown_rig(host, rig),
            None => Ok(()),
        }
    }
}
