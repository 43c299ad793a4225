//! Render-to-texture binding of a rig onto a destination material.
//!
//! The rig's camera renders into an offscreen target the size of the destination
//! material's texture, restricted to the rectangle the destination submesh occupies
//! in UV space. The material then samples the target instead of its texture.

use crate::catalog::{MaterialSlot, Stamped};
use crate::config::SurfaceCameraConfig;
use crate::error::{Result, SurfaceCameraError};
use crate::extent::{require_geometry, uv_bounds, Bounds2};
use crate::host::Host;
use crate::rig::CameraRig;
use crate::types::{CameraSettings, Generation, MaterialId, TargetId, TextureRef, Viewport};

/// A live render-to-texture wiring owned by a rig.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayBinding {
    pub slot: MaterialSlot,
    pub material: MaterialId,
    /// What the material sampled before the swap; put back on unbind.
    pub previous_texture: TextureRef,
    pub target: TargetId,
    pub target_size: (u32, u32),
    pub uv_bounds: Bounds2,
    pub camera: CameraSettings,
}

/// Viewport covering a UV rectangle.
pub fn uv_viewport(uv: &Bounds2) -> Viewport {
    let size = uv.size();
    Viewport::new(uv.min.x, uv.min.y, size.x, size.y)
}

/// Camera settings for rendering into `target` over the UV rectangle `uv`.
pub fn camera_settings(
    uv: &Bounds2,
    fov: f32,
    target: TargetId,
    config: &SurfaceCameraConfig,
) -> CameraSettings {
    CameraSettings {
        enabled: true,
        depth: config.camera_depth,
        near_clip: config.near_clip,
        far_clip: config.far_clip,
        fov,
        viewport: uv_viewport(uv),
        target: Some(target),
    }
}

/// UV bounds of the destination slot, failing on an empty submesh.
pub fn destination_uv_bounds<H: Host + ?Sized>(host: &H, dest: &MaterialSlot) -> Result<Bounds2> {
    let mesh = host.surface_mesh(dest.surface)?.ok_or_else(|| {
        SurfaceCameraError::DegenerateGeometry(format!("surface {:?} has no mesh", dest.surface))
    })?;
    require_geometry(uv_bounds(&mesh, dest.submesh)?, &format!("submesh {}", dest.submesh))
}

/// Point the rig's camera at a fresh offscreen target and make `dest`'s material
/// sample it.
///
/// Any previous binding of the rig is removed first, so at most one
/// render-to-texture camera exists per rig.
pub fn bind_display<H: Host + ?Sized>(
    host: &mut H,
    rig: &mut CameraRig,
    dest: &MaterialSlot,
    fov: f32,
    config: &SurfaceCameraConfig,
    generation: Generation,
) -> Result<TargetId> {
    rig.ensure_current(generation)?;
    dest.ensure_current(generation)?;

    let uv = destination_uv_bounds(host, dest)?;

    unbind_display(host, rig)?;

    let (width, height) = host.texture_size(dest.material)?;
    let target = host.create_render_target(width, height, config.depth_bits)?;
    let camera = camera_settings(&uv, fov, target, config);

    let previous_texture = match attach(host, rig, dest, target, &camera) {
        Ok(previous) => previous,
        Err(e) => {
            host.detach_camera(rig.anchor);
            host.release_render_target(target);
            return Err(e);
        }
    };

    log::info!(
        "Bound rig {:?} to material {:?} via {}x{} target {:?} (viewport {:?})",
        rig.anchor,
        dest.material,
        width,
        height,
        target,
        camera.viewport
    );

    rig.binding = Some(DisplayBinding {
        slot: *dest,
        material: dest.material,
        previous_texture,
        target,
        target_size: (width, height),
        uv_bounds: uv,
        camera,
    });
    Ok(target)
}

fn attach<H: Host + ?Sized>(
    host: &mut H,
    rig: &CameraRig,
    dest: &MaterialSlot,
    target: TargetId,
    camera: &CameraSettings,
) -> Result<TextureRef> {
    host.attach_camera(rig.anchor, camera.clone())?;
    let previous = host.material_texture(dest.material)?;
    host.set_material_texture(dest.material, TextureRef::RenderTarget(target))?;
    Ok(previous)
}

/// Undo the rig's display binding, if any: detach the camera, give the material
/// back its previous texture and hand the target to the host for release.
pub fn unbind_display<H: Host + ?Sized>(host: &mut H, rig: &mut CameraRig) -> Result<()> {
    let Some(binding) = rig.binding.take() else {
        return Ok(());
    };

    host.detach_camera(rig.anchor);
    // Leave the material alone if something else has been assigned since
    if host.material_texture(binding.material)? == TextureRef::RenderTarget(binding.target) {
        host.set_material_texture(binding.material, binding.previous_texture)?;
    }
    host.release_render_target(binding.target);

    log::info!(
        "Unbound rig {:?} from material {:?}",
        rig.anchor,
        binding.material
    );
    Ok(())
}
