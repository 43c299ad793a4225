//! Tunables for catalog search, clustering and rig construction.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// Main surface camera configuration.
///
/// Every field has a default, so a JSON file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceCameraConfig {
    /// Lowercase suffix a scene object's name must end with to be listed.
    pub name_suffix: String,
    /// Minimum object name length (in characters) to be listed.
    pub min_name_len: usize,
    /// Normal components with magnitude below this are snapped to exactly zero.
    pub snap_epsilon: f32,
    /// Decimal places kept when keying normal clusters.
    pub normal_key_decimals: u32,
    /// Uniform local scale of the rig anchor.
    pub anchor_scale: f32,
    /// Name given to rig anchors created in the scene.
    pub anchor_name: String,
    /// Camera draw order; above the main camera so it renders after it.
    pub camera_depth: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    /// Depth buffer precision of allocated render targets.
    pub depth_bits: u32,
    /// Roll (degrees) a fresh selection state starts with.
    pub default_roll: f32,
    /// Field of view (degrees) a fresh selection state starts with.
    pub default_fov: f32,
    pub roll_min: f32,
    pub roll_max: f32,
    pub fov_min: f32,
    pub fov_max: f32,
}

impl Default for SurfaceCameraConfig {
    fn default() -> Self {
        Self {
            name_suffix: ".menu".to_string(),
            min_name_len: 6,
            snap_epsilon: 0.01,
            normal_key_decimals: 2,
            anchor_scale: 0.03,
            anchor_name: "SurfaceCameraRig".to_string(),
            camera_depth: 9.0,
            near_clip: 0.01,
            far_clip: 1000.0,
            depth_bits: 24,
            default_roll: 0.0,
            default_fov: 36.0,
            roll_min: 0.0,
            roll_max: 360.0,
            fov_min: 0.0,
            fov_max: 100.0,
        }
    }
}

impl SurfaceCameraConfig {
    /// Load overrides from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Match objects by a different name suffix.
    pub fn with_name_suffix(mut self, suffix: &str) -> Self {
        self.name_suffix = suffix.to_lowercase();
        self
    }

    pub fn with_snap_epsilon(mut self, epsilon: f32) -> Self {
        self.snap_epsilon = epsilon;
        self
    }

    pub fn with_normal_key_decimals(mut self, decimals: u32) -> Self {
        self.normal_key_decimals = decimals;
        self
    }

    pub fn with_camera_depth(mut self, depth: f32) -> Self {
        self.camera_depth = depth;
        self
    }

    pub fn roll_range(&self) -> RangeInclusive<f32> {
        self.roll_min..=self.roll_max
    }

    pub fn fov_range(&self) -> RangeInclusive<f32> {
        self.fov_min..=self.fov_max
    }

    pub fn clamp_roll(&self, roll: f32) -> f32 {
        clamp_to(roll, self.roll_range())
    }

    pub fn clamp_fov(&self, fov: f32) -> f32 {
        clamp_to(fov, self.fov_range())
    }
}

fn clamp_to(value: f32, range: RangeInclusive<f32>) -> f32 {
    let (lo, hi) = range.into_inner();
    if value.is_nan() {
        lo
    } else {
        value.max(lo).min(hi)
    }
}
