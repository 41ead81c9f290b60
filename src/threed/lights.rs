//! Lights
//!
//! Every light defaults to white at full intensity (ambient: 0.1) and is
//! named after its type.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::object3d::{impl_scene_object, Object3D};
use super::transform::Vector3;

/// Default light color.
pub const COLOR_DEFAULT_WHITE: &str = "#ffffff";

fn default_color() -> String {
    COLOR_DEFAULT_WHITE.to_string()
}

const fn default_intensity() -> f64 {
    1.0
}

const fn default_decay() -> f64 {
    2.0
}

fn default_angle() -> f64 {
    PI / 3.0
}

/// Light that illuminates every object in the scene equally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbientLight {
    #[serde(flatten)]
    base: Object3D,
    /// CSS color
    #[serde(default = "default_color")]
    pub color: String,
    /// Intensity in `[0, 1]`
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

impl AmbientLight {
    /// Create a white ambient light with intensity 0.1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Object3D::new("AmbientLight"),
            color: default_color(),
            intensity: 0.1,
        }
    }
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self::new()
    }
}

/// Light emitted in one direction from infinitely far away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalLight {
    #[serde(flatten)]
    base: Object3D,
    /// Point the light is aimed at
    #[serde(default)]
    pub target: Vector3,
    /// CSS color
    #[serde(default = "default_color")]
    pub color: String,
    /// Intensity in `[0, 1]`
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

impl DirectionalLight {
    /// Create a white directional light aimed at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Object3D::new("DirectionalLight"),
            target: Vector3::ZERO,
            color: default_color(),
            intensity: default_intensity(),
        }
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new()
    }
}

/// Light emitted in all directions from a single point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointLight {
    #[serde(flatten)]
    base: Object3D,
    /// Distance at which the intensity reaches zero; 0 means no limit
    #[serde(default)]
    pub distance: f64,
    /// How much the light dims along its distance
    #[serde(default = "default_decay")]
    pub decay: f64,
    /// CSS color
    #[serde(default = "default_color")]
    pub color: String,
    /// Intensity in `[0, 1]`
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

impl PointLight {
    /// Create a white point light with no distance limit and decay 2.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Object3D::new("PointLight"),
            distance: 0.0,
            decay: default_decay(),
            color: default_color(),
            intensity: default_intensity(),
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new()
    }
}

/// Cone of light emitted from a single point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotLight {
    #[serde(flatten)]
    base: Object3D,
    /// Point the cone is aimed at
    #[serde(default)]
    pub target: Vector3,
    /// Distance at which the intensity reaches zero; 0 means no limit
    #[serde(default)]
    pub distance: f64,
    /// How much the light dims along its distance
    #[serde(default = "default_decay")]
    pub decay: f64,
    /// Cone angle in radians
    #[serde(default = "default_angle")]
    pub angle: f64,
    /// Penumbra angle in radians
    #[serde(default)]
    pub penumbra: f64,
    /// CSS color
    #[serde(default = "default_color")]
    pub color: String,
    /// Intensity in `[0, 1]`
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

impl SpotLight {
    /// Create a white spot light aimed at the origin with a π/3 cone.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Object3D::new("SpotLight"),
            target: Vector3::ZERO,
            distance: 0.0,
            decay: default_decay(),
            angle: default_angle(),
            penumbra: 0.0,
            color: default_color(),
            intensity: default_intensity(),
        }
    }
}

impl Default for SpotLight {
    fn default() -> Self {
        Self::new()
    }
}

impl_scene_object!(AmbientLight, DirectionalLight, PointLight, SpotLight);
