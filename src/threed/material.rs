//! Point cloud material

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How points are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadingMode {
    /// Gradient along the height axis
    #[default]
    Height,
    /// Per-point intensity attribute
    Intensity,
    /// Per-point RGB attribute
    Rgb,
    /// One custom color for every point
    Custom,
}

/// Material used to render a point cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "PointCloudMaterial", rename_all = "camelCase")]
pub struct PointCloudMaterial {
    /// Shading mode
    #[serde(default)]
    pub shading_mode: ShadingMode,
    /// Color used by [`ShadingMode::Custom`]
    #[serde(default = "default_custom_color")]
    pub custom_color: String,
    /// Point size
    #[serde(default = "default_point_size")]
    pub point_size: f64,
    /// Shrink points with distance from the camera
    #[serde(default)]
    pub attenuate_by_distance: bool,
    #[serde(default = "default_opacity")]
    opacity: f64,
}

fn default_custom_color() -> String {
    "#ffffff".to_string()
}

const fn default_point_size() -> f64 {
    1.0
}

const fn default_opacity() -> f64 {
    1.0
}

impl Default for PointCloudMaterial {
    fn default() -> Self {
        Self {
            shading_mode: ShadingMode::default(),
            custom_color: default_custom_color(),
            point_size: default_point_size(),
            attenuate_by_distance: false,
            opacity: default_opacity(),
        }
    }
}

impl PointCloudMaterial {
    /// Height shading, size 1, fully opaque.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shading mode.
    #[must_use]
    pub const fn with_shading_mode(mut self, shading_mode: ShadingMode) -> Self {
        self.shading_mode = shading_mode;
        self
    }

    /// Use a single custom color for every point.
    #[must_use]
    pub fn with_custom_color(mut self, color: impl Into<String>) -> Self {
        self.shading_mode = ShadingMode::Custom;
        self.custom_color = color.into();
        self
    }

    /// Set the opacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `opacity` is outside `[0, 1]`.
    pub fn with_opacity(mut self, opacity: f64) -> Result<Self> {
        check_opacity(opacity)?;
        self.opacity = opacity;
        Ok(self)
    }

    /// Opacity in `[0, 1]`.
    #[must_use]
    pub const fn opacity(&self) -> f64 {
        self.opacity
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_opacity(self.opacity)
    }
}

fn check_opacity(opacity: f64) -> Result<()> {
    if (0.0..=1.0).contains(&opacity) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "opacity must be in [0, 1], got {opacity}"
        )))
    }
}
