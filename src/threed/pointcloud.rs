//! Point clouds loaded from `.pcd` files

use serde::{Deserialize, Serialize};

use super::material::PointCloudMaterial;
use super::mesh::check_extension;
use super::object3d::{impl_scene_object, Object3D};
use crate::Result;

/// Point cloud from a `.pcd` file.
///
/// A scene uses at most one asset for orthographic projection; when several
/// are flagged the viewer picks the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointCloud {
    #[serde(flatten)]
    base: Object3D,
    pcd_path: String,
    #[serde(default)]
    default_material: PointCloudMaterial,
    #[serde(default)]
    flag_for_projection: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pre_transformed_pcd_path: Option<String>,
}

impl PointCloud {
    /// Create a point cloud with the default material.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// `pcd_path` is not a `.pcd` file.
    pub fn new(name: impl Into<String>, pcd_path: impl Into<String>) -> Result<Self> {
        let pcd_path = pcd_path.into();
        check_extension(&pcd_path, &[".pcd"], "Point cloud must be a .pcd file")?;
        Ok(Self {
            base: Object3D::new(name),
            pcd_path,
            default_material: PointCloudMaterial::default(),
            flag_for_projection: false,
            pre_transformed_pcd_path: None,
        })
    }

    /// Set the material.
    #[must_use]
    pub fn with_material(mut self, material: PointCloudMaterial) -> Self {
        self.default_material = material;
        self
    }

    /// Flag for orthographic projection.
    #[must_use]
    pub const fn flag_for_projection(mut self, flag: bool) -> Self {
        self.flag_for_projection = flag;
        self
    }

    /// Record a copy of the cloud with the node transform already applied.
    #[must_use]
    pub fn with_pre_transformed_pcd_path(mut self, path: impl Into<String>) -> Self {
        self.pre_transformed_pcd_path = Some(path.into());
        self
    }

    /// Replace the material.
    pub fn set_default_material(&mut self, material: PointCloudMaterial) {
        self.default_material = material;
    }

    /// Path to the `.pcd` file.
    #[must_use]
    pub fn pcd_path(&self) -> &str {
        &self.pcd_path
    }

    /// The material.
    #[must_use]
    pub const fn default_material(&self) -> &PointCloudMaterial {
        &self.default_material
    }

    /// Whether this cloud is flagged for orthographic projection.
    #[must_use]
    pub const fn is_flagged_for_projection(&self) -> bool {
        self.flag_for_projection
    }

    /// Path to the pre-transformed copy, if any.
    #[must_use]
    pub fn pre_transformed_pcd_path(&self) -> Option<&str> {
        self.pre_transformed_pcd_path.as_deref()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_extension(&self.pcd_path, &[".pcd"], "Point cloud must be a .pcd file")?;
        self.default_material.validate()
    }
}

impl_scene_object!(PointCloud);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threed::ShadingMode;

    #[test]
    fn test_requires_pcd() {
        assert!(PointCloud::new("lidar", "scan.PCD").is_ok());
        assert!(PointCloud::new("lidar", "scan.ply").is_err());
    }

    #[test]
    fn test_defaults() {
        let cloud = PointCloud::new("lidar", "scan.pcd").unwrap();
        assert!(!cloud.is_flagged_for_projection());
        assert!(cloud.pre_transformed_pcd_path().is_none());
        assert_eq!(cloud.default_material().shading_mode, ShadingMode::Height);
    }

    #[test]
    fn test_set_material() {
        let mut cloud = PointCloud::new("lidar", "scan.pcd").unwrap();
        cloud.set_default_material(PointCloudMaterial::new().with_shading_mode(ShadingMode::Rgb));
        assert_eq!(cloud.default_material().shading_mode, ShadingMode::Rgb);
    }
}
