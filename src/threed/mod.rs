//! 3D scene nodes
//!
//! Declarative scene-graph nodes consumed by a 3D viewer. Nodes validate
//! their attributes on construction and serialize to camelCase dicts tagged
//! with `_type`:
//!
//! ```text
//! {"_type": "PointLight", "name": "PointLight", "visible": true,
//!  "position": [0, 0, 0], "scale": [1, 1, 1], "quaternion": [0, 0, 0, 1],
//!  "children": [], "distance": 0.0, "decay": 2.0, ...}
//! ```
//!
//! # Example
//!
//! ```rust
//! use trueno_runs::threed::{GltfMesh, Node, PointLight, SceneObject, Vector3};
//!
//! let car = GltfMesh::new("car", "models/car.glb")?
//!     .at(Vector3::new(0.0, 0.5, 0.0))
//!     .with_child(PointLight::new().named("headlight"));
//!
//! let node = Node::from(car);
//! let restored = Node::from_dict(node.to_dict()?)?;
//! assert_eq!(restored, node);
//! # Ok::<(), trueno_runs::Error>(())
//! ```

mod lights;
mod material;
mod mesh;
mod object3d;
mod pointcloud;
mod transform;

pub use lights::{AmbientLight, DirectionalLight, PointLight, SpotLight, COLOR_DEFAULT_WHITE};
pub use material::{PointCloudMaterial, ShadingMode};
pub use mesh::{FbxMesh, GltfMesh, ObjMesh, PlyMesh, StlMesh};
pub use object3d::{Object3D, SceneObject};
pub use pointcloud::PointCloud;
pub use transform::{Quaternion, Vector3};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Any scene node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Node {
    /// Ambient light
    AmbientLight(AmbientLight),
    /// Directional light
    DirectionalLight(DirectionalLight),
    /// Point light
    PointLight(PointLight),
    /// Spot light
    SpotLight(SpotLight),
    /// OBJ mesh
    ObjMesh(ObjMesh),
    /// FBX mesh
    #[serde(rename = "FBXMesh")]
    FbxMesh(FbxMesh),
    /// glTF mesh
    #[serde(rename = "GLTFMesh")]
    GltfMesh(GltfMesh),
    /// PLY mesh
    PlyMesh(PlyMesh),
    /// STL mesh
    StlMesh(StlMesh),
    /// Point cloud
    PointCloud(PointCloud),
}

impl Node {
    /// Borrow the base properties.
    #[must_use]
    pub fn object(&self) -> &Object3D {
        match self {
            Self::AmbientLight(n) => n.object(),
            Self::DirectionalLight(n) => n.object(),
            Self::PointLight(n) => n.object(),
            Self::SpotLight(n) => n.object(),
            Self::ObjMesh(n) => n.object(),
            Self::FbxMesh(n) => n.object(),
            Self::GltfMesh(n) => n.object(),
            Self::PlyMesh(n) => n.object(),
            Self::StlMesh(n) => n.object(),
            Self::PointCloud(n) => n.object(),
        }
    }

    /// Node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.object().name
    }

    /// Type tag written as `_type`.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::AmbientLight(_) => "AmbientLight",
            Self::DirectionalLight(_) => "DirectionalLight",
            Self::PointLight(_) => "PointLight",
            Self::SpotLight(_) => "SpotLight",
            Self::ObjMesh(_) => "ObjMesh",
            Self::FbxMesh(_) => "FBXMesh",
            Self::GltfMesh(_) => "GLTFMesh",
            Self::PlyMesh(_) => "PlyMesh",
            Self::StlMesh(_) => "StlMesh",
            Self::PointCloud(_) => "PointCloud",
        }
    }

    /// Whether this node is a light.
    #[must_use]
    pub const fn is_light(&self) -> bool {
        matches!(
            self,
            Self::AmbientLight(_)
                | Self::DirectionalLight(_)
                | Self::PointLight(_)
                | Self::SpotLight(_)
        )
    }

    /// This node followed by all its descendants, depth first.
    #[must_use]
    pub fn traverse(&self) -> Vec<&Self> {
        let mut nodes = vec![self];
        for child in &self.object().children {
            nodes.extend(child.traverse());
        }
        nodes
    }

    /// Serialize to a camelCase dict.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_dict(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse a dict produced by [`to_dict`](Self::to_dict), re-validating
    /// every node in the tree.
    ///
    /// # Errors
    ///
    /// Returns error if the dict does not parse or a node fails validation.
    pub fn from_dict(d: Value) -> Result<Self> {
        let node: Self = serde_json::from_value(d)?;
        node.validate()?;
        Ok(node)
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::ObjMesh(n) => n.validate()?,
            Self::FbxMesh(n) => n.validate()?,
            Self::GltfMesh(n) => n.validate()?,
            Self::PlyMesh(n) => n.validate()?,
            Self::StlMesh(n) => n.validate()?,
            Self::PointCloud(n) => n.validate()?,
            Self::AmbientLight(_)
            | Self::DirectionalLight(_)
            | Self::PointLight(_)
            | Self::SpotLight(_) => {}
        }

        self.object().children.iter().try_for_each(Self::validate)
    }
}

macro_rules! impl_into_node {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Node {
                fn from(node: $ty) -> Self {
                    Self::$ty(node)
                }
            }
        )*
    };
}

impl_into_node!(
    AmbientLight,
    DirectionalLight,
    PointLight,
    SpotLight,
    ObjMesh,
    FbxMesh,
    GltfMesh,
    PlyMesh,
    StlMesh,
    PointCloud,
);
