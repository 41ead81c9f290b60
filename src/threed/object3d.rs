//! Object3D - transform and hierarchy shared by every scene node

use serde::{Deserialize, Serialize};

use super::transform::{Quaternion, Vector3};
use super::Node;

/// Base properties of a scene node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object3D {
    /// Display name
    pub name: String,
    /// Default visibility in the scene
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Position in object space
    #[serde(default)]
    pub position: Vector3,
    /// Scale in object space
    #[serde(default = "default_scale")]
    pub scale: Vector3,
    /// Rotation in object space
    #[serde(default)]
    pub quaternion: Quaternion,
    /// Child nodes, transformed relative to this one
    #[serde(default)]
    pub children: Vec<Node>,
}

const fn default_visible() -> bool {
    true
}

const fn default_scale() -> Vector3 {
    Vector3::ONE
}

impl Object3D {
    /// Create a visible, untransformed node.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            position: Vector3::ZERO,
            scale: Vector3::ONE,
            quaternion: Quaternion::IDENTITY,
            children: Vec::new(),
        }
    }
}

/// Access to the [`Object3D`] part of a scene node, plus chainable setters.
pub trait SceneObject: Sized {
    /// Borrow the base properties.
    fn object(&self) -> &Object3D;

    /// Mutably borrow the base properties.
    fn object_mut(&mut self) -> &mut Object3D;

    /// Node name.
    fn name(&self) -> &str {
        &self.object().name
    }

    /// Set the name.
    #[must_use]
    fn named(mut self, name: impl Into<String>) -> Self {
        self.object_mut().name = name.into();
        self
    }

    /// Set the position.
    #[must_use]
    fn at(mut self, position: Vector3) -> Self {
        self.object_mut().position = position;
        self
    }

    /// Set the scale.
    #[must_use]
    fn scaled(mut self, scale: Vector3) -> Self {
        self.object_mut().scale = scale;
        self
    }

    /// Set the rotation.
    #[must_use]
    fn rotated(mut self, quaternion: Quaternion) -> Self {
        self.object_mut().quaternion = quaternion;
        self
    }

    /// Set the default visibility.
    #[must_use]
    fn visible(mut self, visible: bool) -> Self {
        self.object_mut().visible = visible;
        self
    }

    /// Append a child node.
    #[must_use]
    fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.object_mut().children.push(child.into());
        self
    }
}

macro_rules! impl_scene_object {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::threed::SceneObject for $ty {
                fn object(&self) -> &$crate::threed::Object3D {
                    &self.base
                }

                fn object_mut(&mut self) -> &mut $crate::threed::Object3D {
                    &mut self.base
                }
            }
        )*
    };
}

pub(crate) use impl_scene_object;
