//! Meshes loaded from asset files
//!
//! Constructors only check the file extension (case-insensitive); the files
//! themselves are read by the viewer.

use serde::{Deserialize, Serialize};

use super::object3d::{impl_scene_object, Object3D};
use crate::{Error, Result};

/// Check that `path` ends with one of `extensions`, ignoring case.
pub(crate) fn check_extension(path: &str, extensions: &[&str], message: &str) -> Result<()> {
    let lower = path.to_lowercase();
    if extensions.iter().any(|ext| lower.ends_with(ext)) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("{message}, got '{path}'")))
    }
}

/// Mesh from a Wavefront `.obj` file, with an optional `.mtl` material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjMesh {
    #[serde(flatten)]
    base: Object3D,
    obj_path: String,
    #[serde(default)]
    mtl_path: Option<String>,
}

impl ObjMesh {
    /// Create an OBJ mesh.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `obj_path` is not a `.obj` file.
    pub fn new(name: impl Into<String>, obj_path: impl Into<String>) -> Result<Self> {
        let obj_path = obj_path.into();
        check_extension(&obj_path, &[".obj"], "OBJ mesh must be a .obj file")?;
        Ok(Self {
            base: Object3D::new(name),
            obj_path,
            mtl_path: None,
        })
    }

    /// Attach a material file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `mtl_path` does not end with `.mtl`.
    pub fn with_material(mut self, mtl_path: impl Into<String>) -> Result<Self> {
        let mtl_path = mtl_path.into();
        check_mtl(&mtl_path)?;
        self.mtl_path = Some(mtl_path);
        Ok(self)
    }

    /// Path to the `.obj` file.
    #[must_use]
    pub fn obj_path(&self) -> &str {
        &self.obj_path
    }

    /// Path to the `.mtl` file, if any.
    #[must_use]
    pub fn mtl_path(&self) -> Option<&str> {
        self.mtl_path.as_deref()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_extension(&self.obj_path, &[".obj"], "OBJ mesh must be a .obj file")?;
        self.mtl_path.as_deref().map_or(Ok(()), check_mtl)
    }
}

// Material extension is matched case-sensitively
fn check_mtl(path: &str) -> Result<()> {
    if path.ends_with(".mtl") {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "OBJ material must be a .mtl file, got '{path}'"
        )))
    }
}

macro_rules! single_file_mesh {
    ($(#[$doc:meta])* $ty:ident, $field:ident, [$($ext:literal),+], $message:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $ty {
            #[serde(flatten)]
            base: Object3D,
            $field: String,
        }

        impl $ty {
            /// Create the mesh.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidArgument`] if the path has the wrong extension.
            pub fn new(name: impl Into<String>, path: impl Into<String>) -> Result<Self> {
                let path = path.into();
                check_extension(&path, &[$($ext),+], $message)?;
                Ok(Self {
                    base: Object3D::new(name),
                    $field: path,
                })
            }

            /// Path to the asset file.
            #[must_use]
            pub fn path(&self) -> &str {
                &self.$field
            }

            pub(crate) fn validate(&self) -> Result<()> {
                check_extension(&self.$field, &[$($ext),+], $message)
            }
        }
    };
}

single_file_mesh!(
    /// Mesh from an Autodesk `.fbx` file.
    FbxMesh, fbx_path, [".fbx"], "FBX mesh must be a .fbx file"
);

single_file_mesh!(
    /// Mesh from a glTF `.gltf` or binary `.glb` file.
    GltfMesh, gltf_path, [".gltf", ".glb"], "glTF mesh must be a .gltf or .glb file"
);

single_file_mesh!(
    /// Mesh from a `.ply` file.
    PlyMesh, ply_path, [".ply"], "PLY mesh must be a .ply file"
);

single_file_mesh!(
    /// Mesh from a `.stl` file.
    StlMesh, stl_path, [".stl"], "STL mesh must be a .stl file"
);

impl_scene_object!(ObjMesh, FbxMesh, GltfMesh, PlyMesh, StlMesh);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threed::SceneObject;

    #[test]
    fn test_extension_check_ignores_case() {
        assert!(ObjMesh::new("chair", "assets/CHAIR.OBJ").is_ok());
        assert!(GltfMesh::new("car", "car.GLB").is_ok());
        assert!(StlMesh::new("part", "part.Stl").is_ok());
    }

    #[test]
    fn test_wrong_extension_fails() {
        let err = PlyMesh::new("bunny", "bunny.obj").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("PLY mesh must be a .ply file"));

        assert!(FbxMesh::new("rig", "rig.gltf").is_err());
        assert!(GltfMesh::new("car", "car.gltf.bak").is_err());
    }

    #[test]
    fn test_obj_material() {
        let mesh = ObjMesh::new("chair", "chair.obj")
            .unwrap()
            .with_material("chair.mtl")
            .unwrap();
        assert_eq!(mesh.mtl_path(), Some("chair.mtl"));
        assert_eq!(mesh.name(), "chair");

        assert!(ObjMesh::new("chair", "chair.obj")
            .unwrap()
            .with_material("chair.png")
            .is_err());
        assert!(ObjMesh::new("chair", "chair.obj")
            .unwrap()
            .with_material("chair.MTL")
            .is_err());
    }
}
