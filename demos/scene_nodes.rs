//! Scene Nodes Demo
//!
//! Builds a small scene graph (lights, meshes, a point cloud), prints the
//! dict the viewer receives, and shows extension validation.
//!
//! Run with: cargo run --example scene_nodes

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trueno_runs::threed::{
    AmbientLight, DirectionalLight, GltfMesh, Node, ObjMesh, PointCloud, PointCloudMaterial,
    SceneObject, ShadingMode, SpotLight, Vector3,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Trueno-Runs Scene Nodes ===\n");

    // -------------------------------------------------------------------------
    // 1. Build the scene
    // -------------------------------------------------------------------------
    let mut sun = DirectionalLight::new().at(Vector3::new(10.0, 20.0, 10.0));
    sun.intensity = 0.8;

    let car = GltfMesh::new("car", "models/car.glb")?
        .with_child(SpotLight::new().named("headlight").at(Vector3::new(0.0, 0.5, 2.0)));

    let lidar = PointCloud::new("lidar", "scans/000042.pcd")?
        .with_material(
            PointCloudMaterial::new()
                .with_shading_mode(ShadingMode::Height)
                .with_opacity(0.8)?,
        )
        .flag_for_projection(true);

    let scene = Node::from(
        AmbientLight::new()
            .named("scene")
            .with_child(sun)
            .with_child(car)
            .with_child(lidar),
    );

    for node in scene.traverse() {
        info!("{} ({})", node.name(), node.type_name());
    }

    // -------------------------------------------------------------------------
    // 2. Serialize for the viewer and parse it back
    // -------------------------------------------------------------------------
    let d = scene.to_dict()?;
    println!("{}\n", serde_json::to_string_pretty(&d)?);

    let restored = Node::from_dict(d)?;
    println!("Round trip equal: {}\n", restored == scene);

    // -------------------------------------------------------------------------
    // 3. Extension validation
    // -------------------------------------------------------------------------
    match ObjMesh::new("chair", "chair.fbx") {
        Ok(_) => println!("unexpected: chair.fbx accepted as OBJ"),
        Err(e) => println!("Rejected: {e}"),
    }

    Ok(())
}
