//! Scene node tests: validation and dict serialization

use serde_json::json;
use trueno_runs::threed::{
    AmbientLight, DirectionalLight, FbxMesh, GltfMesh, Node, ObjMesh, PlyMesh, PointCloud,
    PointCloudMaterial, PointLight, Quaternion, SceneObject, ShadingMode, SpotLight, StlMesh,
    Vector3,
};
use trueno_runs::Error;

// =============================================================================
// Meshes
// =============================================================================

#[test]
fn test_mesh_wrong_extension_fails() {
    let cases: Vec<Result<Node, Error>> = vec![
        ObjMesh::new("m", "model.fbx").map(Node::from),
        FbxMesh::new("m", "model.obj").map(Node::from),
        GltfMesh::new("m", "model.stl").map(Node::from),
        PlyMesh::new("m", "model.pcd").map(Node::from),
        StlMesh::new("m", "model.ply").map(Node::from),
        PointCloud::new("m", "model.glb").map(Node::from),
    ];

    for case in cases {
        assert!(matches!(case, Err(Error::InvalidArgument(_))));
    }
}

#[test]
fn test_mesh_round_trips() {
    let nodes = vec![
        Node::from(
            ObjMesh::new("chair", "assets/chair.obj")
                .unwrap()
                .with_material("assets/chair.mtl")
                .unwrap(),
        ),
        Node::from(FbxMesh::new("rig", "rig.FBX").unwrap()),
        Node::from(GltfMesh::new("car", "car.glb").unwrap().visible(false)),
        Node::from(PlyMesh::new("bunny", "bunny.ply").unwrap().scaled(Vector3::new(2.0, 2.0, 2.0))),
        Node::from(
            StlMesh::new("part", "part.stl")
                .unwrap()
                .rotated(Quaternion::new(0.0, 0.707, 0.0, 0.707)),
        ),
    ];

    for node in nodes {
        let restored = Node::from_dict(node.to_dict().unwrap()).unwrap();
        assert_eq!(restored, node);
    }
}

#[test]
fn test_obj_mesh_dict() {
    let mesh = ObjMesh::new("chair", "chair.obj")
        .unwrap()
        .at(Vector3::new(1.0, 0.0, -1.0));

    assert_eq!(
        Node::from(mesh).to_dict().unwrap(),
        json!({
            "_type": "ObjMesh",
            "name": "chair",
            "visible": true,
            "position": [1.0, 0.0, -1.0],
            "scale": [1.0, 1.0, 1.0],
            "quaternion": [0.0, 0.0, 0.0, 1.0],
            "children": [],
            "objPath": "chair.obj",
            "mtlPath": null
        })
    );
}

// =============================================================================
// Lights
// =============================================================================

#[test]
fn test_spot_light_dict() {
    let d = Node::from(SpotLight::new()).to_dict().unwrap();

    assert_eq!(d["_type"], "SpotLight");
    assert_eq!(d["name"], "SpotLight");
    assert_eq!(d["target"], json!([0.0, 0.0, 0.0]));
    assert_eq!(d["distance"], 0.0);
    assert_eq!(d["decay"], 2.0);
    assert_eq!(d["penumbra"], 0.0);
    assert_eq!(d["color"], "#ffffff");
    assert_eq!(d["intensity"], 1.0);
    assert!((d["angle"].as_f64().unwrap() - std::f64::consts::FRAC_PI_3).abs() < 1e-12);
}

#[test]
fn test_light_defaults_fill_missing_keys() {
    let node = Node::from_dict(json!({"_type": "PointLight", "name": "fill"})).unwrap();

    match node {
        Node::PointLight(light) => {
            assert_eq!(light.name(), "fill");
            assert_eq!(light.decay, 2.0);
            assert_eq!(light.color, "#ffffff");
            assert!(light.object().visible);
        }
        other => panic!("expected PointLight, got {other:?}"),
    }
}

#[test]
fn test_light_round_trips() {
    let mut directional = DirectionalLight::new();
    directional.target = Vector3::new(0.0, -1.0, 0.0);
    directional.intensity = 0.6;

    for node in [
        Node::from(AmbientLight::new()),
        Node::from(directional),
        Node::from(PointLight::new().named("bulb")),
    ] {
        assert!(node.is_light());
        assert_eq!(Node::from_dict(node.to_dict().unwrap()).unwrap(), node);
    }
}

// =============================================================================
// Point clouds
// =============================================================================

#[test]
fn test_point_cloud_round_trips() {
    let material = PointCloudMaterial::new()
        .with_shading_mode(ShadingMode::Intensity)
        .with_opacity(0.5)
        .unwrap();
    let cloud = PointCloud::new("lidar", "scans/000.pcd")
        .unwrap()
        .with_material(material)
        .flag_for_projection(true);
    let node = Node::from(cloud);

    let d = node.to_dict().unwrap();
    assert_eq!(d["defaultMaterial"]["shadingMode"], "intensity");
    assert_eq!(d["defaultMaterial"]["opacity"], 0.5);
    assert!(d.get("preTransformedPcdPath").is_none());

    assert_eq!(Node::from_dict(d).unwrap(), node);
}

#[test]
fn test_point_cloud_opacity_revalidated() {
    let mut d = Node::from(PointCloud::new("lidar", "scan.pcd").unwrap())
        .to_dict()
        .unwrap();
    d["defaultMaterial"]["opacity"] = json!(1.5);

    let err = Node::from_dict(d).unwrap_err();
    assert!(err.to_string().contains("opacity"));
}

// =============================================================================
// Hierarchy
// =============================================================================

#[test]
fn test_children_round_trip() {
    let scene = Node::from(
        GltfMesh::new("car", "car.gltf")
            .unwrap()
            .with_child(SpotLight::new().named("left_headlight"))
            .with_child(SpotLight::new().named("right_headlight"))
            .with_child(PointCloud::new("lidar", "roof.pcd").unwrap()),
    );

    let d = scene.to_dict().unwrap();
    assert_eq!(d["children"].as_array().unwrap().len(), 3);
    assert_eq!(d["children"][2]["_type"], "PointCloud");

    let restored = Node::from_dict(d).unwrap();
    assert_eq!(restored.traverse().len(), 4);
    assert_eq!(restored, scene);
}

#[test]
fn test_unknown_type_fails() {
    let err = Node::from_dict(json!({"_type": "Teapot", "name": "t"})).unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}
