use glam::Vec3;
use logo_stage::references::names;
use logo_stage::scene_graph::{LightKind, SceneGraph};
use logo_stage::{HeadlessBackend, LogoStage, StageConfig};
use std::io::Write;

const LOGO_GLTF: &str = r#"{
  "asset": { "version": "2.0", "generator": "logo_stage fixture" },
  "extensionsUsed": ["KHR_lights_punctual"],
  "extensions": {
    "KHR_lights_punctual": {
      "lights": [
        { "type": "spot", "color": [1.0, 1.0, 1.0], "intensity": 5.0, "range": 10.0,
          "spot": { "innerConeAngle": 0.2, "outerConeAngle": 0.4 } },
        { "type": "point", "color": [1.0, 0.9, 0.8], "intensity": 40.0 }
      ]
    }
  },
  "cameras": [
    { "type": "perspective", "perspective": { "yfov": 0.5, "znear": 0.1, "zfar": 100.0 } }
  ],
  "scene": 0,
  "scenes": [ { "nodes": [0, 2, 3, 4, 5, 6, 7] } ],
  "nodes": [
    { "name": "Rig", "translation": [0.0, 1.0, 0.0], "children": [1] },
    { "name": "LightMoving", "translation": [0.0, 0.5, 0.0],
      "extensions": { "KHR_lights_punctual": { "light": 0 } } },
    { "name": "Camera", "translation": [0.0, 2.0, 12.0], "camera": 0 },
    { "name": "positionTarget" },
    { "name": "camerahome", "translation": [0.0, 2.0, 12.0] },
    { "name": "lightreference1", "translation": [-1.0, 0.5, 0.0] },
    { "name": "lightreference2", "translation": [1.0, 0.5, 0.0] },
    { "name": "lightfront", "translation": [0.0, 3.0, 3.0],
      "extensions": { "KHR_lights_punctual": { "light": 1 } } }
  ]
}"#;

fn write_fixture() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".gltf").tempfile().expect("temp gltf");
    file.write_all(LOGO_GLTF.as_bytes()).expect("write fixture");
    file.flush().expect("flush fixture");
    file
}

fn quiet_config() -> StageConfig {
    let mut config = StageConfig::default();
    config.glitch.seed = Some(1);
    config.glitch.startup_burst_delay_ms = None;
    config
}

#[test]
fn gltf_import_keeps_names_hierarchy_lights_and_camera() {
    let graph = SceneGraph::from_gltf_slice(LOGO_GLTF.as_bytes()).expect("fixture parses");
    assert_eq!(graph.node_count(), 8);

    let moving = graph.find_by_name(names::MOVING_LIGHT).expect("moving light");
    assert_eq!(graph.parent(moving), graph.find_by_name("Rig"));
    assert!((graph.world_position(moving) - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-6);
    let spot = graph.light(moving).expect("light");
    assert_eq!(spot.kind, LightKind::Spot);
    assert_eq!(spot.intensity, 5.0);
    assert!((spot.spot.expect("cone").angle - 0.4).abs() < 1e-6);

    let front = graph.light(graph.find_by_name(names::FRONT_LIGHT).expect("front")).expect("light");
    assert_eq!(front.kind, LightKind::Point);

    let camera = graph.camera(graph.find_by_name(names::CAMERA).expect("camera node")).expect("camera");
    assert!((camera.fov_y_radians - 0.5).abs() < 1e-6);
}

#[test]
fn stage_loads_from_disk_and_prefers_asset_camera() {
    let fixture = write_fixture();
    let mut stage = LogoStage::load(fixture.path(), quiet_config()).expect("stage loads");
    assert!(stage.handles().camera.is_some());
    assert!(!stage.references().fallbacks.contains(&names::CAMERA_HOME));
    assert!(stage.references().fallbacks.contains(&names::CAMERA_ANCHOR_1));

    // The asset camera sits 2 up and 12 back, looking down -Z; the 1.1 back-off pushes it along +Z.
    let distance = Vec3::new(0.0, 2.0, 12.0).length();
    let position = stage.camera().pose().position;
    assert!((position - Vec3::new(0.0, 2.0, 12.0 + 0.1 * distance)).length() < 1e-4);

    let moving = stage.graph().light(stage.moving_light().expect("moving")).expect("light");
    assert!(moving.cast_shadow);
    assert_eq!(moving.intensity, 100.0);

    let mut backend = HeadlessBackend::new();
    stage.pointer_moved(0.0, false, 0.0);
    let mut now = 0.0;
    while now <= 3000.0 {
        stage.tick(now, &mut backend).expect("tick");
        now += 1000.0 / 60.0;
    }
    let light = stage.graph().world_position(stage.moving_light().expect("moving"));
    assert!((light - Vec3::new(-1.0, 0.5, 0.0)).length() < 1e-3);
}

#[test]
fn missing_asset_fails_without_a_stage() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = match LogoStage::load(dir.path().join("missing.glb"), StageConfig::default()) {
        Ok(_) => panic!("loading a missing asset should fail"),
        Err(err) => err,
    };
    assert!(format!("{err:#}").contains("Failed to load logo scene"));
}

#[test]
fn config_file_feeds_stage_tuning() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().expect("temp config");
    write!(file, r#"{{ "light": {{ "menu_y_offset": 1.25 }}, "glitch": {{ "seed": 9, "startup_burst_delay_ms": null }} }}"#)
        .expect("write config");
    let config = StageConfig::load(file.path()).expect("config parses");
    assert_eq!(config.glitch.startup_burst_delay_ms, None);

    let stage = LogoStage::from_graph(SceneGraph::from_gltf_slice(LOGO_GLTF.as_bytes()).expect("fixture"), config);
    assert_eq!(stage.light_director().menu_y_offset(), 1.25);
    assert_eq!(stage.config().glitch.seed, Some(9));
}
