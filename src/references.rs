//! Load-time lookup of the named reference nodes baked into the logo asset.
//!
//! Anchors are snapshotted once per load. Missing anchors fall back to the constants in
//! [`fallback`], which match the authored asset, so a partially exported scene still animates.

use crate::scene_graph::{NodeId, SceneGraph};
use glam::{Quat, Vec3};

pub mod names {
    pub const CAMERA_ANCHOR_1: &str = "camerareference1";
    pub const CAMERA_ANCHOR_2: &str = "camerareference2";
    pub const CAMERA_HOME: &str = "camerahome";
    pub const LIGHT_ANCHOR_1: &str = "lightreference1";
    pub const LIGHT_ANCHOR_2: &str = "lightreference2";
    pub const LOOK_TARGET: &str = "positionTarget";
    pub const CAMERA: &str = "Camera";
    pub const MOVING_LIGHT: &str = "LightMoving";
    pub const FRONT_LIGHT: &str = "lightfront";
    /// Exporters disagree on whether the space survives.
    pub const BACK_LIGHT: [&str; 3] = ["light backward", "lightbackward", "light_backward"];
    pub const SUBJECT: &str = "Dog";
    pub const SHADOW_SHAPE: &str = "ShadowShape";
}

pub mod fallback {
    use glam::Vec3;

    pub const CAMERA_ANCHOR_1: Vec3 = Vec3::new(-5.729, 3.05, 26.62);
    pub const CAMERA_ANCHOR_2: Vec3 = Vec3::new(6.489, 3.05, 26.62);
    pub const CAMERA_HOME: Vec3 = Vec3::new(0.38, 3.05, 26.62);
    pub const LIGHT_ANCHOR_1: Vec3 = Vec3::new(-0.2658, 0.4717, -0.5677);
    pub const LIGHT_ANCHOR_2: Vec3 = Vec3::new(0.4972, 0.4717, -0.5677);
    pub const LOOK_TARGET: Vec3 = Vec3::ZERO;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPose {
    pub position: Vec3,
    /// Only present when the anchor came from the asset.
    pub rotation: Option<Quat>,
}

/// The look target is the one reference that is re-read every frame, since the host may animate it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookTarget {
    pub node: Option<NodeId>,
    pub fallback: Vec3,
}

impl LookTarget {
    pub fn position(&self, graph: &SceneGraph) -> Vec3 {
        match self.node {
            Some(node) if graph.node(node).is_some() => graph.world_position(node),
            _ => self.fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneReferences {
    pub camera_anchor_1: AnchorPose,
    pub camera_anchor_2: AnchorPose,
    pub camera_home: Vec3,
    pub light_anchor_1: Vec3,
    pub light_anchor_2: Vec3,
    pub look_target: LookTarget,
    /// Names of anchors that were missing and replaced by constants.
    pub fallbacks: Vec<&'static str>,
}

/// Live entities the directors act on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneHandles {
    pub camera: Option<NodeId>,
    pub moving_light: Option<NodeId>,
    pub front_light: Option<NodeId>,
    pub back_light: Option<NodeId>,
    pub subject: Option<NodeId>,
    pub shadow_shape: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScene {
    pub references: SceneReferences,
    pub handles: SceneHandles,
}

pub fn resolve(graph: &SceneGraph) -> ResolvedScene {
    let mut fallbacks = Vec::new();
    let mut position_of = |name: &'static str, default: Vec3| match graph.find_by_name(name) {
        Some(id) => graph.world_position(id),
        None => {
            fallbacks.push(name);
            default
        }
    };
    let camera_home = position_of(names::CAMERA_HOME, fallback::CAMERA_HOME);
    let light_anchor_1 = position_of(names::LIGHT_ANCHOR_1, fallback::LIGHT_ANCHOR_1);
    let light_anchor_2 = position_of(names::LIGHT_ANCHOR_2, fallback::LIGHT_ANCHOR_2);

    let mut pose_of = |name: &'static str, default: Vec3| match graph.find_by_name(name) {
        Some(id) => AnchorPose { position: graph.world_position(id), rotation: Some(graph.world_rotation(id)) },
        None => {
            fallbacks.push(name);
            AnchorPose { position: default, rotation: None }
        }
    };
    let camera_anchor_1 = pose_of(names::CAMERA_ANCHOR_1, fallback::CAMERA_ANCHOR_1);
    let camera_anchor_2 = pose_of(names::CAMERA_ANCHOR_2, fallback::CAMERA_ANCHOR_2);

    let look_node = graph.find_by_name(names::LOOK_TARGET);
    if look_node.is_none() {
        fallbacks.push(names::LOOK_TARGET);
    }

    let handles = SceneHandles {
        camera: graph.find_by_name(names::CAMERA).filter(|id| graph.camera(*id).is_some()),
        moving_light: graph.find_by_name(names::MOVING_LIGHT),
        front_light: graph.find_by_name(names::FRONT_LIGHT),
        back_light: graph.find_first(&names::BACK_LIGHT),
        subject: graph.find_by_name(names::SUBJECT),
        shadow_shape: graph.find_by_name(names::SHADOW_SHAPE),
    };

    let references = SceneReferences {
        camera_anchor_1,
        camera_anchor_2,
        camera_home,
        light_anchor_1,
        light_anchor_2,
        look_target: LookTarget { node: look_node, fallback: fallback::LOOK_TARGET },
        fallbacks,
    };
    log::info!(
        "[scene] References resolved: camera={} moving_light={} subject={} shadow_shape={} fallbacks={:?}",
        handles.camera.is_some(),
        handles.moving_light.is_some(),
        handles.subject.is_some(),
        handles.shadow_shape.is_some(),
        references.fallbacks
    );
    ResolvedScene { references, handles }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::{NodeKind, NodeTransform};

    #[test]
    fn empty_scene_uses_every_fallback() {
        let resolved = resolve(&SceneGraph::new());
        let refs = &resolved.references;
        assert_eq!(refs.camera_home, fallback::CAMERA_HOME);
        assert_eq!(refs.light_anchor_2, fallback::LIGHT_ANCHOR_2);
        assert_eq!(refs.camera_anchor_1.rotation, None);
        assert_eq!(refs.fallbacks.len(), 6);
        assert_eq!(resolved.handles, SceneHandles::default());
    }

    #[test]
    fn anchors_capture_world_space_positions() {
        let mut graph = SceneGraph::new();
        let rig = graph.add_node("rig", None, NodeTransform::from_translation(Vec3::Y), NodeKind::Empty);
        graph.add_node(names::LIGHT_ANCHOR_1, Some(rig), NodeTransform::from_translation(Vec3::X), NodeKind::Empty);
        graph.add_node(
            names::CAMERA_ANCHOR_2,
            None,
            NodeTransform {
                translation: Vec3::new(0.0, 0.0, 5.0),
                rotation: Quat::from_rotation_y(0.3),
                scale: Vec3::ONE,
            },
            NodeKind::Empty,
        );
        let target = graph.add_node(names::LOOK_TARGET, None, NodeTransform::default(), NodeKind::Empty);

        let resolved = resolve(&graph);
        let refs = &resolved.references;
        assert!((refs.light_anchor_1 - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
        assert!(refs.camera_anchor_2.rotation.expect("rotation").angle_between(Quat::from_rotation_y(0.3)) < 1e-4);
        assert!(!refs.fallbacks.contains(&names::LIGHT_ANCHOR_1));
        assert!(refs.fallbacks.contains(&names::LIGHT_ANCHOR_2));

        graph.set_local_translation(target, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(refs.look_target.position(&graph), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn back_light_accepts_spelling_variants() {
        let mut graph = SceneGraph::new();
        let back = graph.add_node("lightbackward", None, NodeTransform::default(), NodeKind::Empty);
        assert_eq!(resolve(&graph).handles.back_light, Some(back));
    }
}
