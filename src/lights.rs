use crate::config::ShadowConfig;
use crate::references::SceneHandles;
use crate::scene_graph::{LightKind, LightNode, NodeId, NodeKind, NodeTransform, SceneGraph, ShadowParams, SpotParams};
use glam::Vec3;
use std::collections::HashMap;

const SCALE_DOWN: f32 = 0.7;
const SCALE_UP: f32 = 1.3;
const BOOST: f32 = 3.0;
const AMBIENT_INTENSITY: f32 = 0.35;
const REPLACEMENT_NAME: &str = "MovingLightShadow";
const AMBIENT_NAME: &str = "DebugAmbient";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightId {
    Back,
    Front,
    Moving,
}

impl LightId {
    pub const ALL: [LightId; 3] = [LightId::Back, LightId::Front, LightId::Moving];

    pub fn label(self) -> &'static str {
        match self {
            LightId::Back => "light backward",
            LightId::Front => "lightfront",
            LightId::Moving => "LightMoving",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightScale {
    Down,
    Up,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightReplacement {
    pub original: NodeId,
    pub replacement: NodeId,
}

/// The three named scene lights plus the optional debug ambient.
#[derive(Debug, Clone, Default)]
pub struct LightRig {
    lights: HashMap<LightId, NodeId>,
    baseline: HashMap<LightId, f32>,
    boosted: bool,
    ambient: Option<NodeId>,
}

impl LightRig {
    /// Every resolved handle is kept so an unlit `LightMoving` empty still gets positioned and
    /// toggled. Intensity and shadow controls only touch handles that are real lights.
    pub fn new(graph: &SceneGraph, handles: &SceneHandles) -> Self {
        let mut rig = Self::default();
        for (id, node) in [
            (LightId::Back, handles.back_light),
            (LightId::Front, handles.front_light),
            (LightId::Moving, handles.moving_light),
        ] {
            if let Some(node) = node {
                rig.lights.insert(id, node);
                if let Some(light) = graph.light(node) {
                    rig.baseline.insert(id, light.intensity);
                }
            }
        }
        rig
    }

    pub fn node(&self, id: LightId) -> Option<NodeId> {
        self.lights.get(&id).copied()
    }

    pub fn baseline(&self, id: LightId) -> Option<f32> {
        self.baseline.get(&id).copied()
    }

    pub fn is_boosted(&self) -> bool {
        self.boosted
    }

    pub fn ambient(&self) -> Option<NodeId> {
        self.ambient
    }

    pub fn intensity(&self, graph: &SceneGraph, id: LightId) -> Option<f32> {
        self.node(id).and_then(|node| graph.light(node)).map(|light| light.intensity)
    }

    /// Swaps a moving light that cannot cast shadows for a spot light at the same world position.
    /// The original stays in the scene, hidden.
    pub fn ensure_moving_light_shadow_capable(
        &mut self,
        graph: &mut SceneGraph,
        aim: Option<NodeId>,
    ) -> Option<LightReplacement> {
        let original = self.node(LightId::Moving)?;
        let light = graph.light(original)?;
        if light.kind.casts_shadows() {
            return None;
        }
        let intensity = if light.intensity != 0.0 { light.intensity } else { 3.0 };
        let position = graph.world_position(original);

        let mut spot = LightNode::new(LightKind::Spot, intensity);
        spot.range = Some(15.0);
        spot.spot = Some(SpotParams {
            angle: std::f32::consts::PI / 5.0,
            penumbra: 0.3,
            decay: 2.0,
            distance: 15.0,
        });
        spot.cast_shadow = true;
        spot.shadow = ShadowParams { map_size: 2048, bias: 0.0015, normal_bias: 0.0 };
        spot.target = aim;
        let replacement =
            graph.add_node(REPLACEMENT_NAME, None, NodeTransform::from_translation(position), NodeKind::Light(spot));
        if let Some(node) = graph.node_mut(original) {
            node.visible = false;
        }
        self.lights.insert(LightId::Moving, replacement);
        self.baseline.insert(LightId::Moving, intensity);
        log::info!("[lights] Replaced non-shadow moving light with spot light '{REPLACEMENT_NAME}'");
        Some(LightReplacement { original, replacement })
    }

    /// Restricts shadow casting to the moving light and makes every mesh a receiver.
    pub fn setup_shadows(&self, graph: &mut SceneGraph, config: &ShadowConfig, aim: Option<NodeId>) {
        for id in [LightId::Back, LightId::Front] {
            if let Some(light) = self.node(id).and_then(|node| graph.light_mut(node)) {
                light.cast_shadow = false;
            }
        }
        if let Some(light) = self.node(LightId::Moving).and_then(|node| graph.light_mut(node)) {
            light.cast_shadow = light.kind.casts_shadows();
            light.shadow = ShadowParams { map_size: config.map_size, bias: config.bias, normal_bias: config.normal_bias };
            if light.kind == LightKind::Spot {
                light.spot = Some(SpotParams {
                    angle: config.spot_angle,
                    penumbra: config.spot_penumbra,
                    decay: config.spot_decay,
                    distance: config.spot_distance,
                });
                if aim.is_some() {
                    light.target = aim;
                }
            }
        }
        for id in graph.mesh_ids() {
            if let Some(mesh) = graph.mesh_mut(id) {
                mesh.cast_shadow = false;
                mesh.receive_shadow = true;
            }
        }
    }

    /// Sets every rig light and records the value as the new baseline.
    pub fn set_all_intensity(&mut self, graph: &mut SceneGraph, value: f32) {
        if !value.is_finite() {
            return;
        }
        let value = value.max(0.0);
        for id in LightId::ALL {
            if let Some(light) = self.node(id).and_then(|node| graph.light_mut(node)) {
                light.intensity = value;
                self.baseline.insert(id, value);
            }
        }
    }

    pub fn scale(&mut self, graph: &mut SceneGraph, mode: LightScale) {
        for id in LightId::ALL {
            let baseline = self.baseline(id);
            let Some(light) = self.node(id).and_then(|node| graph.light_mut(node)) else {
                continue;
            };
            match mode {
                LightScale::Down => light.intensity = (light.intensity * SCALE_DOWN).max(0.0),
                LightScale::Up => light.intensity *= SCALE_UP,
                LightScale::Reset => {
                    if let Some(base) = baseline {
                        light.intensity = base;
                    }
                }
            }
        }
        if mode == LightScale::Reset {
            self.boosted = false;
        }
    }

    /// Alternates between triple baseline intensity and the baseline itself.
    pub fn toggle_boost(&mut self, graph: &mut SceneGraph) -> bool {
        if self.lights.is_empty() {
            return self.boosted;
        }
        let boost = !self.boosted;
        for id in LightId::ALL {
            let baseline = self.baseline(id);
            let Some(light) = self.node(id).and_then(|node| graph.light_mut(node)) else {
                continue;
            };
            match (boost, baseline) {
                (true, base) => light.intensity = base.unwrap_or(light.intensity) * BOOST,
                (false, Some(base)) => light.intensity = base,
                (false, None) => {}
            }
        }
        self.boosted = boost;
        log::info!("[lights] Boost {}", if boost { "on" } else { "off" });
        boost
    }

    /// Returns the new visibility, or `None` when the light is absent.
    pub fn toggle_visibility(&self, graph: &mut SceneGraph, id: LightId) -> Option<bool> {
        let node = graph.node_mut(self.node(id)?)?;
        node.visible = !node.visible;
        Some(node.visible)
    }

    /// Creates the debug ambient light on first use, then flips its visibility.
    pub fn toggle_ambient(&mut self, graph: &mut SceneGraph) -> bool {
        if let Some(node) = self.ambient.and_then(|id| graph.node_mut(id)) {
            node.visible = !node.visible;
            return node.visible;
        }
        let ambient = LightNode::new(LightKind::Ambient, AMBIENT_INTENSITY);
        self.ambient =
            Some(graph.add_node(AMBIENT_NAME, None, NodeTransform::default(), NodeKind::Light(ambient)));
        true
    }

    /// Resizes the shadow map of every rig light currently casting.
    pub fn set_shadow_map_size(&self, graph: &mut SceneGraph, size: u32) -> usize {
        let size = size.clamp(1, 16384);
        let mut resized = 0;
        for id in [LightId::Moving, LightId::Front, LightId::Back] {
            if let Some(light) = self.node(id).and_then(|node| graph.light_mut(node)) {
                if light.cast_shadow {
                    light.shadow.map_size = size;
                    resized += 1;
                }
            }
        }
        log::info!("[lights] Shadow map size set to {size} on {resized} light(s)");
        resized
    }

    pub fn set_shadow_bias(&self, graph: &mut SceneGraph, bias: f32) {
        if let Some(light) = self.moving_mut(graph).filter(|_| bias.is_finite()) {
            light.shadow.bias = bias;
        }
    }

    pub fn set_shadow_normal_bias(&self, graph: &mut SceneGraph, normal_bias: f32) {
        if let Some(light) = self.moving_mut(graph).filter(|_| normal_bias.is_finite()) {
            light.shadow.normal_bias = normal_bias;
        }
    }

    /// Spot lights only; other kinds ignore it.
    pub fn set_spot_penumbra(&self, graph: &mut SceneGraph, penumbra: f32) -> bool {
        if !penumbra.is_finite() {
            return false;
        }
        match self.moving_mut(graph).and_then(|light| light.spot.as_mut()) {
            Some(spot) => {
                spot.penumbra = penumbra.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    pub fn set_beam_angle_degrees(&self, graph: &mut SceneGraph, degrees: f32) -> bool {
        if !degrees.is_finite() {
            return false;
        }
        match self.moving_mut(graph).and_then(|light| light.spot.as_mut()) {
            Some(spot) => {
                spot.angle = degrees.to_radians().clamp(0.0, std::f32::consts::FRAC_PI_2);
                true
            }
            None => false,
        }
    }

    pub fn moving_light_position(&self, graph: &SceneGraph) -> Option<Vec3> {
        self.node(LightId::Moving).map(|node| graph.world_position(node))
    }

    fn moving_mut<'a>(&self, graph: &'a mut SceneGraph) -> Option<&'a mut LightNode> {
        graph.light_mut(self.node(LightId::Moving)?)
    }
}
