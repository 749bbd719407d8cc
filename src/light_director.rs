use crate::config::LightConfig;
use crate::references::SceneReferences;
use crate::scene_graph::{NodeId, SceneGraph};
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionTransition {
    Entered,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightArrival {
    pub target: Vec3,
    pub distance: f32,
}

/// Drives the moving light between its two anchors from pointer X, or parks it above the second
/// anchor while the pointer is over the menu. Arrival at the parked target fires once per entry.
#[derive(Debug, Clone)]
pub struct LightDirector {
    pointer_x: f32,
    in_menu: bool,
    menu_y_offset: f32,
    awaiting_arrival: bool,
    has_arrived: bool,
    ease_rate: f32,
    ease_min: f32,
    ease_max: f32,
    arrival_tolerance: f32,
}

impl LightDirector {
    pub fn new(config: &LightConfig) -> Self {
        let ease_min = config.ease_min.clamp(0.0, 1.0);
        Self {
            pointer_x: 0.5,
            in_menu: false,
            menu_y_offset: config.menu_y_offset,
            awaiting_arrival: false,
            has_arrived: false,
            ease_rate: config.ease_rate.max(0.0),
            ease_min,
            ease_max: config.ease_max.clamp(ease_min, 1.0),
            arrival_tolerance: config.arrival_tolerance.max(0.0),
        }
    }

    pub fn pointer_x(&self) -> f32 {
        self.pointer_x
    }

    /// Non-finite samples are dropped; everything else is clamped to `[0, 1]`.
    pub fn set_pointer_x(&mut self, x: f32) {
        if x.is_finite() {
            self.pointer_x = x.clamp(0.0, 1.0);
        }
    }

    pub fn in_menu(&self) -> bool {
        self.in_menu
    }

    pub fn awaiting_arrival(&self) -> bool {
        self.awaiting_arrival
    }

    pub fn has_arrived(&self) -> bool {
        self.has_arrived
    }

    pub fn menu_y_offset(&self) -> f32 {
        self.menu_y_offset
    }

    pub fn set_menu_y_offset(&mut self, offset: f32) {
        if offset.is_finite() {
            self.menu_y_offset = offset;
        }
    }

    /// Records the menu-region signal. Entering re-arms the arrival latch; leaving disarms it.
    pub fn set_menu_region(&mut self, in_menu: bool) -> Option<RegionTransition> {
        let previous = self.in_menu;
        self.in_menu = in_menu;
        match (previous, in_menu) {
            (false, true) => {
                self.awaiting_arrival = true;
                self.has_arrived = false;
                Some(RegionTransition::Entered)
            }
            (true, false) => {
                self.awaiting_arrival = false;
                self.has_arrived = false;
                Some(RegionTransition::Exited)
            }
            _ => None,
        }
    }

    pub fn target_world(&self, references: &SceneReferences) -> Vec3 {
        if self.in_menu {
            references.light_anchor_2 + Vec3::new(0.0, self.menu_y_offset, 0.0)
        } else {
            lerp_exact(references.light_anchor_1, references.light_anchor_2, self.pointer_x)
        }
    }

    /// Share of the remaining distance closed this frame.
    pub fn ease_factor(&self, dt_seconds: f32) -> f32 {
        let dt = if dt_seconds.is_finite() { dt_seconds.max(0.0) } else { 0.0 };
        (dt * self.ease_rate).clamp(self.ease_min, self.ease_max)
    }

    /// Eases `light` toward its target and reports the arrival transition, if it happened this frame.
    pub fn update(
        &mut self,
        dt_seconds: f32,
        graph: &mut SceneGraph,
        light: NodeId,
        references: &SceneReferences,
    ) -> Option<LightArrival> {
        let current = graph.local_translation(light)?;
        let target = self.target_world(references);
        let target_local = graph.world_to_local(graph.parent(light), target);
        graph.set_local_translation(light, current.lerp(target_local, self.ease_factor(dt_seconds)));

        if !(self.in_menu && self.awaiting_arrival && !self.has_arrived) {
            return None;
        }
        let distance = graph.world_position(light).distance(target);
        if distance >= self.arrival_tolerance {
            return None;
        }
        self.has_arrived = true;
        self.awaiting_arrival = false;
        Some(LightArrival { target, distance })
    }
}

fn lerp_exact(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a.lerp(b, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::references::resolve;
    use crate::scene_graph::{NodeKind, NodeTransform};

    fn director() -> LightDirector {
        LightDirector::new(&LightConfig::default())
    }

    #[test]
    fn pointer_target_interpolates_between_anchors() {
        let refs = resolve(&SceneGraph::new()).references;
        let mut lights = director();
        for step in 0..=20 {
            let x = step as f32 / 20.0;
            lights.set_pointer_x(x);
            let expected = refs.light_anchor_1.lerp(refs.light_anchor_2, x);
            assert!(lights.target_world(&refs).distance(expected) < 1e-6);
        }
        lights.set_pointer_x(0.0);
        assert_eq!(lights.target_world(&refs), refs.light_anchor_1);
        lights.set_pointer_x(1.0);
        assert_eq!(lights.target_world(&refs), refs.light_anchor_2);
        lights.set_pointer_x(f32::NAN);
        assert_eq!(lights.pointer_x(), 1.0);
        lights.set_pointer_x(-3.0);
        assert_eq!(lights.pointer_x(), 0.0);
    }

    #[test]
    fn menu_target_sits_above_second_anchor() {
        let refs = resolve(&SceneGraph::new()).references;
        let mut lights = director();
        lights.set_menu_region(true);
        assert_eq!(lights.target_world(&refs), refs.light_anchor_2 + Vec3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn ease_factor_is_clamped() {
        let lights = director();
        assert_eq!(lights.ease_factor(0.0), 0.05);
        assert!((lights.ease_factor(1.0 / 60.0) - 5.0 / 60.0).abs() < 1e-6);
        assert_eq!(lights.ease_factor(1.0), 0.25);
        assert_eq!(lights.ease_factor(f32::NAN), 0.05);
    }

    #[test]
    fn arrival_fires_once_per_menu_entry() {
        let mut graph = SceneGraph::new();
        let parent = graph.add_node("rig", None, NodeTransform::from_translation(Vec3::Y), NodeKind::Empty);
        let light = graph.add_node("LightMoving", Some(parent), NodeTransform::default(), NodeKind::Empty);
        let refs = resolve(&graph).references;
        let mut lights = director();

        assert_eq!(lights.set_menu_region(true), Some(RegionTransition::Entered));
        let mut arrivals = 0;
        for _ in 0..400 {
            if lights.update(1.0 / 60.0, &mut graph, light, &refs).is_some() {
                arrivals += 1;
            }
        }
        assert_eq!(arrivals, 1);
        assert!(lights.has_arrived());
        let target = lights.target_world(&refs);
        assert!(graph.world_position(light).distance(target) < 0.03);

        assert_eq!(lights.set_menu_region(true), None);
        assert_eq!(lights.set_menu_region(false), Some(RegionTransition::Exited));
        assert!(!lights.has_arrived() && !lights.awaiting_arrival());
        lights.set_menu_region(true);
        assert!(lights.awaiting_arrival());
        let arrival = lights.update(1.0 / 60.0, &mut graph, light, &refs);
        assert!(arrival.is_some(), "already parked light re-arrives after re-entry");
    }
}
