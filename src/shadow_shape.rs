use crate::config::ShadowShapeConfig;
use crate::scene_graph::{MaterialId, SceneGraph};
use crate::schedule::{Session, SessionCounter, TaskHandle, Timeline};
use crate::time::Millis;
use crate::tween::{TweenSlot, TweenStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowTask {
    /// Start the long fade-in of the overlay.
    FadeIn { session: Session },
    /// Stop the subject mesh from casting, provided the menu is still active.
    DisableSubjectShadow { session: Session },
}

impl ShadowTask {
    pub fn session(&self) -> Session {
        match self {
            ShadowTask::FadeIn { session } | ShadowTask::DisableSubjectShadow { session } => *session,
        }
    }
}

/// Opacity controller for the overlay shadow mesh.
#[derive(Debug, Clone)]
pub struct ShadowShapeFader {
    materials: Vec<MaterialId>,
    opacity: f32,
    fade: TweenSlot<f32>,
    sessions: SessionCounter,
    pending: Vec<TaskHandle>,
    initial_fade_done: bool,
    config: ShadowShapeConfig,
}

impl ShadowShapeFader {
    pub fn new(materials: Vec<MaterialId>, initial_opacity: f32, config: &ShadowShapeConfig) -> Self {
        Self {
            materials,
            opacity: initial_opacity.clamp(0.0, 1.0),
            fade: TweenSlot::new(),
            sessions: SessionCounter::new(),
            pending: Vec::new(),
            initial_fade_done: false,
            config: config.clone(),
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.materials.is_empty()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// End value of the active fade, or the resting opacity.
    pub fn target_opacity(&self) -> f32 {
        self.fade.target().copied().unwrap_or(self.opacity)
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_active()
    }

    pub fn session(&self) -> Session {
        self.sessions.current()
    }

    pub fn is_current(&self, session: Session) -> bool {
        self.sessions.is_current(session)
    }

    pub fn pending_tasks(&self) -> usize {
        self.pending.len()
    }

    /// Returns false when the request was ignored: no overlay, or already heading to that opacity.
    pub fn fade_to(&mut self, target: f32, duration_ms: f64, now: Millis) -> bool {
        if !self.is_attached() || target.is_nan() {
            return false;
        }
        let target = target.clamp(0.0, 1.0);
        if (self.target_opacity() - target).abs() < self.config.debounce {
            return false;
        }
        self.fade.start(self.opacity, target, now, duration_ms);
        true
    }

    /// First pointer move outside the menu hides the overlay quickly, once.
    pub fn initial_fade_out(&mut self, now: Millis) {
        if self.initial_fade_done {
            return;
        }
        self.initial_fade_done = true;
        self.fade_to(0.0, self.config.initial_fade_ms, now);
    }

    pub fn fade_out(&mut self, now: Millis) -> bool {
        self.fade_to(0.0, self.config.exit_fade_ms, now)
    }

    pub fn start_arrival_fade(&mut self, now: Millis) -> bool {
        self.fade_to(1.0, self.config.arrival_fade_ms, now)
    }

    /// Samples the active fade. Returns the new opacity when it changed this frame.
    pub fn advance(&mut self, now: Millis) -> Option<f32> {
        match self.fade.advance(now) {
            TweenStep::Idle => None,
            TweenStep::Running(value) | TweenStep::Finished(value) => {
                self.opacity = value;
                Some(value)
            }
        }
    }

    pub fn apply(&self, graph: &mut SceneGraph) {
        for id in &self.materials {
            if let Some(material) = graph.material_mut(*id) {
                material.opacity = self.opacity;
            }
        }
    }

    /// Starts a new arrival session: a delayed long fade-in and, later, the subject shadow cut-off.
    pub fn schedule_arrival_effects<T: From<ShadowTask>>(
        &mut self,
        now: Millis,
        timeline: &mut Timeline<T>,
    ) -> Session {
        self.clear_pending(timeline);
        let session = self.sessions.advance();
        let fade = timeline.schedule_after(
            now,
            self.config.arrival_fade_delay_ms,
            ShadowTask::FadeIn { session }.into(),
        );
        let disable = timeline.schedule_after(
            now,
            self.config.shadow_disable_delay_ms,
            ShadowTask::DisableSubjectShadow { session }.into(),
        );
        self.pending = vec![fade, disable];
        session
    }

    /// Invalidates the current session and drops its queued tasks unexecuted.
    pub fn cancel_arrival_effects<T>(&mut self, timeline: &mut Timeline<T>) {
        self.sessions.advance();
        self.clear_pending(timeline);
    }

    fn clear_pending<T>(&mut self, timeline: &mut Timeline<T>) {
        for handle in self.pending.drain(..) {
            timeline.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::Material;

    fn fader() -> (SceneGraph, ShadowShapeFader) {
        let mut graph = SceneGraph::new();
        let material = graph.add_material(Material::unlit("ShadowShape_Unlit", glam::Vec3::ZERO));
        (graph, ShadowShapeFader::new(vec![material], 0.0, &ShadowShapeConfig::default()))
    }

    #[test]
    fn repeated_fade_request_is_a_no_op() {
        let (_, mut fader) = fader();
        assert!(fader.fade_to(0.8, 400.0, 0.0));
        fader.advance(100.0);
        let snapshot = (fader.opacity(), fader.target_opacity(), fader.fade.active().map(|t| t.duration_ms()));
        assert!(!fader.fade_to(0.8, 50.0, 100.0));
        assert!(!fader.fade_to(0.81, 50.0, 100.0), "within debounce threshold");
        assert_eq!((fader.opacity(), fader.target_opacity(), fader.fade.active().map(|t| t.duration_ms())), snapshot);
    }

    #[test]
    fn fade_preempts_from_current_opacity() {
        let (mut graph, mut fader) = fader();
        fader.fade_to(1.0, 100.0, 0.0);
        let mid = fader.advance(50.0).expect("fading");
        assert!((mid - 0.5).abs() < 1e-6);
        assert!(fader.fade_to(0.0, 100.0, 50.0));
        assert_eq!(fader.advance(50.0), Some(mid));
        assert_eq!(fader.advance(150.0), Some(0.0));
        fader.apply(&mut graph);
        assert!(graph.materials_mut().all(|m| m.opacity == 0.0));
    }

    #[test]
    fn targets_are_clamped_and_detached_fader_ignores_requests() {
        let (_, mut fader) = fader();
        assert!(fader.fade_to(4.0, 10.0, 0.0));
        assert_eq!(fader.target_opacity(), 1.0);
        let mut detached = ShadowShapeFader::new(Vec::new(), 0.0, &ShadowShapeConfig::default());
        assert!(!detached.fade_to(1.0, 10.0, 0.0));
    }

    #[test]
    fn cancel_invalidates_scheduled_arrival_tasks() {
        let (_, mut fader) = fader();
        let mut timeline: Timeline<ShadowTask> = Timeline::new();
        let session = fader.schedule_arrival_effects(0.0, &mut timeline);
        assert_eq!(timeline.len(), 2);
        assert!(fader.is_current(session));

        fader.cancel_arrival_effects(&mut timeline);
        assert!(!fader.is_current(session));
        assert!(timeline.is_empty());
        assert_eq!(fader.pending_tasks(), 0);
    }

    #[test]
    fn rescheduling_supersedes_previous_session() {
        let (_, mut fader) = fader();
        let mut timeline: Timeline<ShadowTask> = Timeline::new();
        let first = fader.schedule_arrival_effects(0.0, &mut timeline);
        let second = fader.schedule_arrival_effects(100.0, &mut timeline);
        assert_ne!(first, second);
        assert_eq!(timeline.len(), 2);
        let fired = timeline.pop_due(400.0).expect("fade task");
        assert_eq!(fired, ShadowTask::FadeIn { session: second });
        assert!(fader.is_current(fired.session()));
    }
}
