//! The scene controller. One `LogoStage` owns the imported scene and every director; the host
//! forwards input signals to it and calls [`LogoStage::tick`] once per frame.

use crate::camera::{look_rotation, CameraDirector, CameraReport, Pose};
use crate::config::StageConfig;
use crate::events::{EventBus, StageEvent};
use crate::glitch::{BurstTargets, GlitchSequencer, GlitchTask};
use crate::light_director::{LightArrival, LightDirector, RegionTransition};
use crate::lights::{LightId, LightRig, LightScale};
use crate::materials::{self, SubjectMaterials};
use crate::postprocess::PostprocessState;
use crate::references::{resolve, SceneHandles, SceneReferences};
use crate::render::{FramePacket, RenderBackend};
use crate::scene_graph::{NodeId, SceneGraph};
use crate::schedule::{Session, Timeline};
use crate::shadow_shape::{ShadowShapeFader, ShadowTask};
use crate::time::{FrameDelta, Millis};
use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageTask {
    Shadow(ShadowTask),
    Glitch(GlitchTask),
    StartupBurst,
}

impl From<ShadowTask> for StageTask {
    fn from(task: ShadowTask) -> Self {
        StageTask::Shadow(task)
    }
}

impl From<GlitchTask> for StageTask {
    fn from(task: GlitchTask) -> Self {
        StageTask::Glitch(task)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }
}

pub struct LogoStage {
    config: StageConfig,
    graph: SceneGraph,
    references: SceneReferences,
    handles: SceneHandles,
    lights: LightRig,
    light_director: LightDirector,
    camera: CameraDirector,
    shadow: ShadowShapeFader,
    glitch: GlitchSequencer,
    post: PostprocessState,
    subject_materials: SubjectMaterials,
    timeline: Timeline<StageTask>,
    events: EventBus,
    frame_delta: FrameDelta,
    frame_index: u64,
    theme: Theme,
    started: bool,
}

impl LogoStage {
    /// Imports the asset and prepares it. A failed import leaves no stage behind.
    pub fn load(path: impl AsRef<Path>, config: StageConfig) -> Result<Self> {
        let path = path.as_ref();
        let graph = SceneGraph::load_gltf(path)
            .with_context(|| format!("Failed to load logo scene {}", path.display()))?;
        Ok(Self::from_graph(graph, config))
    }

    pub fn from_graph(mut graph: SceneGraph, config: StageConfig) -> Self {
        let resolved = resolve(&graph);
        let references = resolved.references;
        let handles = resolved.handles;
        let mut events = EventBus::default();

        let aim = references.look_target.node.or(handles.subject);
        let mut lights = LightRig::new(&graph, &handles);
        if let Some(swap) = lights.ensure_moving_light_shadow_capable(&mut graph, aim) {
            events.push(StageEvent::MovingLightReplaced { original: swap.original, replacement: swap.replacement });
        }
        lights.setup_shadows(&mut graph, &config.shadows, aim);
        lights.set_all_intensity(&mut graph, config.light.default_intensity);

        materials::replace_ground_materials(&mut graph);
        let ground = materials::configure_subject_shadows(&mut graph, handles.subject);
        let subject_materials = SubjectMaterials::cache(&graph, handles.subject);
        let overlay = handles
            .shadow_shape
            .map(|root| materials::prepare_shadow_shape(&mut graph, root, 0.0))
            .unwrap_or_default();
        let shadow = ShadowShapeFader::new(overlay, 0.0, &config.shadow_shape);

        let focus = references.look_target.position(&graph);
        let initial = match handles.camera {
            Some(node) => Pose::new(graph.world_position(node), graph.world_rotation(node)),
            None => {
                let anchor = references.camera_anchor_1;
                Pose::new(anchor.position, anchor.rotation.unwrap_or_else(|| look_rotation(anchor.position, focus)))
            }
        };
        let mut camera = CameraDirector::new(initial, &config.camera, &config.orbit);
        camera.refresh_focus(focus);
        camera.back_off(focus, config.camera.distance_multiplier);
        let home = Pose::looking_at(references.camera_home, focus);
        camera.orbit_mut().limit_around(&home, config.orbit.azimuth_range, config.orbit.polar_range);

        log::info!(
            "[stage] Scene prepared: nodes={} materials={} ground_meshes={} overlay={} glb_camera={}",
            graph.node_count(),
            graph.material_count(),
            ground,
            shadow.is_attached(),
            handles.camera.is_some()
        );

        Self {
            light_director: LightDirector::new(&config.light),
            glitch: GlitchSequencer::new(&config.glitch, config.camera.home_ease_ms),
            post: PostprocessState::new(),
            timeline: Timeline::new(),
            frame_delta: FrameDelta::default(),
            frame_index: 0,
            theme: Theme::Light,
            started: false,
            config,
            graph,
            references,
            handles,
            lights,
            camera,
            shadow,
            subject_materials,
            events,
        }
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Hosts may animate nodes (the look target in particular) between frames.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn references(&self) -> &SceneReferences {
        &self.references
    }

    pub fn handles(&self) -> &SceneHandles {
        &self.handles
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn light_director(&self) -> &LightDirector {
        &self.light_director
    }

    pub fn camera(&self) -> &CameraDirector {
        &self.camera
    }

    pub fn shadow(&self) -> &ShadowShapeFader {
        &self.shadow
    }

    pub fn glitch(&self) -> &GlitchSequencer {
        &self.glitch
    }

    pub fn post(&self) -> &PostprocessState {
        &self.post
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn pending_tasks(&self) -> usize {
        self.timeline.len()
    }

    /// The light the director drives, after any shadow-capable replacement.
    pub fn moving_light(&self) -> Option<NodeId> {
        self.lights.node(LightId::Moving)
    }

    pub fn look_target(&self) -> Vec3 {
        self.references.look_target.position(&self.graph)
    }

    pub fn subject_casts_shadow(&self) -> bool {
        materials::subject_casts_shadow(&self.graph, self.handles.subject)
    }

    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        self.events.drain()
    }

    /// Pointer sample: normalized X plus whether the pointer sits below the navigation threshold.
    pub fn pointer_moved(&mut self, x: f32, below_nav: bool, now: Millis) {
        self.set_menu_region(below_nav, now);
        self.light_director.set_pointer_x(x);
        if !self.light_director.in_menu() {
            self.shadow.initial_fade_out(now);
            self.shadow.fade_out(now);
            self.shadow.cancel_arrival_effects(&mut self.timeline);
        }
    }

    pub fn set_menu_region(&mut self, in_menu: bool, now: Millis) -> Option<RegionTransition> {
        let transition = self.light_director.set_menu_region(in_menu)?;
        self.shadow.fade_out(now);
        self.shadow.cancel_arrival_effects(&mut self.timeline);
        self.set_subject_cast_shadow(true);
        self.events.push(match transition {
            RegionTransition::Entered => StageEvent::MenuEntered,
            RegionTransition::Exited => StageEvent::MenuExited,
        });
        Some(transition)
    }

    pub fn set_menu_y_offset(&mut self, offset: f32) {
        self.light_director.set_menu_y_offset(offset);
    }

    /// Theme notifications re-route the output filter and always start a fresh burst.
    pub fn theme_changed(&mut self, theme: Theme, now: Millis) -> Session {
        self.set_initial_theme(theme);
        self.events.push(StageEvent::ThemeChanged { dark: theme.is_dark() });
        self.trigger_glitch_burst(now)
    }

    /// Applies the theme's output inversion without a burst, for the state found at startup.
    pub fn set_initial_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.post.set_invert(theme.is_dark());
    }

    pub fn trigger_glitch_burst(&mut self, now: Millis) -> Session {
        let look = self.look_target();
        let targets = BurstTargets {
            camera: &mut self.camera,
            post: &mut self.post,
            timeline: &mut self.timeline,
            events: &mut self.events,
        };
        self.glitch.trigger(now, targets, &self.references, look)
    }

    pub fn set_manual_glitch(&mut self, enabled: bool) {
        if self.post.set_manual_glitch(enabled) {
            log::info!("[glitch] Glitch effect manually {}", if enabled { "started" } else { "stopped" });
            self.events.push(StageEvent::ManualGlitchChanged { enabled });
        }
    }

    pub fn toggle_monochrome(&mut self) -> bool {
        let enabled = self.post.toggle_monochrome();
        log::info!("[stage] Monochrome filter {}", if enabled { "enabled" } else { "disabled" });
        enabled
    }

    pub fn disable_filters(&mut self) {
        self.post.disable_filters();
        log::info!("[stage] Canvas filters disabled");
    }

    pub fn set_light_intensity(&mut self, value: f32) {
        self.lights.set_all_intensity(&mut self.graph, value);
    }

    pub fn scale_lights(&mut self, mode: LightScale) {
        self.lights.scale(&mut self.graph, mode);
    }

    pub fn toggle_light_boost(&mut self) -> bool {
        self.lights.toggle_boost(&mut self.graph)
    }

    pub fn toggle_light_visibility(&mut self, id: LightId) -> Option<bool> {
        self.lights.toggle_visibility(&mut self.graph, id)
    }

    pub fn toggle_ambient_light(&mut self) -> bool {
        self.lights.toggle_ambient(&mut self.graph)
    }

    pub fn set_shadow_map_size(&mut self, size: u32) -> usize {
        self.lights.set_shadow_map_size(&mut self.graph, size)
    }

    pub fn set_shadow_bias(&mut self, bias: f32) {
        self.lights.set_shadow_bias(&mut self.graph, bias);
    }

    pub fn set_shadow_normal_bias(&mut self, normal_bias: f32) {
        self.lights.set_shadow_normal_bias(&mut self.graph, normal_bias);
    }

    pub fn set_spot_penumbra(&mut self, penumbra: f32) -> bool {
        self.lights.set_spot_penumbra(&mut self.graph, penumbra)
    }

    pub fn set_beam_angle_degrees(&mut self, degrees: f32) -> bool {
        self.lights.set_beam_angle_degrees(&mut self.graph, degrees)
    }

    pub fn apply_lens_sensor(&mut self, lens_mm: f32, sensor_height_mm: f32) {
        self.camera.apply_lens_sensor(lens_mm, sensor_height_mm);
    }

    pub fn camera_report(&self) -> CameraReport {
        self.camera.report()
    }

    pub fn orbit_drag(&mut self, delta: Vec2) {
        self.camera.orbit_mut().orbit(delta);
    }

    pub fn set_orbit_enabled(&mut self, enabled: bool) {
        self.camera.orbit_mut().enabled = enabled;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    /// Returns true when the imported materials are active afterwards.
    pub fn toggle_subject_material(&mut self) -> bool {
        self.subject_materials.toggle(&mut self.graph)
    }

    pub fn toggle_wireframe(&mut self) -> usize {
        materials::toggle_wireframe(&mut self.graph)
    }

    /// Runs due tasks, advances every director in order, then submits the frame. Render errors
    /// are returned after the state for `now` has been fully advanced.
    pub fn tick(&mut self, now: Millis, backend: &mut dyn RenderBackend) -> Result<()> {
        if !self.started {
            self.started = true;
            if let Some(delay) = self.config.glitch.startup_burst_delay_ms {
                self.timeline.schedule_after(now, delay, StageTask::StartupBurst);
            }
        }
        while let Some(task) = self.timeline.pop_due(now) {
            self.dispatch(task, now);
        }

        let dt = self.frame_delta.sample(now);
        let focus = self.look_target();
        self.camera.refresh_focus(focus);
        if let Some(light) = self.moving_light() {
            if let Some(arrival) = self.light_director.update(dt, &mut self.graph, light, &self.references) {
                self.on_arrival(arrival, focus, now);
            }
        }
        self.camera.advance(now);
        if self.shadow.advance(now).is_some() {
            self.shadow.apply(&mut self.graph);
        }
        self.camera.update_orbit();
        self.submit(now, backend)
    }

    fn on_arrival(&mut self, arrival: LightArrival, focus: Vec3, now: Millis) {
        log::debug!("[stage] Moving light arrived (distance {:.4})", arrival.distance);
        let home = Pose::looking_at(self.references.camera_home, focus);
        self.camera.ease_to(home, self.config.light.arrival_camera_ease_ms, now);
        self.shadow.schedule_arrival_effects(now, &mut self.timeline);
        self.events.push(StageEvent::LightArrived { distance: arrival.distance });
    }

    fn dispatch(&mut self, task: StageTask, now: Millis) {
        match task {
            StageTask::Shadow(task) => {
                if !self.shadow.is_current(task.session()) {
                    return;
                }
                match task {
                    ShadowTask::FadeIn { .. } => {
                        self.shadow.start_arrival_fade(now);
                    }
                    ShadowTask::DisableSubjectShadow { .. } => {
                        if self.light_director.in_menu() {
                            self.set_subject_cast_shadow(false);
                        }
                    }
                }
            }
            StageTask::Glitch(task) => {
                let look = self.look_target();
                let targets = BurstTargets {
                    camera: &mut self.camera,
                    post: &mut self.post,
                    timeline: &mut self.timeline,
                    events: &mut self.events,
                };
                self.glitch.handle(task, now, targets, &self.references, look);
            }
            StageTask::StartupBurst => {
                self.trigger_glitch_burst(now);
            }
        }
    }

    fn set_subject_cast_shadow(&mut self, casting: bool) {
        if materials::set_subject_cast_shadow(&mut self.graph, self.handles.subject, casting) {
            self.events.push(StageEvent::SubjectShadowChanged { casting });
        }
    }

    fn submit(&mut self, now: Millis, backend: &mut dyn RenderBackend) -> Result<()> {
        self.frame_index += 1;
        let camera = self.camera.camera().clone();
        let packet = FramePacket {
            index: self.frame_index,
            time_ms: now,
            view_projection: camera.view_projection(),
            camera,
            moving_light: self.lights.moving_light_position(&self.graph),
            shadow_opacity: self.shadow.opacity(),
            filter: self.post.filter(),
        };
        let chain = if backend.supports_postprocessing() { Some(self.post.chain()) } else { None };
        backend
            .render(&self.graph, &packet, chain)
            .with_context(|| format!("Failed to render frame {}", self.frame_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;

    fn quiet_config() -> StageConfig {
        let mut config = StageConfig::default();
        config.glitch.seed = Some(3);
        config.glitch.startup_burst_delay_ms = None;
        config
    }

    #[test]
    fn empty_scene_runs_on_fallbacks() {
        let mut stage = LogoStage::from_graph(SceneGraph::new(), quiet_config());
        let mut backend = HeadlessBackend::new();
        stage.tick(0.0, &mut backend).expect("tick");
        stage.pointer_moved(0.3, false, 16.0);
        stage.tick(16.0, &mut backend).expect("tick");
        assert_eq!(backend.frame_count(), 2);
        assert_eq!(stage.moving_light(), None);
        assert!(!stage.shadow().is_attached());
        assert_eq!(stage.references().fallbacks.len(), 6);
    }

    #[test]
    fn startup_burst_fires_after_first_frame() {
        let mut config = quiet_config();
        config.glitch.startup_burst_delay_ms = Some(60.0);
        let mut stage = LogoStage::from_graph(SceneGraph::new(), config);
        let mut backend = HeadlessBackend::new();
        stage.tick(1000.0, &mut backend).expect("tick");
        assert!(!stage.post().burst_active());
        stage.tick(1064.0, &mut backend).expect("tick");
        assert!(stage.post().burst_active());
        assert_eq!(stage.glitch().stats().triggered, 1);
    }

    #[test]
    fn render_failure_is_reported() {
        let mut stage = LogoStage::from_graph(SceneGraph::new(), quiet_config());
        let mut backend = HeadlessBackend::new().fail_after(1);
        stage.tick(0.0, &mut backend).expect("first frame");
        let err = stage.tick(16.0, &mut backend).expect_err("second frame fails");
        assert!(format!("{err:#}").contains("Failed to render frame 2"));
        assert_eq!(stage.frame_index(), 2);
    }

    #[test]
    fn theme_sets_output_inversion() {
        let mut stage = LogoStage::from_graph(SceneGraph::new(), quiet_config());
        stage.set_initial_theme(Theme::Dark);
        assert!(stage.post().filter().invert);
        assert_eq!(stage.glitch().stats().triggered, 0);
        stage.theme_changed(Theme::Light, 0.0);
        assert!(!stage.post().filter().invert);
        assert_eq!(stage.glitch().stats().triggered, 1);
        assert!(stage.drain_events().contains(&StageEvent::ThemeChanged { dark: false }));
    }
}
