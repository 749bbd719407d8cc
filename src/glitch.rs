//! Theme-change glitch burst: a few randomized camera jitters with the glitch pass on, then a
//! settle back to the home pose.
//!
//! ```text
//! Idle --trigger--> Bursting --window elapsed--> Settling --force correction--> Idle
//! ```
//!
//! Every task spawned by a burst carries that burst's token. A newer trigger mints a new token,
//! so the older burst's remaining tasks find a mismatch and return without touching anything.

use crate::camera::{CameraDirector, Pose};
use crate::config::GlitchConfig;
use crate::events::{EventBus, StageEvent};
use crate::postprocess::PostprocessState;
use crate::references::SceneReferences;
use crate::schedule::{Session, SessionCounter, Timeline};
use crate::time::Millis;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstPhase {
    Idle,
    Bursting,
    Settling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlitchTask {
    Step { token: Session },
    Settle { token: Session },
    ForceHome { token: Session },
}

impl GlitchTask {
    pub fn token(&self) -> Session {
        match self {
            GlitchTask::Step { token } | GlitchTask::Settle { token } | GlitchTask::ForceHome { token } => *token,
        }
    }
}

/// Mutable collaborators a burst drives.
pub struct BurstTargets<'a, T> {
    pub camera: &'a mut CameraDirector,
    pub post: &'a mut PostprocessState,
    pub timeline: &'a mut Timeline<T>,
    pub events: &'a mut EventBus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BurstStats {
    pub triggered: u32,
    pub steps_run: u32,
    pub home_restorations: u32,
    pub forced_corrections: u32,
}

#[derive(Debug, Clone)]
pub struct GlitchSequencer {
    config: GlitchConfig,
    home_ease_ms: f64,
    rng: StdRng,
    tokens: SessionCounter,
    phase: BurstPhase,
    steps_planned: u32,
    steps_run: u32,
    stats: BurstStats,
}

impl GlitchSequencer {
    pub fn new(config: &GlitchConfig, home_ease_ms: f64) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config: config.clone(),
            home_ease_ms,
            rng,
            tokens: SessionCounter::new(),
            phase: BurstPhase::Idle,
            steps_planned: 0,
            steps_run: 0,
            stats: BurstStats::default(),
        }
    }

    pub fn phase(&self) -> BurstPhase {
        self.phase
    }

    pub fn current_token(&self) -> Session {
        self.tokens.current()
    }

    pub fn steps_planned(&self) -> u32 {
        self.steps_planned
    }

    pub fn steps_run(&self) -> u32 {
        self.steps_run
    }

    pub fn stats(&self) -> BurstStats {
        self.stats
    }

    /// Starts a burst, superseding whatever an earlier burst still has queued.
    pub fn trigger<T: From<GlitchTask>>(
        &mut self,
        now: Millis,
        targets: BurstTargets<'_, T>,
        references: &SceneReferences,
        look: Vec3,
    ) -> Session {
        let token = self.tokens.advance();
        self.phase = BurstPhase::Bursting;
        let (low, high) = (self.config.burst_min, self.config.burst_max.max(self.config.burst_min));
        self.steps_planned = self.rng.gen_range(low..=high);
        self.steps_run = 0;
        self.stats.triggered += 1;

        targets.post.set_burst_active(true);
        targets.events.push(StageEvent::BurstStarted { token: token.value(), steps: self.steps_planned });
        log::debug!("[glitch] Burst {} started with {} steps", token.value(), self.steps_planned);

        let window = self.config.window_ms.sample(&mut self.rng);
        targets.timeline.schedule_after(now, window, GlitchTask::Settle { token }.into());
        self.step(token, now, targets, references, look);
        token
    }

    pub fn handle<T: From<GlitchTask>>(
        &mut self,
        task: GlitchTask,
        now: Millis,
        targets: BurstTargets<'_, T>,
        references: &SceneReferences,
        look: Vec3,
    ) {
        if !self.tokens.is_current(task.token()) {
            log::debug!("[glitch] Dropping superseded task {:?}", task);
            return;
        }
        match task {
            GlitchTask::Step { token } => self.step(token, now, targets, references, look),
            GlitchTask::Settle { token } => self.settle(token, now, targets, references, look),
            GlitchTask::ForceHome { token } => self.force_home(token, targets, references, look),
        }
    }

    fn step<T: From<GlitchTask>>(
        &mut self,
        token: Session,
        now: Millis,
        targets: BurstTargets<'_, T>,
        references: &SceneReferences,
        look: Vec3,
    ) {
        if self.phase != BurstPhase::Bursting || self.steps_run >= self.steps_planned {
            return;
        }
        self.steps_run += 1;
        self.stats.steps_run += 1;

        let along = self.rng.gen_range(0.0f32..1.0);
        let mut position =
            references.camera_anchor_1.position.lerp(references.camera_anchor_2.position, along);
        position.y = self.config.jitter_height.sample(&mut self.rng) as f32;
        position.z = references.camera_home.z;
        let lens = self.config.jitter_lens_mm.sample(&mut self.rng) as f32;
        let duration = self.config.step_duration_ms.sample(&mut self.rng);

        targets.camera.apply_lens(lens);
        targets.camera.ease_to(Pose::looking_at(position, look), duration, now);

        if self.steps_run < self.steps_planned {
            let gap = self.config.step_gap_ms.sample(&mut self.rng);
            targets.timeline.schedule_after(now, gap, GlitchTask::Step { token }.into());
        }
    }

    fn settle<T: From<GlitchTask>>(
        &mut self,
        token: Session,
        now: Millis,
        targets: BurstTargets<'_, T>,
        references: &SceneReferences,
        look: Vec3,
    ) {
        if self.phase != BurstPhase::Bursting {
            return;
        }
        self.phase = BurstPhase::Settling;
        targets.post.set_burst_active(false);
        targets.camera.ease_to(Pose::looking_at(references.camera_home, look), self.home_ease_ms, now);
        targets.camera.restore_default_lens();
        self.stats.home_restorations += 1;
        targets.events.push(StageEvent::BurstSettled { token: token.value() });
        targets.timeline.schedule_after(now, self.config.force_correction_ms, GlitchTask::ForceHome { token }.into());
        log::debug!("[glitch] Burst {} settling after {} steps", token.value(), self.steps_run);
    }

    fn force_home<T>(
        &mut self,
        token: Session,
        targets: BurstTargets<'_, T>,
        references: &SceneReferences,
        look: Vec3,
    ) {
        if self.phase != BurstPhase::Settling {
            return;
        }
        targets.camera.snap_to(Pose::looking_at(references.camera_home, look));
        targets.camera.restore_default_lens();
        targets.post.set_burst_active(false);
        self.phase = BurstPhase::Idle;
        self.stats.forced_corrections += 1;
        targets.events.push(StageEvent::BurstFinished { token: token.value() });
    }
}
