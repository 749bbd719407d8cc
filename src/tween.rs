//! Eased interpolation over wall-clock time.
//!
//! A [`TweenSlot`] holds at most one tween per value kind. Starting a new tween replaces the
//! in-flight one outright; callers pass the value they currently display as the new start so
//! a pre-empted motion continues without snapping.

use crate::time::Millis;
use glam::{Quat, Vec3};

pub const MIN_DURATION_MS: f64 = 1.0;

/// Cubic ease-in-out: `4t³` for the first half, `1 - (-2t + 2)³ / 2` for the second.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Clamps host-provided durations; NaN, negative and sub-millisecond values become 1 ms.
pub fn sanitize_duration(duration_ms: f64) -> f64 {
    if duration_ms.is_finite() {
        duration_ms.max(MIN_DURATION_MS)
    } else if duration_ms == f64::INFINITY {
        f64::MAX
    } else {
        MIN_DURATION_MS
    }
}

pub trait Interpolate: Clone {
    fn interpolate(&self, to: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Interpolate for Vec3 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self.lerp(*to, t)
    }
}

impl Interpolate for Quat {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self.slerp(*to, t)
    }
}

#[derive(Debug, Clone)]
pub struct Tween<T> {
    start: T,
    end: T,
    start_ms: Millis,
    duration_ms: f64,
}

impl<T: Interpolate> Tween<T> {
    pub fn new(start: T, end: T, now: Millis, duration_ms: f64) -> Self {
        Self { start, end, start_ms: now, duration_ms: sanitize_duration(duration_ms) }
    }

    pub fn progress(&self, now: Millis) -> f32 {
        let t = (now - self.start_ms) / self.duration_ms;
        if t.is_nan() {
            return 0.0;
        }
        t.clamp(0.0, 1.0) as f32
    }

    pub fn sample(&self, now: Millis) -> T {
        let t = self.progress(now);
        if t >= 1.0 {
            return self.end.clone();
        }
        let eased = ease_in_out_cubic(t);
        if eased <= 0.0 {
            return self.start.clone();
        }
        self.start.interpolate(&self.end, eased)
    }

    pub fn start_value(&self) -> &T {
        &self.start
    }

    pub fn end_value(&self) -> &T {
        &self.end
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TweenStep<T> {
    Idle,
    Running(T),
    Finished(T),
}

impl<T> TweenStep<T> {
    pub fn value(self) -> Option<T> {
        match self {
            TweenStep::Idle => None,
            TweenStep::Running(value) | TweenStep::Finished(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TweenSlot<T> {
    active: Option<Tween<T>>,
}

impl<T> Default for TweenSlot<T> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<T: Interpolate> TweenSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, from: T, to: T, now: Millis, duration_ms: f64) {
        self.active = Some(Tween::new(from, to, now, duration_ms));
    }

    /// Samples the active tween. Completion clears the slot and pins the value at the end.
    pub fn advance(&mut self, now: Millis) -> TweenStep<T> {
        let Some(tween) = self.active.as_ref() else {
            return TweenStep::Idle;
        };
        if tween.progress(now) >= 1.0 {
            let end = tween.end.clone();
            self.active = None;
            return TweenStep::Finished(end);
        }
        TweenStep::Running(tween.sample(now))
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn target(&self) -> Option<&T> {
        self.active.as_ref().map(|tween| &tween.end)
    }

    pub fn active(&self) -> Option<&Tween<T>> {
        self.active.as_ref()
    }
}
