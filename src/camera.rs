use crate::config::{CameraConfig, OrbitConfig};
use crate::time::Millis;
use crate::tween::{Interpolate, TweenSlot, TweenStep};
use glam::{Mat3, Mat4, Quat, Vec2, Vec3};

const DEFAULT_UP: Vec3 = Vec3::Y;
const MIN_LENS_MM: f32 = 1e-3;

/// World-space position and orientation. Cameras look down their local -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self { position, rotation: look_rotation(position, target) }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn distance(&self, other: &Pose) -> f32 {
        self.position.distance(other.position)
    }
}

impl Interpolate for Pose {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        Self { position: self.position.lerp(to.position, t), rotation: self.rotation.slerp(to.rotation, t) }
    }
}

/// Rotation that points -Z from `eye` toward `target` with +Y kept up where possible.
pub fn look_rotation(eye: Vec3, target: Vec3) -> Quat {
    let forward = (target - eye).normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = forward.cross(DEFAULT_UP);
    if right.length_squared() < 1e-8 {
        right = forward.cross(Vec3::Z);
    }
    let right = right.normalize();
    let up = right.cross(forward);
    Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize()
}

/// Vertical field of view for a physical lens: `2·atan(sensor / 2 / focal)`.
pub fn fov_from_lens(focal_length_mm: f32, sensor_height_mm: f32) -> f32 {
    let focal = sanitize_mm(focal_length_mm);
    let sensor = sanitize_mm(sensor_height_mm);
    2.0 * ((sensor * 0.5) / focal).atan()
}

fn sanitize_mm(value: f32) -> f32 {
    if value.is_finite() {
        value.max(MIN_LENS_MM)
    } else {
        MIN_LENS_MM
    }
}

#[derive(Debug, Clone)]
pub struct StageCamera {
    pub pose: Pose,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    pub lens_mm: f32,
    pub sensor_height_mm: f32,
}

impl StageCamera {
    pub fn new(pose: Pose, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { pose, fov_y_radians, near, far, aspect: 1.0, lens_mm: 50.0, sensor_height_mm: 24.0 }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.pose.rotation, self.pose.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, self.aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn apply_lens(&mut self, focal_length_mm: f32, sensor_height_mm: f32) {
        self.lens_mm = sanitize_mm(focal_length_mm);
        self.sensor_height_mm = sanitize_mm(sensor_height_mm);
        self.fov_y_radians = fov_from_lens(self.lens_mm, self.sensor_height_mm);
    }
}

/// Orbit-style controller storing yaw/pitch around a focus point, with damped user input.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enabled: bool,
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    azimuth_limits: Option<(f32, f32)>,
    polar_limits: Option<(f32, f32)>,
    pending: Vec2,
}

impl OrbitControls {
    pub fn new(config: &OrbitConfig) -> Self {
        Self {
            target: Vec3::ZERO,
            enabled: config.enabled,
            damping: config.damping.clamp(0.0, 1.0),
            min_distance: config.min_distance.max(0.0),
            max_distance: config.max_distance.max(config.min_distance),
            azimuth_limits: None,
            polar_limits: None,
            pending: Vec2::ZERO,
        }
    }

    /// Restricts rotation to a window around the angles `pose` currently has relative to the focus.
    pub fn limit_around(&mut self, pose: &Pose, azimuth_range: f32, polar_range: f32) {
        let Some((_, azimuth, polar)) = spherical(pose.position - self.target) else {
            return;
        };
        self.azimuth_limits = Some((azimuth - azimuth_range, azimuth + azimuth_range));
        self.polar_limits =
            Some(((polar - polar_range).max(0.0), (polar + polar_range).min(std::f32::consts::PI)));
    }

    /// Queues a user drag in radians (x = azimuth, y = polar).
    pub fn orbit(&mut self, delta: Vec2) {
        if self.enabled && delta.is_finite() {
            self.pending += delta;
        }
    }

    pub fn update(&mut self, pose: &mut Pose) {
        let Some((radius, mut azimuth, mut polar)) = spherical(pose.position - self.target) else {
            return;
        };
        let step = if self.damping > 0.0 { self.damping } else { 1.0 };
        azimuth += self.pending.x * step;
        polar += self.pending.y * step;
        self.pending = if self.damping > 0.0 { self.pending * (1.0 - self.damping) } else { Vec2::ZERO };

        if let Some((min, max)) = self.azimuth_limits {
            azimuth = azimuth.clamp(min, max);
        }
        if let Some((min, max)) = self.polar_limits {
            polar = polar.clamp(min, max);
        }
        polar = polar.clamp(1e-6, std::f32::consts::PI - 1e-6);
        let radius = radius.clamp(self.min_distance, self.max_distance);

        let offset = Vec3::new(
            radius * polar.sin() * azimuth.sin(),
            radius * polar.cos(),
            radius * polar.sin() * azimuth.cos(),
        );
        pose.position = self.target + offset;
        pose.rotation = look_rotation(pose.position, self.target);
    }
}

/// (radius, azimuth around +Y measured from +Z, polar angle from +Y)
fn spherical(offset: Vec3) -> Option<(f32, f32, f32)> {
    let radius = offset.length();
    if radius < 1e-6 || !radius.is_finite() {
        return None;
    }
    let azimuth = offset.x.atan2(offset.z);
    let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
    Some((radius, azimuth, polar))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraReport {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

/// Owns the stage camera. While a tween runs it has exclusive control of the pose; otherwise the
/// orbit controller keeps the camera aimed at the live focus point.
#[derive(Debug, Clone)]
pub struct CameraDirector {
    camera: StageCamera,
    tween: TweenSlot<Pose>,
    orbit: OrbitControls,
    default_lens_mm: f32,
    default_sensor_height_mm: f32,
}

impl CameraDirector {
    pub fn new(pose: Pose, config: &CameraConfig, orbit: &OrbitConfig) -> Self {
        let mut camera = StageCamera::new(pose, fov_from_lens(50.0, 24.0), config.near, config.far);
        camera.apply_lens(config.default_lens_mm, config.sensor_height_mm);
        Self {
            camera,
            tween: TweenSlot::new(),
            orbit: OrbitControls::new(orbit),
            default_lens_mm: sanitize_mm(config.default_lens_mm),
            default_sensor_height_mm: sanitize_mm(config.sensor_height_mm),
        }
    }

    pub fn camera(&self) -> &StageCamera {
        &self.camera
    }

    pub fn pose(&self) -> Pose {
        self.camera.pose
    }

    pub fn orbit(&self) -> &OrbitControls {
        &self.orbit
    }

    pub fn orbit_mut(&mut self) -> &mut OrbitControls {
        &mut self.orbit
    }

    /// Replaces any in-flight move, starting from wherever the camera is right now.
    pub fn ease_to(&mut self, pose: Pose, duration_ms: f64, now: Millis) {
        self.tween.start(self.camera.pose, pose, now, duration_ms);
    }

    /// Instantaneous placement; discards any straggling tween.
    pub fn snap_to(&mut self, pose: Pose) {
        self.tween.cancel();
        self.camera.pose = pose;
    }

    pub fn is_tweening(&self) -> bool {
        self.tween.is_active()
    }

    pub fn tween_target(&self) -> Option<Pose> {
        self.tween.target().copied()
    }

    pub fn refresh_focus(&mut self, focus: Vec3) {
        self.orbit.target = focus;
    }

    pub fn advance(&mut self, now: Millis) {
        match self.tween.advance(now) {
            TweenStep::Idle => {}
            TweenStep::Running(pose) | TweenStep::Finished(pose) => self.camera.pose = pose,
        }
    }

    pub fn update_orbit(&mut self) {
        if !self.tween.is_active() {
            self.orbit.update(&mut self.camera.pose);
        }
    }

    /// Sets the focal length against the default sensor, discarding any host sensor override.
    pub fn apply_lens(&mut self, focal_length_mm: f32) {
        self.camera.apply_lens(focal_length_mm, self.default_sensor_height_mm);
    }

    pub fn apply_lens_sensor(&mut self, focal_length_mm: f32, sensor_height_mm: f32) {
        self.camera.apply_lens(focal_length_mm, sensor_height_mm);
        log::info!(
            "[camera] Applied lens/sensor lens_mm={:.1} sensor_mm={:.1} fov_deg={:.3}",
            self.camera.lens_mm,
            self.camera.sensor_height_mm,
            self.camera.fov_y_radians.to_degrees()
        );
    }

    pub fn restore_default_lens(&mut self) {
        self.apply_lens(self.default_lens_mm);
    }

    pub fn default_lens_mm(&self) -> f32 {
        self.default_lens_mm
    }

    pub fn default_sensor_height_mm(&self) -> f32 {
        self.default_sensor_height_mm
    }

    pub fn default_fov_y_radians(&self) -> f32 {
        fov_from_lens(self.default_lens_mm, self.default_sensor_height_mm)
    }

    /// Moves the camera back along its view direction so its distance to `focus` scales by `multiplier`.
    pub fn back_off(&mut self, focus: Vec3, multiplier: f32) {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return;
        }
        let current = self.camera.pose.position.distance(focus);
        let delta = current * multiplier - current;
        let forward = self.camera.pose.forward();
        self.camera.pose.position -= forward * delta;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        self.camera.aspect = width as f32 / height as f32;
    }

    pub fn report(&self) -> CameraReport {
        let report = CameraReport {
            position: self.camera.pose.position,
            rotation: self.camera.pose.rotation,
            fov_degrees: self.camera.fov_y_radians.to_degrees(),
            near: self.camera.near,
            far: self.camera.far,
        };
        log::info!(
            "[camera] position={:?} rotation={:?} fov_deg={:.3} near={} far={}",
            report.position,
            report.rotation,
            report.fov_degrees,
            report.near,
            report.far
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn director_at(pose: Pose) -> CameraDirector {
        CameraDirector::new(pose, &CameraConfig::default(), &OrbitConfig::default())
    }

    #[test]
    fn look_rotation_points_forward_at_target() {
        let pose = Pose::looking_at(Vec3::new(0.38, 3.05, 26.62), Vec3::ZERO);
        let expected = (Vec3::ZERO - pose.position).normalize();
        assert!(pose.forward().distance(expected) < 1e-5);
        let straight_down = Pose::looking_at(Vec3::Y * 5.0, Vec3::ZERO);
        assert!(straight_down.forward().distance(Vec3::NEG_Y) < 1e-5);
    }

    #[test]
    fn default_lens_gives_narrow_fov() {
        let fov = fov_from_lens(1000.0, 30.0).to_degrees();
        assert!((fov - 1.7188).abs() < 1e-3, "fov was {fov}");
        assert!(fov_from_lens(-1.0, f32::NAN).is_finite());
    }

    #[test]
    fn camera_view_projection_is_finite() {
        let director = director_at(Pose::looking_at(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO));
        let vp = director.camera().view_projection();
        assert!(!vp.to_cols_array().iter().any(|v| v.is_nan() || v.is_infinite()));
    }

    #[test]
    fn ease_then_snap_discards_tween() {
        let start = Pose::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let end = Pose::looking_at(Vec3::new(5.0, 0.0, 10.0), Vec3::ZERO);
        let mut director = director_at(start);
        director.ease_to(end, 200.0, 0.0);
        director.advance(100.0);
        let mid = director.pose().position.x;
        assert!(mid > 0.0 && mid < 5.0);
        director.snap_to(start);
        director.advance(500.0);
        assert_eq!(director.pose(), start);
        assert!(!director.is_tweening());
    }

    #[test]
    fn orbit_keeps_distance_and_respects_limits() {
        let home = Pose::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let mut director = director_at(home);
        director.refresh_focus(Vec3::ZERO);
        director.orbit_mut().limit_around(&home, 0.2, 0.1);
        for _ in 0..200 {
            director.orbit_mut().orbit(Vec2::new(0.5, 0.0));
            director.update_orbit();
        }
        let pose = director.pose();
        assert!((pose.position.length() - 10.0).abs() < 1e-3);
        let azimuth = pose.position.x.atan2(pose.position.z);
        assert!(azimuth <= 0.2 + 1e-4, "azimuth {azimuth} exceeded limit");
        let to_target = (Vec3::ZERO - pose.position).normalize();
        assert!(pose.forward().distance(to_target) < 1e-4);
    }

    #[test]
    fn back_off_scales_distance_to_focus() {
        let mut director = director_at(Pose::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO));
        director.back_off(Vec3::ZERO, 1.1);
        assert!((director.pose().position.z - 11.0).abs() < 1e-4);
    }

    #[test]
    fn restoring_default_lens_discards_sensor_override() {
        let mut director = director_at(Pose::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO));
        director.apply_lens_sensor(50.0, 24.0);
        director.restore_default_lens();
        let camera = director.camera();
        assert_eq!(camera.lens_mm, 1000.0);
        assert_eq!(camera.sensor_height_mm, 30.0);
        assert!((camera.fov_y_radians - director.default_fov_y_radians()).abs() < 1e-7);
    }
}
