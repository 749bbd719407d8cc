use anyhow::{Context, Result};
use rand::Rng;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Closed interval sampled uniformly by the randomized effects.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        if !(self.max > self.min) {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightConfig {
    #[serde(default = "LightConfig::default_menu_y_offset")]
    pub menu_y_offset: f32,
    /// Fraction of the remaining distance closed per second, before clamping.
    #[serde(default = "LightConfig::default_ease_rate")]
    pub ease_rate: f32,
    #[serde(default = "LightConfig::default_ease_min")]
    pub ease_min: f32,
    #[serde(default = "LightConfig::default_ease_max")]
    pub ease_max: f32,
    #[serde(default = "LightConfig::default_arrival_tolerance")]
    pub arrival_tolerance: f32,
    #[serde(default = "LightConfig::default_intensity")]
    pub default_intensity: f32,
    #[serde(default = "LightConfig::default_arrival_camera_ease_ms")]
    pub arrival_camera_ease_ms: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_lens_mm")]
    pub default_lens_mm: f32,
    #[serde(default = "CameraConfig::default_sensor_height_mm")]
    pub sensor_height_mm: f32,
    #[serde(default = "CameraConfig::default_home_ease_ms")]
    pub home_ease_ms: f64,
    #[serde(default = "CameraConfig::default_distance_multiplier")]
    pub distance_multiplier: f32,
    #[serde(default = "CameraConfig::default_near")]
    pub near: f32,
    #[serde(default = "CameraConfig::default_far")]
    pub far: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrbitConfig {
    /// Touch hosts turn orbiting off entirely.
    #[serde(default = "OrbitConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "OrbitConfig::default_damping")]
    pub damping: f32,
    #[serde(default = "OrbitConfig::default_min_distance")]
    pub min_distance: f32,
    #[serde(default = "OrbitConfig::default_max_distance")]
    pub max_distance: f32,
    #[serde(default = "OrbitConfig::default_azimuth_range")]
    pub azimuth_range: f32,
    #[serde(default = "OrbitConfig::default_polar_range")]
    pub polar_range: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShadowShapeConfig {
    #[serde(default = "ShadowShapeConfig::default_debounce")]
    pub debounce: f32,
    #[serde(default = "ShadowShapeConfig::default_initial_fade_ms")]
    pub initial_fade_ms: f64,
    #[serde(default = "ShadowShapeConfig::default_exit_fade_ms")]
    pub exit_fade_ms: f64,
    #[serde(default = "ShadowShapeConfig::default_arrival_fade_delay_ms")]
    pub arrival_fade_delay_ms: f64,
    #[serde(default = "ShadowShapeConfig::default_arrival_fade_ms")]
    pub arrival_fade_ms: f64,
    #[serde(default = "ShadowShapeConfig::default_shadow_disable_delay_ms")]
    pub shadow_disable_delay_ms: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlitchConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "GlitchConfig::default_burst_min")]
    pub burst_min: u32,
    #[serde(default = "GlitchConfig::default_burst_max")]
    pub burst_max: u32,
    #[serde(default = "GlitchConfig::default_step_gap_ms")]
    pub step_gap_ms: Span,
    #[serde(default = "GlitchConfig::default_step_duration_ms")]
    pub step_duration_ms: Span,
    #[serde(default = "GlitchConfig::default_window_ms")]
    pub window_ms: Span,
    #[serde(default = "GlitchConfig::default_force_correction_ms")]
    pub force_correction_ms: f64,
    #[serde(default = "GlitchConfig::default_jitter_lens_mm")]
    pub jitter_lens_mm: Span,
    #[serde(default = "GlitchConfig::default_jitter_height")]
    pub jitter_height: Span,
    /// `None` disables the burst played shortly after the first frame.
    #[serde(default = "GlitchConfig::default_startup_burst_delay_ms")]
    pub startup_burst_delay_ms: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShadowConfig {
    #[serde(default = "ShadowConfig::default_map_size")]
    pub map_size: u32,
    #[serde(default = "ShadowConfig::default_bias")]
    pub bias: f32,
    #[serde(default)]
    pub normal_bias: f32,
    #[serde(default = "ShadowConfig::default_spot_angle")]
    pub spot_angle: f32,
    #[serde(default = "ShadowConfig::default_spot_penumbra")]
    pub spot_penumbra: f32,
    #[serde(default = "ShadowConfig::default_spot_decay")]
    pub spot_decay: f32,
    #[serde(default = "ShadowConfig::default_spot_distance")]
    pub spot_distance: f32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StageConfig {
    #[serde(default)]
    pub light: LightConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub orbit: OrbitConfig,
    #[serde(default)]
    pub shadow_shape: ShadowShapeConfig,
    #[serde(default)]
    pub glitch: GlitchConfig,
    #[serde(default)]
    pub shadows: ShadowConfig,
}

#[derive(Debug, Clone, Default)]
pub struct StageConfigOverrides {
    pub seed: Option<u64>,
    pub menu_y_offset: Option<f32>,
    pub orbit_enabled: Option<bool>,
}

impl LightConfig {
    const fn default_menu_y_offset() -> f32 {
        0.5
    }

    const fn default_ease_rate() -> f32 {
        5.0
    }

    const fn default_ease_min() -> f32 {
        0.05
    }

    const fn default_ease_max() -> f32 {
        0.25
    }

    const fn default_arrival_tolerance() -> f32 {
        0.03
    }

    const fn default_intensity() -> f32 {
        100.0
    }

    const fn default_arrival_camera_ease_ms() -> f64 {
        250.0
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            menu_y_offset: Self::default_menu_y_offset(),
            ease_rate: Self::default_ease_rate(),
            ease_min: Self::default_ease_min(),
            ease_max: Self::default_ease_max(),
            arrival_tolerance: Self::default_arrival_tolerance(),
            default_intensity: Self::default_intensity(),
            arrival_camera_ease_ms: Self::default_arrival_camera_ease_ms(),
        }
    }
}

impl CameraConfig {
    const fn default_lens_mm() -> f32 {
        1000.0
    }

    const fn default_sensor_height_mm() -> f32 {
        30.0
    }

    const fn default_home_ease_ms() -> f64 {
        220.0
    }

    const fn default_distance_multiplier() -> f32 {
        1.1
    }

    const fn default_near() -> f32 {
        0.1
    }

    const fn default_far() -> f32 {
        2000.0
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            default_lens_mm: Self::default_lens_mm(),
            sensor_height_mm: Self::default_sensor_height_mm(),
            home_ease_ms: Self::default_home_ease_ms(),
            distance_multiplier: Self::default_distance_multiplier(),
            near: Self::default_near(),
            far: Self::default_far(),
        }
    }
}

impl OrbitConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_damping() -> f32 {
        0.08
    }

    const fn default_min_distance() -> f32 {
        0.2
    }

    const fn default_max_distance() -> f32 {
        100.0
    }

    const fn default_azimuth_range() -> f32 {
        0.2
    }

    const fn default_polar_range() -> f32 {
        0.1
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            damping: Self::default_damping(),
            min_distance: Self::default_min_distance(),
            max_distance: Self::default_max_distance(),
            azimuth_range: Self::default_azimuth_range(),
            polar_range: Self::default_polar_range(),
        }
    }
}

impl ShadowShapeConfig {
    const fn default_debounce() -> f32 {
        0.02
    }

    const fn default_initial_fade_ms() -> f64 {
        150.0
    }

    const fn default_exit_fade_ms() -> f64 {
        120.0
    }

    const fn default_arrival_fade_delay_ms() -> f64 {
        300.0
    }

    const fn default_arrival_fade_ms() -> f64 {
        5000.0
    }

    const fn default_shadow_disable_delay_ms() -> f64 {
        4300.0
    }
}

impl Default for ShadowShapeConfig {
    fn default() -> Self {
        Self {
            debounce: Self::default_debounce(),
            initial_fade_ms: Self::default_initial_fade_ms(),
            exit_fade_ms: Self::default_exit_fade_ms(),
            arrival_fade_delay_ms: Self::default_arrival_fade_delay_ms(),
            arrival_fade_ms: Self::default_arrival_fade_ms(),
            shadow_disable_delay_ms: Self::default_shadow_disable_delay_ms(),
        }
    }
}

impl GlitchConfig {
    const fn default_burst_min() -> u32 {
        5
    }

    const fn default_burst_max() -> u32 {
        12
    }

    const fn default_step_gap_ms() -> Span {
        Span::new(40.0, 120.0)
    }

    const fn default_step_duration_ms() -> Span {
        Span::new(50.0, 120.0)
    }

    const fn default_window_ms() -> Span {
        Span::new(500.0, 1200.0)
    }

    const fn default_force_correction_ms() -> f64 {
        300.0
    }

    const fn default_jitter_lens_mm() -> Span {
        Span::new(1000.0, 2000.0)
    }

    const fn default_jitter_height() -> Span {
        Span::new(1.0, 8.0)
    }

    const fn default_startup_burst_delay_ms() -> Option<f64> {
        Some(60.0)
    }
}

impl Default for GlitchConfig {
    fn default() -> Self {
        Self {
            seed: None,
            burst_min: Self::default_burst_min(),
            burst_max: Self::default_burst_max(),
            step_gap_ms: Self::default_step_gap_ms(),
            step_duration_ms: Self::default_step_duration_ms(),
            window_ms: Self::default_window_ms(),
            force_correction_ms: Self::default_force_correction_ms(),
            jitter_lens_mm: Self::default_jitter_lens_mm(),
            jitter_height: Self::default_jitter_height(),
            startup_burst_delay_ms: Self::default_startup_burst_delay_ms(),
        }
    }
}

impl ShadowConfig {
    const fn default_map_size() -> u32 {
        2048
    }

    const fn default_bias() -> f32 {
        0.0015
    }

    const fn default_spot_angle() -> f32 {
        std::f32::consts::FRAC_PI_6
    }

    const fn default_spot_penumbra() -> f32 {
        0.35
    }

    const fn default_spot_decay() -> f32 {
        2.0
    }

    const fn default_spot_distance() -> f32 {
        12.0
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_size: Self::default_map_size(),
            bias: Self::default_bias(),
            normal_bias: 0.0,
            spot_angle: Self::default_spot_angle(),
            spot_penumbra: Self::default_spot_penumbra(),
            spot_decay: Self::default_spot_decay(),
            spot_distance: Self::default_spot_distance(),
        }
    }
}

impl StageConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("[config] Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &StageConfigOverrides) {
        if let Some(seed) = overrides.seed {
            self.glitch.seed = Some(seed);
        }
        if let Some(offset) = overrides.menu_y_offset {
            self.light.menu_y_offset = offset;
        }
        if let Some(enabled) = overrides.orbit_enabled {
            self.orbit.enabled = enabled;
        }
    }
}

impl StageConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.seed.is_none() && self.menu_y_offset.is_none() && self.orbit_enabled.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.seed.is_some() {
            fields.push("seed");
        }
        if self.menu_y_offset.is_some() {
            fields.push("menu_y_offset");
        }
        if self.orbit_enabled.is_some() {
            fields.push("orbit_enabled");
        }
        fields
    }
}
