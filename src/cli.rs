use crate::config::StageConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_SCENE: &str = "assets/NoirHoundLogoScene.glb";
pub const DEFAULT_CONFIG: &str = "config/stage.json";
pub const DEFAULT_FRAMES: u32 = 600;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    scene: Option<PathBuf>,
    config: Option<PathBuf>,
    seed: Option<u64>,
    frames: Option<u32>,
    menu_y_offset: Option<f32>,
    orbit: Option<bool>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Use --scene/--config/--seed/--frames/--menu-y-offset/--orbit with values.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "scene" => overrides.scene = Some(PathBuf::from(value)),
                "config" => overrides.config = Some(PathBuf::from(value)),
                "seed" => {
                    overrides.seed = Some(value.parse::<u64>().with_context(|| format!("Invalid seed '{value}'"))?);
                }
                "frames" => {
                    overrides.frames =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid frame count '{value}'"))?);
                }
                "menu-y-offset" => {
                    let offset =
                        value.parse::<f32>().with_context(|| format!("Invalid menu Y offset '{value}'"))?;
                    if !offset.is_finite() {
                        bail!("Invalid menu Y offset '{value}'. Use a finite number.");
                    }
                    overrides.menu_y_offset = Some(offset);
                }
                "orbit" => overrides.orbit = Some(parse_bool_flag("orbit", &value)?),
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --scene, --config, --seed, --frames, --menu-y-offset, --orbit."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn scene_path(&self) -> PathBuf {
        self.scene.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_SCENE))
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
    }

    pub fn frames(&self) -> u32 {
        self.frames.unwrap_or(DEFAULT_FRAMES)
    }

    pub fn config_overrides(&self) -> StageConfigOverrides {
        StageConfigOverrides { seed: self.seed, menu_y_offset: self.menu_y_offset, orbit_enabled: self.orbit }
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}
