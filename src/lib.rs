pub mod camera;
pub mod cli;
pub mod config;
pub mod events;
pub mod glitch;
pub mod light_director;
pub mod lights;
pub mod materials;
pub mod postprocess;
pub mod references;
pub mod render;
pub mod scene_graph;
pub mod schedule;
pub mod shadow_shape;
pub mod stage;
pub mod time;
pub mod tween;

pub use config::{StageConfig, StageConfigOverrides};
pub use events::StageEvent;
pub use render::{HeadlessBackend, RenderBackend};
pub use stage::{LogoStage, Theme};
