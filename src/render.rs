use crate::camera::StageCamera;
use crate::postprocess::{OutputFilter, PostChain, TerminalPass};
use crate::scene_graph::SceneGraph;
use crate::time::Millis;
use anyhow::{bail, Result};
use glam::{Mat4, Vec3};

/// Everything a backend needs for one frame besides the scene itself.
#[derive(Debug, Clone)]
pub struct FramePacket {
    pub index: u64,
    pub time_ms: Millis,
    pub camera: StageCamera,
    pub view_projection: Mat4,
    pub moving_light: Option<Vec3>,
    pub shadow_opacity: f32,
    pub filter: OutputFilter,
}

pub trait RenderBackend {
    /// Backends without a post chain get the scene drawn straight to the output.
    fn supports_postprocessing(&self) -> bool {
        true
    }

    fn render(&mut self, scene: &SceneGraph, frame: &FramePacket, chain: Option<&PostChain>) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub index: u64,
    pub time_ms: Millis,
    pub camera_position: Vec3,
    pub lens_mm: f32,
    pub moving_light: Option<Vec3>,
    pub shadow_opacity: f32,
    /// `None` when the frame skipped the post chain.
    pub terminal: Option<TerminalPass>,
    pub terminal_count: usize,
    pub filter: OutputFilter,
    pub visible_nodes: usize,
}

/// Records frames instead of drawing them. Used by the driver binary and tests.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    frames: Vec<FrameRecord>,
    postprocessing: bool,
    fail_after: Option<usize>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self { frames: Vec::new(), postprocessing: true, fail_after: None }
    }

    pub fn without_postprocessing() -> Self {
        Self { postprocessing: false, ..Self::new() }
    }

    /// Every render after `count` successful frames fails.
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn last(&self) -> Option<&FrameRecord> {
        self.frames.last()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl RenderBackend for HeadlessBackend {
    fn supports_postprocessing(&self) -> bool {
        self.postprocessing
    }

    fn render(&mut self, scene: &SceneGraph, frame: &FramePacket, chain: Option<&PostChain>) -> Result<()> {
        if matches!(self.fail_after, Some(limit) if self.frames.len() >= limit) {
            bail!("headless backend refused frame {}", frame.index);
        }
        let visible_nodes =
            scene.node_ids().filter(|id| scene.node(*id).map_or(false, |node| node.visible)).count();
        self.frames.push(FrameRecord {
            index: frame.index,
            time_ms: frame.time_ms,
            camera_position: frame.camera.pose.position,
            lens_mm: frame.camera.lens_mm,
            moving_light: frame.moving_light,
            shadow_opacity: frame.shadow_opacity,
            terminal: chain.map(PostChain::terminal),
            terminal_count: chain.map_or(1, PostChain::terminal_count),
            filter: frame.filter,
            visible_nodes,
        });
        Ok(())
    }
}
