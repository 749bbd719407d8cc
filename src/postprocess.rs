use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalPass {
    Grayscale,
    Glitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassState {
    pub enabled: bool,
    pub render_to_screen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlitchParams {
    pub chromatic_aberration_offset: Vec2,
    /// Min/max seconds between glitch flickers.
    pub delay: Vec2,
    pub duration: Vec2,
    pub strength: Vec2,
}

impl Default for GlitchParams {
    fn default() -> Self {
        Self {
            chromatic_aberration_offset: Vec2::ZERO,
            delay: Vec2::new(0.1, 0.3),
            duration: Vec2::new(0.05, 0.18),
            strength: Vec2::new(0.2, 0.5),
        }
    }
}

/// Scene render, then grayscale, then glitch.
#[derive(Debug, Clone, PartialEq)]
pub struct PostChain {
    pub grayscale: PassState,
    pub glitch: PassState,
    pub saturation: f32,
    pub glitch_params: GlitchParams,
}

impl PostChain {
    pub fn terminal(&self) -> TerminalPass {
        if self.glitch.enabled && self.glitch.render_to_screen {
            TerminalPass::Glitch
        } else {
            TerminalPass::Grayscale
        }
    }

    pub fn terminal_count(&self) -> usize {
        [self.grayscale, self.glitch].iter().filter(|pass| pass.enabled && pass.render_to_screen).count()
    }
}

/// Final-output adjustments applied on top of the chain (the dark theme inverts the canvas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputFilter {
    pub invert: bool,
    pub monochrome: bool,
}

/// Reconciles the manual glitch toggle and the burst flag into concrete pass routing.
#[derive(Debug, Clone)]
pub struct PostprocessState {
    manual_glitch: bool,
    burst_active: bool,
    chain: PostChain,
    filter: OutputFilter,
}

impl Default for PostprocessState {
    fn default() -> Self {
        Self::new()
    }
}

impl PostprocessState {
    pub fn new() -> Self {
        let mut state = Self {
            manual_glitch: false,
            burst_active: false,
            chain: PostChain {
                grayscale: PassState { enabled: true, render_to_screen: true },
                glitch: PassState::default(),
                saturation: -1.0,
                glitch_params: GlitchParams::default(),
            },
            filter: OutputFilter::default(),
        };
        state.reconcile();
        state
    }

    pub fn manual_glitch(&self) -> bool {
        self.manual_glitch
    }

    pub fn burst_active(&self) -> bool {
        self.burst_active
    }

    pub fn is_glitch_active(&self) -> bool {
        self.manual_glitch || self.burst_active
    }

    pub fn set_manual_glitch(&mut self, enabled: bool) -> bool {
        let changed = self.manual_glitch != enabled;
        self.manual_glitch = enabled;
        self.reconcile();
        changed
    }

    pub fn set_burst_active(&mut self, active: bool) {
        self.burst_active = active;
        self.reconcile();
    }

    pub fn chain(&self) -> &PostChain {
        &self.chain
    }

    pub fn filter(&self) -> OutputFilter {
        self.filter
    }

    pub fn set_invert(&mut self, invert: bool) {
        self.filter.invert = invert;
    }

    pub fn toggle_monochrome(&mut self) -> bool {
        self.filter.monochrome = !self.filter.monochrome;
        self.filter.monochrome
    }

    /// Clears debug filters; theme inversion survives.
    pub fn disable_filters(&mut self) {
        self.filter.monochrome = false;
    }

    fn reconcile(&mut self) {
        let active = self.is_glitch_active();
        self.chain.glitch.enabled = active;
        self.chain.glitch.render_to_screen = active;
        self.chain.grayscale.enabled = true;
        self.chain.grayscale.render_to_screen = !active;
    }
}
