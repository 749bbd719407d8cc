use crate::scene_graph::NodeId;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// The moving light reached its menu target; camera and overlay sequences were started.
    LightArrived { distance: f32 },
    MenuEntered,
    MenuExited,
    BurstStarted { token: u64, steps: u32 },
    BurstSettled { token: u64 },
    BurstFinished { token: u64 },
    ManualGlitchChanged { enabled: bool },
    ThemeChanged { dark: bool },
    MovingLightReplaced { original: NodeId, replacement: NodeId },
    SubjectShadowChanged { casting: bool },
}

impl fmt::Display for StageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageEvent::LightArrived { distance } => write!(f, "LightArrived distance={distance:.4}"),
            StageEvent::MenuEntered => write!(f, "MenuEntered"),
            StageEvent::MenuExited => write!(f, "MenuExited"),
            StageEvent::BurstStarted { token, steps } => write!(f, "BurstStarted token={token} steps={steps}"),
            StageEvent::BurstSettled { token } => write!(f, "BurstSettled token={token}"),
            StageEvent::BurstFinished { token } => write!(f, "BurstFinished token={token}"),
            StageEvent::ManualGlitchChanged { enabled } => write!(f, "ManualGlitchChanged enabled={enabled}"),
            StageEvent::ThemeChanged { dark } => write!(f, "ThemeChanged dark={dark}"),
            StageEvent::MovingLightReplaced { original, replacement } => write!(
                f,
                "MovingLightReplaced original={} replacement={}",
                original.index(),
                replacement.index()
            ),
            StageEvent::SubjectShadowChanged { casting } => write!(f, "SubjectShadowChanged casting={casting}"),
        }
    }
}

#[derive(Default, Debug)]
pub struct EventBus {
    events: Vec<StageEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: StageEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<StageEvent> {
        self.events.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
