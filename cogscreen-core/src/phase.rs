use serde::{Deserialize, Serialize};

/// Lifecycle of a single test run. Transitions only move forward.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Idle,
    Intro,
    Running,
    Ended,
}

impl RunState {
    pub fn next(&self) -> Option<Self> {
        use RunState::*;
        Some(match self {
            Idle => Intro,
            Intro => Running,
            Running => Ended,
            Ended => return None,
        })
    }

    pub fn allows_input(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_intro(&self) -> bool {
        matches!(self, Self::Intro)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }
}
