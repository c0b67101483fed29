use serde::{Deserialize, Serialize};

use crate::config::TestVariant;

/// One presented stimulus. Appended in presentation order, never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StimulusEvent {
    pub index: usize,
    pub value: String,
    pub is_target: bool,
    /// Milliseconds since the run started.
    pub presented_at_ms: f64,
}

/// The two halves of the Trail Making Test.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrailPart {
    A,
    B,
}

impl TrailPart {
    pub fn index(&self) -> usize {
        match self {
            TrailPart::A => 0,
            TrailPart::B => 1,
        }
    }
}

/// A circle on the trail layout, positioned in the unit square.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailItem {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// What the host should currently draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Idle,
    Intro {
        variant: TestVariant,
    },
    /// Lead-in, inter-stimulus gap, or a pause between parts/trials.
    Fixation,
    Stimulus {
        value: String,
    },
    Trail {
        part: TrailPart,
        items: Vec<TrailItem>,
        /// Number of items connected so far; `items[connected]` is expected next.
        connected: usize,
    },
    Digit {
        value: u8,
    },
    Recall {
        length: usize,
    },
    Ended,
}

impl Screen {
    pub fn is_stimulus(&self) -> bool {
        matches!(self, Screen::Stimulus { .. } | Screen::Digit { .. })
    }
}
