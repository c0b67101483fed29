use cogscreen_core::ResponseEvent;

/// Classification of a CPT stimulus window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    CorrectDetection,
    CommissionError,
    Omission,
    /// Non-target left alone.
    CorrectRejection,
}

impl Outcome {
    pub fn classify(is_target: bool, responded: bool) -> Self {
        match (is_target, responded) {
            (true, true) => Outcome::CorrectDetection,
            (true, false) => Outcome::Omission,
            (false, true) => Outcome::CommissionError,
            (false, false) => Outcome::CorrectRejection,
        }
    }
}

/// The single open response slot for the active stimulus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ResponseWindow {
    pub stimulus_index: usize,
    pub is_target: bool,
    pub opened_at_ms: f64,
    pub responded: bool,
}

impl ResponseWindow {
    pub fn open(stimulus_index: usize, is_target: bool, opened_at_ms: f64) -> Self {
        Self {
            stimulus_index,
            is_target,
            opened_at_ms,
            responded: false,
        }
    }

    /// Fills the slot with the first response; later ones return `None`.
    pub fn capture(&mut self, now_ms: f64) -> Option<ResponseEvent> {
        if self.responded {
            return None;
        }
        self.responded = true;
        Some(ResponseEvent {
            stimulus_index: self.stimulus_index,
            response_time_ms: (now_ms - self.opened_at_ms).max(0.0),
            correct: self.is_target,
        })
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::classify(self.is_target, self.responded)
    }
}
