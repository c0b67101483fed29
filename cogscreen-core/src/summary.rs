use serde::{Deserialize, Serialize};

use crate::config::{TestConfiguration, TestVariant};
use crate::stimulus::StimulusEvent;
use crate::trial::ResponseEvent;

/// Why a run left `Running`.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndReason {
    /// The countdown reached zero.
    TimeExpired,
    /// The protocol ran to its own end (TMT part B done, Digit Span discontinued).
    Finished,
    /// `force_complete` or host teardown.
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CptScores {
    pub total_stimuli: usize,
    pub total_targets: usize,
    pub total_non_targets: usize,
    pub correct_detections: usize,
    pub omission_errors: usize,
    pub commission_errors: usize,
    pub reaction_times: Vec<f64>,
    pub average_reaction_time: f64,
    #[serde(rename = "reactionTimeSD")]
    pub reaction_time_sd: f64,
    pub detection_rate: f64,
    pub omission_error_rate: f64,
    pub commission_error_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TmtScores {
    pub part_a_completion_time: f64,
    pub part_b_completion_time: f64,
    pub part_a_errors: u32,
    pub part_b_errors: u32,
    pub part_a_completed: bool,
    pub part_b_completed: bool,
    pub b_to_a_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitSpanScores {
    pub highest_span_achieved: u32,
    pub correct_trials: u32,
    pub total_trials: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "kebab-case")]
pub enum Scores {
    Cpt(CptScores),
    Tmt(TmtScores),
    DigitSpan(DigitSpanScores),
}

impl Scores {
    /// All-zero scores for a variant.
    pub fn empty(variant: TestVariant) -> Self {
        match variant {
            TestVariant::Cpt => Scores::Cpt(CptScores::default()),
            TestVariant::Tmt => Scores::Tmt(TmtScores::default()),
            TestVariant::DigitSpan => Scores::DigitSpan(DigitSpanScores::default()),
        }
    }

    pub fn variant(&self) -> TestVariant {
        match self {
            Scores::Cpt(_) => TestVariant::Cpt,
            Scores::Tmt(_) => TestVariant::Tmt,
            Scores::DigitSpan(_) => TestVariant::DigitSpan,
        }
    }
}

/// Immutable outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub scores: Scores,
    pub stimuli: Vec<StimulusEvent>,
    pub responses: Vec<ResponseEvent>,
    pub configuration: TestConfiguration,
    pub duration_ms: f64,
    pub end_reason: Option<EndReason>,
}

impl ResultSummary {
    /// The zeroed summary reported before a run has ended.
    pub fn empty(configuration: TestConfiguration) -> Self {
        Self {
            scores: Scores::empty(configuration.variant()),
            stimuli: Vec::new(),
            responses: Vec::new(),
            configuration,
            duration_ms: 0.0,
            end_reason: None,
        }
    }

    pub fn variant(&self) -> TestVariant {
        self.scores.variant()
    }

    pub fn cpt(&self) -> Option<&CptScores> {
        match &self.scores {
            Scores::Cpt(s) => Some(s),
            _ => None,
        }
    }

    pub fn tmt(&self) -> Option<&TmtScores> {
        match &self.scores {
            Scores::Tmt(s) => Some(s),
            _ => None,
        }
    }

    pub fn digit_span(&self) -> Option<&DigitSpanScores> {
        match &self.scores {
            Scores::DigitSpan(s) => Some(s),
            _ => None,
        }
    }
}
