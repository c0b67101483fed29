use cogscreen_core::{
    DigitSpanConfig, DigitSpanScores, Response, ResponseEvent, Screen, TestConfiguration,
};
use cogscreen_timing::TaskHandle;
use rand::Rng;
use tracing::{debug, trace};

use crate::aggregate::{self, SpanTrial};
use crate::scheduler::{presentation_gap_ms, Cue, Flow, RunContext, LEAD_IN_MS};

/// Random decimal digits with no digit repeated back to back.
pub fn digit_sequence<R: Rng>(length: usize, rng: &mut R) -> Vec<u8> {
    let mut digits: Vec<u8> = Vec::with_capacity(length);
    for _ in 0..length {
        let digit = match digits.last() {
            None => rng.random_range(0..10),
            Some(&prev) => {
                let pick = rng.random_range(0..9);
                if pick >= prev {
                    pick + 1
                } else {
                    pick
                }
            }
        };
        digits.push(digit);
    }
    digits
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Waiting,
    Playback { position: usize, showing: bool },
    Recall { opened_ms: f64, timeout: Option<TaskHandle> },
}

/// Playback of a digit sequence followed by a recall window.
pub(crate) struct DigitSpanProtocol {
    config: DigitSpanConfig,
    stimulus_ms: u64,
    gap_ms: u64,
    trial_gap_ms: u64,
    length: u32,
    trials_at_length: u32,
    correct_at_length: bool,
    sequence: Vec<u8>,
    stimulus_index: usize,
    stage: Stage,
    trials: Vec<SpanTrial>,
}

impl DigitSpanProtocol {
    pub fn new(config: &TestConfiguration, span: &DigitSpanConfig) -> Self {
        Self {
            config: span.clone(),
            stimulus_ms: config.stimulus_duration_ms,
            gap_ms: presentation_gap_ms(
                config.stimulus_duration_ms,
                config.inter_stimulus_interval_ms,
            ),
            trial_gap_ms: config.inter_stimulus_interval_ms,
            length: span.start_length,
            trials_at_length: 0,
            correct_at_length: false,
            sequence: Vec::new(),
            stimulus_index: 0,
            stage: Stage::Waiting,
            trials: Vec::new(),
        }
    }

    pub fn begin<R: Rng>(&mut self, ctx: &mut RunContext<R>) {
        ctx.schedule_in(LEAD_IN_MS, Cue::TrialStart);
    }

    pub fn on_cue<R: Rng>(&mut self, cue: Cue, ctx: &mut RunContext<R>) -> Flow {
        match (cue, self.stage) {
            (Cue::TrialStart, Stage::Waiting) => {
                self.start_trial(ctx);
                Flow::Continue
            }
            (Cue::DigitOnset, Stage::Playback { position, .. }) => {
                self.stage = Stage::Playback {
                    position,
                    showing: true,
                };
                ctx.schedule_in(self.stimulus_ms, Cue::DigitOffset);
                Flow::Continue
            }
            (Cue::DigitOffset, Stage::Playback { position, .. }) => {
                self.digit_hidden(position, ctx);
                Flow::Continue
            }
            (Cue::RecallTimeout, Stage::Recall { .. }) => {
                debug!("recall of length {} timed out", self.length);
                self.resolve(false, ctx)
            }
            (cue, stage) => {
                trace!("digit span ignores {:?} during {:?}", cue, stage);
                Flow::Continue
            }
        }
    }

    fn start_trial<R: Rng>(&mut self, ctx: &mut RunContext<R>) {
        self.sequence = digit_sequence(self.length as usize, &mut ctx.rng);
        let value: String = self.sequence.iter().map(|d| char::from(b'0' + d)).collect();
        self.stimulus_index = ctx.present(value, true);
        self.stage = Stage::Playback {
            position: 0,
            showing: true,
        };
        ctx.schedule_in(self.stimulus_ms, Cue::DigitOffset);
    }

    fn digit_hidden<R>(&mut self, position: usize, ctx: &mut RunContext<R>) {
        let position = position + 1;
        if position < self.sequence.len() {
            self.stage = Stage::Playback {
                position,
                showing: false,
            };
            ctx.schedule_in(self.gap_ms, Cue::DigitOnset);
            return;
        }

        let limit = self.config.recall_time_limit_ms;
        let timeout = (limit > 0).then(|| ctx.schedule_in(limit, Cue::RecallTimeout));
        self.stage = Stage::Recall {
            opened_ms: ctx.now_ms(),
            timeout,
        };
        trace!("recall window open for {} digits", self.sequence.len());
    }

    fn expected(&self) -> Vec<u8> {
        if self.config.backward {
            self.sequence.iter().rev().copied().collect()
        } else {
            self.sequence.clone()
        }
    }

    pub fn on_response<R: Rng>(
        &mut self,
        response: Response,
        ctx: &mut RunContext<R>,
    ) -> Option<Flow> {
        let Stage::Recall { opened_ms, timeout } = self.stage else {
            trace!("submission outside the recall window");
            return None;
        };
        let Response::Sequence(digits) = response else {
            trace!("digit span ignores {:?}", response);
            return None;
        };

        let correct = digits == self.expected();
        ctx.cancel(timeout);
        ctx.record(ResponseEvent {
            stimulus_index: self.stimulus_index,
            response_time_ms: (ctx.now_ms() - opened_ms).max(0.0),
            correct,
        });
        Some(self.resolve(correct, ctx))
    }

    /// Closes the current trial and applies the progression rule.
    fn resolve<R>(&mut self, correct: bool, ctx: &mut RunContext<R>) -> Flow {
        self.trials.push(SpanTrial {
            length: self.length,
            correct,
        });
        self.trials_at_length += 1;
        self.correct_at_length |= correct;
        self.stage = Stage::Waiting;
        debug!(
            "trial {} at length {} {}",
            self.trials_at_length,
            self.length,
            if correct { "correct" } else { "incorrect" }
        );

        if self.trials_at_length >= self.config.trials_per_length {
            if !self.correct_at_length || self.length >= self.config.max_length {
                return Flow::Finish;
            }
            self.length += 1;
            self.trials_at_length = 0;
            self.correct_at_length = false;
        }
        ctx.schedule_in(self.trial_gap_ms, Cue::TrialStart);
        Flow::Continue
    }

    /// Unresolved trials are not scored.
    pub fn close<R>(&mut self, _ctx: &mut RunContext<R>) {
        self.stage = Stage::Waiting;
    }

    pub fn scores(&self) -> DigitSpanScores {
        aggregate::digit_span_scores(&self.trials)
    }

    pub fn screen(&self) -> Screen {
        match self.stage {
            Stage::Playback {
                position,
                showing: true,
            } => match self.sequence.get(position) {
                Some(&value) => Screen::Digit { value },
                None => Screen::Fixation,
            },
            Stage::Recall { .. } => Screen::Recall {
                length: self.sequence.len(),
            },
            _ => Screen::Fixation,
        }
    }
}
