use cogscreen_core::{CptConfig, CptScores, Response, Screen, TestConfiguration};
use rand::Rng;
use tracing::{trace, warn};

use crate::aggregate;
use crate::capture::{Outcome, ResponseWindow};
use crate::scheduler::{presentation_gap_ms, Cue, Flow, RunContext, LEAD_IN_MS};

/// Open-loop CPT cadence: onsets are `inter_stimulus_interval_ms` apart no
/// matter when, or whether, the participant responds.
pub(crate) struct CptProtocol {
    stimulus_ms: u64,
    gap_ms: u64,
    gap_clamped: bool,
    target_probability: f64,
    target: String,
    non_targets: Vec<String>,
    window: Option<ResponseWindow>,
    active_value: Option<String>,
}

impl CptProtocol {
    pub fn new(config: &TestConfiguration, cpt: &CptConfig) -> Self {
        Self {
            stimulus_ms: config.stimulus_duration_ms,
            gap_ms: presentation_gap_ms(
                config.stimulus_duration_ms,
                config.inter_stimulus_interval_ms,
            ),
            gap_clamped: config.inter_stimulus_interval_ms <= config.stimulus_duration_ms,
            target_probability: cpt.target_probability,
            target: cpt.targets.first().cloned().unwrap_or_default(),
            non_targets: cpt.non_targets.clone(),
            window: None,
            active_value: None,
        }
    }

    pub fn begin<R: Rng>(&mut self, ctx: &mut RunContext<R>) {
        if self.gap_clamped {
            warn!(
                "inter-stimulus interval does not exceed stimulus duration ({} ms); next onset follows immediately",
                self.stimulus_ms
            );
        }
        ctx.schedule_in(LEAD_IN_MS, Cue::StimulusOnset);
    }

    pub fn on_cue<R: Rng>(&mut self, cue: Cue, ctx: &mut RunContext<R>) -> Flow {
        match cue {
            Cue::StimulusOnset => self.present(ctx),
            Cue::StimulusOffset => self.expire(ctx),
            other => trace!("cpt ignores {:?}", other),
        }
        Flow::Continue
    }

    fn present<R: Rng>(&mut self, ctx: &mut RunContext<R>) {
        // Stale windows cannot survive here; the offset always precedes the next onset.
        self.window = None;

        let is_target = ctx.rng.random::<f64>() < self.target_probability;
        let value = if is_target || self.non_targets.is_empty() {
            self.target.clone()
        } else {
            let pick = ctx.rng.random_range(0..self.non_targets.len());
            self.non_targets[pick].clone()
        };

        let index = ctx.present(value.clone(), is_target);
        self.window = Some(ResponseWindow::open(index, is_target, ctx.now_ms()));
        self.active_value = Some(value);
        ctx.schedule_in(self.stimulus_ms, Cue::StimulusOffset);
    }

    fn expire<R: Rng>(&mut self, ctx: &mut RunContext<R>) {
        if let Some(window) = self.window.take() {
            if window.outcome() == Outcome::Omission {
                trace!("omission on stimulus #{}", window.stimulus_index);
            }
        }
        self.active_value = None;
        ctx.schedule_in(self.gap_ms, Cue::StimulusOnset);
    }

    pub fn on_response<R: Rng>(
        &mut self,
        response: Response,
        ctx: &mut RunContext<R>,
    ) -> Option<Flow> {
        if response != Response::Press {
            trace!("cpt ignores {:?}", response);
            return None;
        }
        let now_ms = ctx.now_ms();
        let event = self.window.as_mut()?.capture(now_ms)?;
        ctx.record(event);
        Some(Flow::Continue)
    }

    /// An unanswered target still open at the end is scored as an omission
    /// by the aggregator; nothing else to settle.
    pub fn close<R>(&mut self, _ctx: &mut RunContext<R>) {
        self.window = None;
        self.active_value = None;
    }

    pub fn scores<R>(&self, ctx: &RunContext<R>) -> CptScores {
        aggregate::cpt_scores(&ctx.stimuli, &ctx.responses)
    }

    pub fn screen(&self) -> Screen {
        match &self.active_value {
            Some(value) => Screen::Stimulus {
                value: value.clone(),
            },
            None => Screen::Fixation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogscreen_core::TestVariant;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn protocol(probability: f64) -> (CptProtocol, RunContext<StdRng>) {
        let mut config = TestVariant::Cpt.default_configuration();
        if let cogscreen_core::VariantConfig::Cpt(cpt) = &mut config.settings {
            cpt.target_probability = probability;
        }
        let cpt = config.cpt().unwrap().clone();
        (
            CptProtocol::new(&config, &cpt),
            RunContext::new(StdRng::seed_from_u64(7)),
        )
    }

    #[test]
    fn probability_one_always_presents_the_first_target() {
        let (mut p, mut ctx) = protocol(1.0);
        for _ in 0..20 {
            p.on_cue(Cue::StimulusOnset, &mut ctx);
            p.on_cue(Cue::StimulusOffset, &mut ctx);
        }
        assert!(ctx.stimuli.iter().all(|s| s.is_target && s.value == "X"));
    }

    #[test]
    fn probability_zero_never_presents_a_target() {
        let (mut p, mut ctx) = protocol(0.0);
        for _ in 0..20 {
            p.on_cue(Cue::StimulusOnset, &mut ctx);
            p.on_cue(Cue::StimulusOffset, &mut ctx);
        }
        let allowed = CptConfig::default().non_targets;
        assert!(ctx
            .stimuli
            .iter()
            .all(|s| !s.is_target && allowed.contains(&s.value)));
    }

    #[test]
    fn press_outside_window_is_ignored() {
        let (mut p, mut ctx) = protocol(1.0);
        assert_eq!(p.on_response(Response::Press, &mut ctx), None);
        p.on_cue(Cue::StimulusOnset, &mut ctx);
        p.on_cue(Cue::StimulusOffset, &mut ctx);
        assert_eq!(p.on_response(Response::Press, &mut ctx), None);
        assert!(ctx.responses.is_empty());
    }

    #[test]
    fn wrong_channel_is_ignored() {
        let (mut p, mut ctx) = protocol(1.0);
        p.on_cue(Cue::StimulusOnset, &mut ctx);
        assert_eq!(p.on_response(Response::Select(0), &mut ctx), None);
        assert_eq!(p.on_response(Response::Press, &mut ctx), Some(Flow::Continue));
    }

    #[test]
    fn screen_follows_the_window() {
        let (mut p, mut ctx) = protocol(1.0);
        assert_eq!(p.screen(), Screen::Fixation);
        p.on_cue(Cue::StimulusOnset, &mut ctx);
        assert_eq!(p.screen(), Screen::Stimulus { value: "X".into() });
        p.on_cue(Cue::StimulusOffset, &mut ctx);
        assert_eq!(p.screen(), Screen::Fixation);
    }
}
