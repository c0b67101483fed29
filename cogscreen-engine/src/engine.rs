use cogscreen_core::{
    EndReason, Response, ResultSummary, RunState, Screen, TestConfiguration,
};
use cogscreen_timing::{nanos_to_millis, Timer, NANOS_PER_MILLI};
use rand::Rng;
use tracing::{debug, info, trace, warn};

use crate::protocol::Protocol;
use crate::scheduler::{Cue, Flow, RunContext, COUNTDOWN_PERIOD_MS};
use crate::settings::sanitize;

type StartCallback = Box<dyn FnMut()>;
type EndCallback = Box<dyn FnMut(&ResultSummary)>;

/// Drives one test run through `Idle → Intro → Running → Ended`.
///
/// The engine owns no thread. The host calls [`update`](Self::update) from its
/// loop (or steps a virtual clock to [`next_due`](Self::next_due)) and every
/// pending task runs against its logical due time.
pub struct TestEngine<T: Timer, R: Rng> {
    timer: T,
    state: RunState,
    config: TestConfiguration,
    ctx: RunContext<R>,
    protocol: Protocol,
    remaining_ms: u64,
    summary: Option<ResultSummary>,
    on_start: Option<StartCallback>,
    on_end: Option<EndCallback>,
}

impl<T: Timer, R: Rng> TestEngine<T, R> {
    /// An idle engine holding the default CPT configuration.
    pub fn new(timer: T, rng: R) -> Self {
        let config = TestConfiguration::default();
        Self {
            timer,
            state: RunState::Idle,
            protocol: Protocol::for_configuration(&config),
            remaining_ms: config.test_duration_ms,
            config,
            ctx: RunContext::new(rng),
            summary: None,
            on_start: None,
            on_end: None,
        }
    }

    /// Shorthand for `new` followed by `initialize`.
    pub fn with_configuration(config: TestConfiguration, timer: T, rng: R) -> Self {
        let mut engine = Self::new(timer, rng);
        engine.initialize(config);
        engine
    }

    /// Prepares a fresh run and shows the intro. Any run in progress is
    /// discarded without firing the end callback.
    pub fn initialize(&mut self, config: TestConfiguration) {
        if self.state.is_running() {
            warn!(
                "re-initialized while running; discarding {} stimuli",
                self.ctx.stimuli.len()
            );
        }
        let config = sanitize(config);
        self.ctx.reset();
        self.protocol = Protocol::for_configuration(&config);
        self.remaining_ms = config.test_duration_ms;
        self.summary = None;
        self.state = RunState::Intro;
        debug!("initialized {}", config.variant().name());
        self.config = config;
    }

    /// Begins the run. Returns `false` unless the engine was showing the intro.
    pub fn start(&mut self) -> bool {
        if !self.state.is_intro() {
            trace!("start ignored in {:?}", self.state);
            return false;
        }
        let now = self.timer.now();
        self.ctx.start_ns = now;
        self.ctx.now_ns = now;
        self.state = RunState::Running;
        self.remaining_ms = self.config.test_duration_ms;

        self.ctx.schedule_in(
            COUNTDOWN_PERIOD_MS.min(self.remaining_ms),
            Cue::Countdown,
        );
        self.protocol.begin(&mut self.ctx);
        info!(
            "{} started ({} ms)",
            self.config.variant().name(),
            self.config.test_duration_ms
        );

        if let Some(callback) = self.on_start.as_mut() {
            callback();
        }
        true
    }

    /// Runs every task that is due by the timer's current reading.
    pub fn update(&mut self) {
        let now = self.timer.now();
        self.advance_to(now);
    }

    fn advance_to(&mut self, now: u64) {
        while self.state.is_running() {
            let Some((due, cue)) = self.ctx.queue.pop_due(now) else {
                break;
            };
            self.dispatch(cue, due);
        }
    }

    fn dispatch(&mut self, cue: Cue, due: u64) {
        if !self.state.is_running() {
            trace!("stale {:?} after the run ended", cue);
            return;
        }
        self.ctx.now_ns = due;
        if cue == Cue::Countdown {
            self.tick();
            return;
        }
        if self.protocol.on_cue(cue, &mut self.ctx) == Flow::Finish {
            self.finish(EndReason::Finished, due);
        }
    }

    fn tick(&mut self) {
        let elapsed_ms = self.ctx.now_ns.saturating_sub(self.ctx.start_ns) / NANOS_PER_MILLI;
        self.remaining_ms = self.config.test_duration_ms.saturating_sub(elapsed_ms);
        if self.remaining_ms == 0 {
            debug!("time expired");
            self.finish(EndReason::TimeExpired, self.ctx.now_ns);
            return;
        }
        self.ctx.schedule_in(
            COUNTDOWN_PERIOD_MS.min(self.remaining_ms),
            Cue::Countdown,
        );
    }

    /// Delivers input from the host's trigger channel. Due tasks run first,
    /// so a response after a window's hide time is out of window even if the
    /// host had not polled. Returns whether the response was captured.
    pub fn respond(&mut self, response: Response) -> bool {
        if !self.state.allows_input() {
            trace!("{:?} ignored in {:?}", response, self.state);
            return false;
        }
        let now = self.timer.now();
        self.advance_to(now);
        if !self.state.is_running() {
            return false;
        }

        self.ctx.now_ns = now;
        match self.protocol.on_response(response, &mut self.ctx) {
            Some(Flow::Finish) => {
                self.finish(EndReason::Finished, now);
                true
            }
            Some(Flow::Continue) => true,
            None => {
                trace!("response outside any window");
                false
            }
        }
    }

    /// Ends a running test early. Returns `false` when nothing was running,
    /// including when a due task ended the run first.
    pub fn force_complete(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        let now = self.timer.now();
        self.advance_to(now);
        if !self.state.is_running() {
            return false;
        }
        self.finish(EndReason::Cancelled, now);
        true
    }

    fn finish(&mut self, reason: EndReason, at_ns: u64) {
        self.state = RunState::Ended;
        self.ctx.now_ns = at_ns;
        let dropped = self.ctx.queue.cancel_all();
        trace!("dropped {} pending task(s)", dropped);
        self.protocol.close(&mut self.ctx);

        let summary = ResultSummary {
            scores: self.protocol.scores(&self.ctx),
            stimuli: self.ctx.stimuli.clone(),
            responses: self.ctx.responses.clone(),
            configuration: self.config.clone(),
            duration_ms: nanos_to_millis(at_ns.saturating_sub(self.ctx.start_ns)),
            end_reason: Some(reason),
        };
        info!(
            "{} ended ({:?}) after {:.1} ms: {} stimuli, {} responses",
            self.config.variant().name(),
            reason,
            summary.duration_ms,
            summary.stimuli.len(),
            summary.responses.len()
        );

        if let Some(callback) = self.on_end.as_mut() {
            callback(&summary);
        }
        self.summary = Some(summary);
    }

    /// Replaces the start callback.
    pub fn on_test_start(&mut self, callback: impl FnMut() + 'static) {
        self.on_start = Some(Box::new(callback));
    }

    /// Replaces the end callback. It receives the summary once per run.
    pub fn on_test_end(&mut self, callback: impl FnMut(&ResultSummary) + 'static) {
        self.on_end = Some(Box::new(callback));
    }

    /// Snapshot of the results; zeroed until the run has ended.
    pub fn get_results(&self) -> ResultSummary {
        match &self.summary {
            Some(summary) => summary.clone(),
            None => ResultSummary::empty(self.config.clone()),
        }
    }

    pub fn screen(&self) -> Screen {
        match self.state {
            RunState::Idle => Screen::Idle,
            RunState::Intro => Screen::Intro {
                variant: self.config.variant(),
            },
            RunState::Running => self.protocol.screen(),
            RunState::Ended => Screen::Ended,
        }
    }

    /// Earliest pending due time on the timer's clock, in nanoseconds.
    pub fn next_due(&self) -> Option<u64> {
        if !self.state.is_running() {
            return None;
        }
        self.ctx.queue.next_due()
    }

    /// Stimuli logged so far in the current run.
    pub fn stimuli_presented(&self) -> usize {
        self.ctx.stimuli.len()
    }

    /// Countdown value as of the last 1 Hz tick.
    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_ended()
    }

    pub fn configuration(&self) -> &TestConfiguration {
        &self.config
    }
}

impl<T: Timer, R: Rng> Drop for TestEngine<T, R> {
    fn drop(&mut self) {
        if self.force_complete() {
            debug!("engine dropped while running");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogscreen_core::TestVariant;
    use cogscreen_timing::ManualTimer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine(config: TestConfiguration) -> (TestEngine<ManualTimer, StdRng>, ManualTimer) {
        let timer = ManualTimer::new();
        let engine = TestEngine::with_configuration(config, timer.clone(), StdRng::seed_from_u64(1));
        (engine, timer)
    }

    #[test]
    fn new_engine_is_idle() {
        let engine = TestEngine::new(ManualTimer::new(), StdRng::seed_from_u64(1));
        assert_eq!(engine.state(), RunState::Idle);
        assert_eq!(engine.screen(), Screen::Idle);
        assert_eq!(engine.next_due(), None);
    }

    #[test]
    fn start_only_from_intro() {
        let (mut engine, _timer) = engine(TestConfiguration::default());
        assert_eq!(
            engine.screen(),
            Screen::Intro {
                variant: TestVariant::Cpt
            }
        );
        assert!(engine.start());
        assert!(!engine.start());
        assert!(engine.force_complete());
        assert!(!engine.start());
    }

    #[test]
    fn first_stimulus_follows_the_lead_in() {
        let (mut engine, timer) = engine(TestConfiguration::default());
        engine.start();
        assert_eq!(engine.screen(), Screen::Fixation);
        assert_eq!(engine.next_due(), Some(1_000_000_000));
        timer.advance_ms(1_000);
        engine.update();
        assert!(engine.screen().is_stimulus());
    }

    #[test]
    fn stale_cue_after_end_is_a_no_op() {
        let (mut engine, timer) = engine(TestConfiguration::default());
        engine.start();
        timer.advance_ms(1_000);
        engine.update();
        engine.force_complete();
        let before = engine.get_results();

        engine.dispatch(Cue::StimulusOnset, timer.now());
        engine.dispatch(Cue::Countdown, timer.now());
        assert_eq!(engine.ctx.stimuli.len(), before.stimuli.len());
        assert_eq!(engine.get_results(), before);
        assert_eq!(engine.next_due(), None);
    }

    #[test]
    fn countdown_ticks_once_per_second() {
        let (mut engine, timer) = engine(TestConfiguration::default());
        engine.start();
        assert_eq!(engine.remaining_ms(), 300_000);
        timer.advance_ms(2_500);
        engine.update();
        assert_eq!(engine.remaining_ms(), 298_000);
    }

    #[test]
    fn zero_duration_expires_on_first_update() {
        let mut config = TestConfiguration::default();
        config.test_duration_ms = 0;
        let (mut engine, _timer) = engine(config);
        engine.start();
        engine.update();
        assert!(engine.is_complete());
        assert_eq!(engine.get_results().end_reason, Some(EndReason::TimeExpired));
        assert!(engine.get_results().stimuli.is_empty());
    }

    #[test]
    fn initialize_clears_a_finished_run() {
        let (mut engine, timer) = engine(TestConfiguration::default());
        engine.start();
        timer.advance_ms(1_100);
        engine.update();
        engine.force_complete();
        assert_eq!(engine.get_results().stimuli.len(), 1);

        engine.initialize(TestVariant::Tmt.default_configuration());
        assert_eq!(engine.state(), RunState::Intro);
        let results = engine.get_results();
        assert!(results.stimuli.is_empty());
        assert_eq!(results.end_reason, None);
        assert_eq!(results.variant(), TestVariant::Tmt);
    }

    #[test]
    fn reinitializing_a_running_test_discards_it() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut config = TestConfiguration::default();
        config.test_duration_ms = 3_000;
        let (mut engine, timer) = engine(config.clone());
        let ended = Rc::new(Cell::new(0));
        let counter = Rc::clone(&ended);
        engine.on_test_end(move |_| counter.set(counter.get() + 1));

        engine.start();
        timer.advance_ms(1_100);
        engine.update();
        assert_eq!(engine.stimuli_presented(), 1);

        engine.initialize(config);
        assert_eq!(engine.state(), RunState::Intro);
        assert_eq!(engine.next_due(), None);
        assert!(engine.ctx.stimuli.is_empty());
        assert!(engine.ctx.responses.is_empty());
        assert_eq!(ended.get(), 0);

        let first_due = timer.now() + crate::scheduler::LEAD_IN_MS * NANOS_PER_MILLI;
        engine.start();
        while let Some(due) = engine.next_due() {
            assert!(due >= first_due);
            timer.set(due);
            engine.update();
        }
        assert_eq!(ended.get(), 1);
        let results = engine.get_results();
        assert_eq!(results.end_reason, Some(EndReason::TimeExpired));
        assert_eq!(results.stimuli[0].presented_at_ms, 1_000.0);
        assert_eq!(results.stimuli[0].index, 0);
    }

    #[test]
    fn initialize_sanitizes_hand_built_configurations() {
        let mut config = TestConfiguration::default();
        if let cogscreen_core::VariantConfig::Cpt(cpt) = &mut config.settings {
            cpt.targets.clear();
            cpt.target_probability = 4.0;
        }
        let (engine, _timer) = engine(config);
        let cpt = engine.configuration().cpt().unwrap();
        assert_eq!(cpt.targets, vec!["X"]);
        assert_eq!(cpt.target_probability, 1.0);
    }
}
