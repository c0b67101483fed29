use std::collections::VecDeque;
use std::time::Duration;

use cogscreen_core::{ResultSummary, TestConfiguration};
use cogscreen_engine::TestEngine;
use cogscreen_timing::{HighPrecisionTimer, JitterStats, LoopJitter, ManualTimer, Timer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::participant::{Planned, SimulatedParticipant};

/// Upper bound on a real-time sleep, so input is polled at about 1 kHz.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: ResultSummary,
    /// Poll loop timing; only measured in real time.
    pub jitter: Option<JitterStats>,
}

/// An engine paired with a simulated participant and its queued responses.
struct Session<T: Timer> {
    engine: TestEngine<T, StdRng>,
    participant: SimulatedParticipant<StdRng>,
    pending: VecDeque<Planned>,
}

impl<T: Timer> Session<T> {
    fn new(timer: T, config: TestConfiguration, seed: u64) -> Self {
        let participant =
            SimulatedParticipant::new(&config, StdRng::seed_from_u64(seed.wrapping_add(1)));
        Self {
            engine: TestEngine::with_configuration(config, timer, StdRng::seed_from_u64(seed)),
            participant,
            pending: VecDeque::new(),
        }
    }

    fn observe(&mut self, now_ns: u64) {
        let plans = self.participant.observe(
            &self.engine.screen(),
            self.engine.stimuli_presented(),
            now_ns,
        );
        self.pending.extend(plans);
    }

    /// Runs due engine tasks, then delivers every response that is due.
    fn poll(&mut self, now_ns: u64) {
        self.engine.update();
        self.observe(now_ns);
        while self.pending.front().is_some_and(|p| p.at_ns <= now_ns) {
            let Some(planned) = self.pending.pop_front() else {
                break;
            };
            let captured = self.engine.respond(planned.response);
            debug!("response at {} ns captured: {}", planned.at_ns, captured);
            self.observe(now_ns);
        }
    }

    fn next_wake(&self) -> Option<u64> {
        let due = self.engine.next_due()?;
        Some(match self.pending.front() {
            Some(planned) => due.min(planned.at_ns),
            None => due,
        })
    }

    fn finish(mut self) -> ResultSummary {
        self.engine.force_complete();
        self.engine.get_results()
    }
}

/// Runs a whole test on a virtual clock, jumping from one due task or planned
/// response to the next. Deterministic for a given seed.
pub fn run_offline(config: TestConfiguration, seed: u64) -> RunReport {
    let timer = ManualTimer::new();
    let mut session = Session::new(timer.clone(), config, seed);
    session.engine.start();
    session.observe(timer.now());

    while session.engine.is_running() {
        let Some(wake) = session.next_wake() else {
            break;
        };
        timer.set(wake);
        session.poll(wake);
    }
    info!("offline run finished at {:.1} ms virtual time", timer.now_ms());

    RunReport {
        summary: session.finish(),
        jitter: None,
    }
}

/// Runs a whole test against the wall clock, polling about once a millisecond.
pub fn run_realtime(config: TestConfiguration, seed: u64) -> RunReport {
    let timer = HighPrecisionTimer::new();
    let mut jitter = LoopJitter::new();
    let mut session = Session::new(timer.clone(), config, seed);
    session.engine.start();

    let mut last = timer.now();
    while session.engine.is_running() {
        let now = timer.now();
        jitter.record(Duration::from_nanos(now.saturating_sub(last)));
        last = now;
        session.poll(now);

        let wait = session
            .next_wake()
            .map(|wake| Duration::from_nanos(wake.saturating_sub(timer.now())))
            .unwrap_or(POLL_INTERVAL)
            .min(POLL_INTERVAL);
        if !wait.is_zero() {
            timer.sleep(wait);
        }
    }

    let stats = jitter.stats();
    info!(
        "poll loop: {:.1} Hz, jitter {:.3} ms",
        stats.effective_hz,
        stats.jitter_ns / 1_000_000.0
    );
    RunReport {
        summary: session.finish(),
        jitter: Some(stats),
    }
}
