//! Shared scheduling context for the variant protocols.

use cogscreen_core::{ResponseEvent, StimulusEvent, TrailPart};
use cogscreen_timing::{millis_to_nanos, nanos_to_millis, TaskHandle, TaskQueue};
use tracing::trace;

/// Delay between `start()` and the first stimulus (and between TMT parts).
pub const LEAD_IN_MS: u64 = 1_000;
pub const COUNTDOWN_PERIOD_MS: u64 = 1_000;

/// Gap between a stimulus disappearing and the next onset, so onsets stay
/// `isi_ms` apart. A non-positive gap is clamped to zero.
pub fn presentation_gap_ms(stimulus_ms: u64, isi_ms: u64) -> u64 {
    let gap = isi_ms as i128 - stimulus_ms as i128;
    gap.max(0) as u64
}

/// Delayed work owned by a running engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cue {
    Countdown,
    StimulusOnset,
    StimulusOffset,
    PartStart(TrailPart),
    PartTimeout(TrailPart),
    TrialStart,
    DigitOnset,
    DigitOffset,
    RecallTimeout,
}

/// What a protocol wants after handling a cue or response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Finish,
}

/// Event logs, task queue and clock reading shared by every protocol. The
/// logs only grow while the engine is running.
pub(crate) struct RunContext<R> {
    pub rng: R,
    pub queue: TaskQueue<Cue>,
    pub start_ns: u64,
    /// Logical time of the cue being handled, or the read time of a response.
    pub now_ns: u64,
    pub stimuli: Vec<StimulusEvent>,
    pub responses: Vec<ResponseEvent>,
}

impl<R> RunContext<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            queue: TaskQueue::new(),
            start_ns: 0,
            now_ns: 0,
            stimuli: Vec::new(),
            responses: Vec::new(),
        }
    }

    /// Drops every pending task and clears both logs.
    pub fn reset(&mut self) {
        self.queue.cancel_all();
        self.stimuli.clear();
        self.responses.clear();
        self.start_ns = 0;
        self.now_ns = 0;
    }

    pub fn now_ms(&self) -> f64 {
        nanos_to_millis(self.now_ns.saturating_sub(self.start_ns))
    }

    pub fn schedule_in(&mut self, delay_ms: u64, cue: Cue) -> TaskHandle {
        let due = self.now_ns.saturating_add(millis_to_nanos(delay_ms));
        trace!("scheduling {:?} in {} ms", cue, delay_ms);
        self.queue.schedule(due, cue)
    }

    pub fn cancel(&mut self, handle: Option<TaskHandle>) {
        if let Some(handle) = handle {
            self.queue.cancel(handle);
        }
    }

    /// Logs a stimulus at the current time and returns its index.
    pub fn present(&mut self, value: impl Into<String>, is_target: bool) -> usize {
        let index = self.stimuli.len();
        let event = StimulusEvent {
            index,
            value: value.into(),
            is_target,
            presented_at_ms: self.now_ms(),
        };
        trace!(
            "stimulus #{} {:?} (target: {}) at {:.3} ms",
            index,
            event.value,
            is_target,
            event.presented_at_ms
        );
        self.stimuli.push(event);
        index
    }

    pub fn record(&mut self, event: ResponseEvent) {
        trace!(
            "response to #{} after {:.3} ms (correct: {})",
            event.stimulus_index,
            event.response_time_ms,
            event.correct
        );
        self.responses.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_keeps_onsets_isi_apart() {
        assert_eq!(presentation_gap_ms(250, 2_000), 1_750);
    }

    #[test]
    fn non_positive_gap_clamps_to_zero() {
        assert_eq!(presentation_gap_ms(250, 250), 0);
        assert_eq!(presentation_gap_ms(500, 200), 0);
        assert_eq!(presentation_gap_ms(u64::MAX, 0), 0);
    }

    #[test]
    fn present_stamps_relative_time() {
        let mut ctx = RunContext::new(());
        ctx.start_ns = 5_000_000_000;
        ctx.now_ns = 5_001_500_000;
        let index = ctx.present("X", true);
        assert_eq!(index, 0);
        assert_eq!(ctx.stimuli[0].presented_at_ms, 1.5);
        assert_eq!(ctx.present("A", false), 1);
    }

    #[test]
    fn schedule_in_is_relative_to_logical_now() {
        let mut ctx = RunContext::new(());
        ctx.now_ns = 2_000_000;
        ctx.schedule_in(3, Cue::StimulusOffset);
        assert_eq!(ctx.queue.next_due(), Some(5_000_000));
    }

    #[test]
    fn reset_clears_logs_and_tasks() {
        let mut ctx = RunContext::new(());
        ctx.present("X", true);
        ctx.schedule_in(10, Cue::Countdown);
        ctx.reset();
        assert!(ctx.stimuli.is_empty());
        assert!(ctx.queue.is_empty());
    }
}
