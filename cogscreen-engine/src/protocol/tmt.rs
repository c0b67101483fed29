use cogscreen_core::{Response, ResponseEvent, Screen, TmtConfig, TmtScores, TrailItem, TrailPart};
use cogscreen_timing::TaskHandle;
use rand::Rng;
use tracing::{debug, trace};

use crate::aggregate::{self, PartRecord};
use crate::scheduler::{Cue, Flow, RunContext, LEAD_IN_MS};

const EDGE_MARGIN: f64 = 0.05;
const PLACEMENT_ATTEMPTS: usize = 200;

/// Part B pairs each number with a letter, so the alphabet bounds its length.
pub const MAX_PART_B_ITEMS: u32 = 52;

/// Item labels in connection order: `1..=n` for part A, `1, A, 2, B, …` for part B.
pub fn trail_labels(part: TrailPart, count: u32) -> Vec<String> {
    (0..count as usize)
        .map(|i| match part {
            TrailPart::A => (i + 1).to_string(),
            TrailPart::B if i % 2 == 0 => (i / 2 + 1).to_string(),
            TrailPart::B => char::from(b'A' + (i / 2 % 26) as u8).to_string(),
        })
        .collect()
}

/// Scatters labelled items over the unit square keeping `min_distance`
/// between centres where the attempt budget allows.
pub fn layout_trail<R: Rng>(labels: Vec<String>, min_distance: f64, rng: &mut R) -> Vec<TrailItem> {
    let mut items: Vec<TrailItem> = Vec::with_capacity(labels.len());
    for label in labels {
        let mut candidate = (0.5, 0.5);
        for attempt in 0..PLACEMENT_ATTEMPTS {
            candidate = (
                rng.random_range(EDGE_MARGIN..=1.0 - EDGE_MARGIN),
                rng.random_range(EDGE_MARGIN..=1.0 - EDGE_MARGIN),
            );
            let clear = items.iter().all(|placed| {
                let dx = placed.x - candidate.0;
                let dy = placed.y - candidate.1;
                (dx * dx + dy * dy).sqrt() >= min_distance
            });
            if clear {
                break;
            }
            if attempt + 1 == PLACEMENT_ATTEMPTS {
                debug!("no clear spot for trail item {}, placing anyway", label);
            }
        }
        items.push(TrailItem {
            label,
            x: candidate.0,
            y: candidate.1,
        });
    }
    items
}

struct ActivePart {
    part: TrailPart,
    items: Vec<TrailItem>,
    next: usize,
    started_ms: f64,
    window_stimulus: usize,
    window_opened_ms: f64,
    timeout: Option<TaskHandle>,
}

/// Click-driven trail: the next expected item is the open stimulus window.
pub(crate) struct TmtProtocol {
    config: TmtConfig,
    active: Option<ActivePart>,
    records: [PartRecord; 2],
}

impl TmtProtocol {
    pub fn new(config: &TmtConfig) -> Self {
        Self {
            config: config.clone(),
            active: None,
            records: [PartRecord::default(); 2],
        }
    }

    pub fn begin<R: Rng>(&mut self, ctx: &mut RunContext<R>) {
        ctx.schedule_in(LEAD_IN_MS, Cue::PartStart(TrailPart::A));
    }

    pub fn on_cue<R: Rng>(&mut self, cue: Cue, ctx: &mut RunContext<R>) -> Flow {
        match cue {
            Cue::PartStart(part) => self.start_part(part, ctx),
            Cue::PartTimeout(part) if self.active.as_ref().map(|a| a.part) == Some(part) => {
                debug!("part {:?} timed out", part);
                self.finish_part(false, ctx)
            }
            other => {
                trace!("tmt ignores {:?}", other);
                Flow::Continue
            }
        }
    }

    fn start_part<R: Rng>(&mut self, part: TrailPart, ctx: &mut RunContext<R>) -> Flow {
        let (count, limit_ms) = match part {
            TrailPart::A => (self.config.part_a_items, self.config.part_a_time_limit_ms),
            TrailPart::B => (self.config.part_b_items, self.config.part_b_time_limit_ms),
        };
        let items = layout_trail(
            trail_labels(part, count),
            self.config.min_distance,
            &mut ctx.rng,
        );
        let now_ms = ctx.now_ms();
        self.records[part.index()].started = true;
        let Some(first) = items.first().map(|item| item.label.clone()) else {
            self.active = Some(ActivePart {
                part,
                items,
                next: 0,
                started_ms: now_ms,
                window_stimulus: 0,
                window_opened_ms: now_ms,
                timeout: None,
            });
            return self.finish_part(true, ctx);
        };
        let timeout = (limit_ms > 0).then(|| ctx.schedule_in(limit_ms, Cue::PartTimeout(part)));
        let window_stimulus = ctx.present(first, true);

        debug!("part {:?} started with {} items", part, items.len());
        self.active = Some(ActivePart {
            part,
            items,
            next: 0,
            started_ms: now_ms,
            window_stimulus,
            window_opened_ms: now_ms,
            timeout,
        });
        Flow::Continue
    }

    fn finish_part<R>(&mut self, completed: bool, ctx: &mut RunContext<R>) -> Flow {
        let Some(active) = self.active.take() else {
            return Flow::Continue;
        };
        ctx.cancel(active.timeout);
        let record = &mut self.records[active.part.index()];
        record.completed = completed;
        record.completion_time_ms = ctx.now_ms() - active.started_ms;
        debug!(
            "part {:?} {} after {:.1} ms with {} error(s)",
            active.part,
            if completed { "completed" } else { "abandoned" },
            record.completion_time_ms,
            record.errors
        );

        match active.part {
            TrailPart::A => {
                ctx.schedule_in(LEAD_IN_MS, Cue::PartStart(TrailPart::B));
                Flow::Continue
            }
            TrailPart::B => Flow::Finish,
        }
    }

    pub fn on_response<R: Rng>(
        &mut self,
        response: Response,
        ctx: &mut RunContext<R>,
    ) -> Option<Flow> {
        let Response::Select(item) = response else {
            trace!("tmt ignores {:?}", response);
            return None;
        };
        let active = self.active.as_mut()?;
        if item >= active.items.len() || item < active.next {
            return None;
        }

        if item > active.next {
            self.records[active.part.index()].errors += 1;
            trace!(
                "selected {} while expecting {}",
                active.items[item].label,
                active.items[active.next].label
            );
            return Some(Flow::Continue);
        }

        let now_ms = ctx.now_ms();
        ctx.record(ResponseEvent {
            stimulus_index: active.window_stimulus,
            response_time_ms: now_ms - active.window_opened_ms,
            correct: true,
        });
        active.next += 1;
        if active.next == active.items.len() {
            return Some(self.finish_part(true, ctx));
        }
        active.window_stimulus = ctx.present(active.items[active.next].label.clone(), true);
        active.window_opened_ms = now_ms;
        Some(Flow::Continue)
    }

    /// Records the elapsed time of a part interrupted by the end of the run.
    pub fn close<R>(&mut self, ctx: &mut RunContext<R>) {
        if let Some(active) = self.active.take() {
            let record = &mut self.records[active.part.index()];
            record.completed = false;
            record.completion_time_ms = ctx.now_ms() - active.started_ms;
        }
    }

    pub fn scores(&self) -> TmtScores {
        aggregate::tmt_scores(&self.records[0], &self.records[1])
    }

    pub fn screen(&self) -> Screen {
        match &self.active {
            Some(active) => Screen::Trail {
                part: active.part,
                items: active.items.clone(),
                connected: active.next,
            },
            None => Screen::Fixation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn part_b_alternates_numbers_and_letters() {
        assert_eq!(trail_labels(TrailPart::A, 4), vec!["1", "2", "3", "4"]);
        assert_eq!(
            trail_labels(TrailPart::B, 6),
            vec!["1", "A", "2", "B", "3", "C"]
        );
        assert!(trail_labels(TrailPart::A, 0).is_empty());
    }

    #[test]
    fn longest_part_b_has_distinct_labels() {
        let labels = trail_labels(TrailPart::B, MAX_PART_B_ITEMS);
        assert_eq!(labels.last().map(String::as_str), Some("Z"));
        let mut unique = labels.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), labels.len());
    }

    #[test]
    fn layout_respects_minimum_distance() {
        let mut rng = StdRng::seed_from_u64(11);
        let items = layout_trail(trail_labels(TrailPart::A, 25), 0.12, &mut rng);
        assert_eq!(items.len(), 25);
        for (i, a) in items.iter().enumerate() {
            assert!((EDGE_MARGIN..=1.0 - EDGE_MARGIN).contains(&a.x));
            assert!((EDGE_MARGIN..=1.0 - EDGE_MARGIN).contains(&a.y));
            for b in &items[i + 1..] {
                let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
                assert!(d >= 0.12, "{} and {} are {} apart", a.label, b.label, d);
            }
        }
    }

    #[test]
    fn layout_is_deterministic_for_a_seed() {
        let a = layout_trail(trail_labels(TrailPart::B, 10), 0.1, &mut StdRng::seed_from_u64(3));
        let b = layout_trail(trail_labels(TrailPart::B, 10), 0.1, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn impossible_spacing_still_places_every_item() {
        let mut rng = StdRng::seed_from_u64(5);
        let items = layout_trail(trail_labels(TrailPart::A, 30), 0.5, &mut rng);
        assert_eq!(items.len(), 30);
    }

    #[test]
    fn errors_and_repeats() {
        let config = TmtConfig {
            part_a_items: 3,
            ..TmtConfig::default()
        };
        let mut p = TmtProtocol::new(&config);
        let mut ctx = RunContext::new(StdRng::seed_from_u64(1));

        assert_eq!(p.on_response(Response::Select(0), &mut ctx), None);
        p.on_cue(Cue::PartStart(TrailPart::A), &mut ctx);

        assert_eq!(p.on_response(Response::Select(2), &mut ctx), Some(Flow::Continue));
        assert_eq!(p.on_response(Response::Select(0), &mut ctx), Some(Flow::Continue));
        assert_eq!(p.on_response(Response::Select(0), &mut ctx), None);
        assert_eq!(p.on_response(Response::Select(9), &mut ctx), None);
        assert_eq!(p.records[0].errors, 1);
        assert_eq!(ctx.responses.len(), 1);
        assert_eq!(ctx.stimuli.len(), 2);
    }
}
