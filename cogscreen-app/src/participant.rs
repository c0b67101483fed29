//! A scripted stand-in for a human participant, used by the offline host and
//! for demos of the real-time loop.

use cogscreen_core::{Response, Screen, TestConfiguration};
use cogscreen_timing::millis_to_nanos;
use rand::Rng;

const CPT_HIT_RATE: f64 = 0.9;
const CPT_FALSE_ALARM_RATE: f64 = 0.1;
const TMT_ERROR_RATE: f64 = 0.05;

/// A response the participant will give once the clock reaches `at_ns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Planned {
    pub at_ns: u64,
    pub response: Response,
}

pub struct SimulatedParticipant<R: Rng> {
    rng: R,
    targets: Vec<String>,
    backward: bool,
    seen: usize,
    answered: usize,
    memory: Vec<u8>,
    digit_showing: bool,
}

impl<R: Rng> SimulatedParticipant<R> {
    pub fn new(config: &TestConfiguration, rng: R) -> Self {
        Self {
            rng,
            targets: config.cpt().map(|c| c.targets.clone()).unwrap_or_default(),
            backward: config.digit_span().is_some_and(|c| c.backward),
            seen: 0,
            answered: 0,
            memory: Vec::new(),
            digit_showing: false,
        }
    }

    /// Looks at the current screen and returns whatever responses it decides
    /// to make, in time order. Call after every engine update.
    pub fn observe(&mut self, screen: &Screen, presented: usize, now_ns: u64) -> Vec<Planned> {
        let fresh = presented > self.seen;
        self.seen = presented;

        match screen {
            Screen::Stimulus { value } if fresh => self.cpt(value, now_ns),
            Screen::Trail {
                items, connected, ..
            } if fresh => self.trail(items.len(), *connected, now_ns),
            Screen::Digit { value } => {
                if fresh {
                    self.memory.clear();
                }
                if !self.digit_showing {
                    self.memory.push(*value);
                }
                self.digit_showing = true;
                Vec::new()
            }
            Screen::Recall { length } if presented > self.answered => {
                self.answered = presented;
                self.digit_showing = false;
                self.recall(*length, now_ns)
            }
            _ => {
                self.digit_showing = false;
                Vec::new()
            }
        }
    }

    fn cpt(&mut self, value: &str, now_ns: u64) -> Vec<Planned> {
        let is_target = self.targets.iter().any(|t| t == value);
        let (rate, rt) = if is_target {
            (CPT_HIT_RATE, self.rng.random_range(180..=320))
        } else {
            (CPT_FALSE_ALARM_RATE, self.rng.random_range(150..=260))
        };
        if self.rng.random::<f64>() >= rate {
            return Vec::new();
        }
        vec![Planned {
            at_ns: now_ns + millis_to_nanos(rt),
            response: Response::Press,
        }]
    }

    fn trail(&mut self, len: usize, connected: usize, now_ns: u64) -> Vec<Planned> {
        let mut at_ns = now_ns + millis_to_nanos(self.rng.random_range(400..=1_200));
        let mut plans = Vec::with_capacity(2);
        if connected + 1 < len && self.rng.random::<f64>() < TMT_ERROR_RATE {
            plans.push(Planned {
                at_ns,
                response: Response::Select(self.rng.random_range(connected + 1..len)),
            });
            at_ns += millis_to_nanos(self.rng.random_range(300..=900));
        }
        plans.push(Planned {
            at_ns,
            response: Response::Select(connected),
        });
        plans
    }

    fn recall(&mut self, length: usize, now_ns: u64) -> Vec<Planned> {
        let mut digits = std::mem::take(&mut self.memory);
        if self.backward {
            digits.reverse();
        }
        // Accuracy falls off past three digits.
        let accuracy = (0.95 - 0.1 * length.saturating_sub(3) as f64).clamp(0.05, 0.95);
        if !digits.is_empty() && self.rng.random::<f64>() >= accuracy {
            let slot = self.rng.random_range(0..digits.len());
            digits[slot] = (digits[slot] + self.rng.random_range(1..10)) % 10;
        }
        let typing_ms = 1_200 + 250 * length as u64;
        vec![Planned {
            at_ns: now_ns + millis_to_nanos(typing_ms),
            response: Response::Sequence(digits),
        }]
    }
}
