use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JitterStats {
    pub samples: usize,
    pub average_period_ns: f64,
    pub jitter_ns: f64,
    pub min_period_ns: f64,
    pub max_period_ns: f64,
    pub effective_hz: f64,
}

/// Rolling record of host poll-loop periods. The spread bounds how late a
/// due task can be observed.
#[derive(Debug, Clone)]
pub struct LoopJitter {
    periods: Vec<Duration>,
    max_samples: usize,
}

impl LoopJitter {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            periods: Vec::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    pub fn record(&mut self, period: Duration) {
        if self.periods.len() >= self.max_samples {
            self.periods.remove(0);
        }
        self.periods.push(period);
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn stats(&self) -> JitterStats {
        if self.periods.is_empty() {
            return JitterStats::default();
        }
        let times: Vec<f64> = self.periods.iter().map(|d| d.as_nanos() as f64).collect();
        let n = times.len() as f64;
        let avg = times.iter().sum::<f64>() / n;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        JitterStats {
            samples: times.len(),
            average_period_ns: avg,
            jitter_ns: var.sqrt(),
            min_period_ns: min,
            max_period_ns: max,
            effective_hz: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

impl Default for LoopJitter {
    fn default() -> Self {
        Self::new()
    }
}
