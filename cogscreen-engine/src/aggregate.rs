//! Result aggregation. Every function here is pure over the event logs so a
//! replayed log scores identically.

use cogscreen_core::{CptScores, DigitSpanScores, ResponseEvent, StimulusEvent, TmtScores};

use crate::capture::Outcome;

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation; zero below two samples.
pub fn population_sd(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let avg = mean(samples);
    let variance = samples
        .iter()
        .map(|x| {
            let diff = x - avg;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64;
    variance.sqrt()
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub fn rate(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Ratio of two durations; zero unless both are finite and the denominator positive.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if !numerator.is_finite() || !denominator.is_finite() || denominator <= 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Scores a CPT run from its logs. Only the first response per stimulus
/// counts; responses naming unknown stimuli are dropped.
pub fn cpt_scores(stimuli: &[StimulusEvent], responses: &[ResponseEvent]) -> CptScores {
    let mut answered = vec![false; stimuli.len()];
    let mut reaction_times = Vec::new();
    let mut commission_errors = 0;

    for response in responses {
        let Some(stimulus) = stimuli.get(response.stimulus_index) else {
            continue;
        };
        if std::mem::replace(&mut answered[response.stimulus_index], true) {
            continue;
        }
        match Outcome::classify(stimulus.is_target, true) {
            Outcome::CorrectDetection => reaction_times.push(response.response_time_ms),
            _ => commission_errors += 1,
        }
    }

    let total_targets = stimuli.iter().filter(|s| s.is_target).count();
    let total_non_targets = stimuli.len() - total_targets;
    let correct_detections = reaction_times.len();
    let omission_errors = total_targets - correct_detections;

    CptScores {
        total_stimuli: stimuli.len(),
        total_targets,
        total_non_targets,
        correct_detections,
        omission_errors,
        commission_errors,
        average_reaction_time: mean(&reaction_times),
        reaction_time_sd: population_sd(&reaction_times),
        detection_rate: rate(correct_detections, total_targets),
        omission_error_rate: rate(omission_errors, total_targets),
        commission_error_rate: rate(commission_errors, total_non_targets),
        reaction_times,
    }
}

/// Timing and errors of one TMT part.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartRecord {
    pub started: bool,
    pub completed: bool,
    pub completion_time_ms: f64,
    pub errors: u32,
}

pub fn tmt_scores(part_a: &PartRecord, part_b: &PartRecord) -> TmtScores {
    TmtScores {
        part_a_completion_time: part_a.completion_time_ms,
        part_b_completion_time: part_b.completion_time_ms,
        part_a_errors: part_a.errors,
        part_b_errors: part_b.errors,
        part_a_completed: part_a.completed,
        part_b_completed: part_b.completed,
        b_to_a_ratio: ratio(part_b.completion_time_ms, part_a.completion_time_ms),
    }
}

/// One resolved Digit Span trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanTrial {
    pub length: u32,
    pub correct: bool,
}

pub fn digit_span_scores(trials: &[SpanTrial]) -> DigitSpanScores {
    DigitSpanScores {
        highest_span_achieved: trials
            .iter()
            .filter(|t| t.correct)
            .map(|t| t.length)
            .max()
            .unwrap_or(0),
        correct_trials: trials.iter().filter(|t| t.correct).count() as u32,
        total_trials: trials.len() as u32,
    }
}
