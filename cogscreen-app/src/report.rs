use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cogscreen_core::{ResultSummary, Scores};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not serialize results: {0}")]
    Json(#[from] serde_json::Error),
}

/// Human-readable summary for the terminal.
pub fn render(summary: &ResultSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", summary.variant().name());
    let _ = writeln!(
        out,
        "Duration: {:.1} s ({})",
        summary.duration_ms / 1_000.0,
        match summary.end_reason {
            Some(reason) => format!("{reason:?}"),
            None => "not ended".to_string(),
        }
    );
    let _ = writeln!(
        out,
        "Stimuli: {}, responses: {}",
        summary.stimuli.len(),
        summary.responses.len()
    );

    match &summary.scores {
        Scores::Cpt(s) => {
            let _ = writeln!(
                out,
                "Targets: {} detected / {} presented, {} omissions",
                s.correct_detections, s.total_targets, s.omission_errors
            );
            let _ = writeln!(
                out,
                "Commission errors: {} of {} non-targets",
                s.commission_errors, s.total_non_targets
            );
            let _ = writeln!(
                out,
                "Reaction time: {:.1} ms (sd {:.1})",
                s.average_reaction_time, s.reaction_time_sd
            );
            let _ = writeln!(
                out,
                "Rates: detection {:.1}%, omission {:.1}%, commission {:.1}%",
                s.detection_rate * 100.0,
                s.omission_error_rate * 100.0,
                s.commission_error_rate * 100.0
            );
        }
        Scores::Tmt(s) => {
            let _ = writeln!(
                out,
                "Part A: {:.1} s, {} errors{}",
                s.part_a_completion_time / 1_000.0,
                s.part_a_errors,
                if s.part_a_completed { "" } else { " (incomplete)" }
            );
            let _ = writeln!(
                out,
                "Part B: {:.1} s, {} errors{}",
                s.part_b_completion_time / 1_000.0,
                s.part_b_errors,
                if s.part_b_completed { "" } else { " (incomplete)" }
            );
            let _ = writeln!(out, "B/A ratio: {:.2}", s.b_to_a_ratio);
        }
        Scores::DigitSpan(s) => {
            let _ = writeln!(out, "Highest span: {}", s.highest_span_achieved);
            let _ = writeln!(out, "Correct trials: {} of {}", s.correct_trials, s.total_trials);
        }
    }
    out
}

pub fn write_json(path: &Path, summary: &ResultSummary) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogscreen_core::{CptScores, TestConfiguration, TestVariant};

    #[test]
    fn renders_cpt_rates_as_percentages() {
        let mut summary = ResultSummary::empty(TestConfiguration::default());
        summary.scores = Scores::Cpt(CptScores {
            total_targets: 4,
            correct_detections: 3,
            omission_errors: 1,
            detection_rate: 0.75,
            omission_error_rate: 0.25,
            ..CptScores::default()
        });
        let text = render(&summary);
        assert!(text.contains("Continuous Performance Test"));
        assert!(text.contains("3 detected / 4 presented"));
        assert!(text.contains("detection 75.0%"));
        assert!(text.contains("not ended"));
    }

    #[test]
    fn renders_each_variant() {
        for variant in [TestVariant::Tmt, TestVariant::DigitSpan] {
            let summary = ResultSummary::empty(variant.default_configuration());
            assert!(render(&summary).contains(variant.name()));
        }
    }
}
