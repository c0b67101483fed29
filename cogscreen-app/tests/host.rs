use std::fs;

use cogscreen_app::{run_offline, write_json, AppConfig, ConfigError};
use cogscreen_core::{EndReason, ResultSummary, TestVariant};
use tempfile::tempdir;

#[test]
fn loads_a_config_file_and_runs_it() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cogscreen.toml");
    fs::write(
        &path,
        r#"
        [run]
        variant = "tmt"
        seed = 3

        [[overrides]]
        label = "part_a_items"
        value = 6

        [[overrides]]
        label = "Part B Items"
        value = "6"
        "#,
    )
    .unwrap();

    let app = AppConfig::load_from(&path).unwrap();
    assert_eq!(app.run.variant, TestVariant::Tmt);
    let config = app.test_configuration();
    assert_eq!(config.tmt().unwrap().part_a_items, 6);

    let report = run_offline(config, app.run.seed.unwrap());
    let summary = report.summary;
    assert_eq!(summary.end_reason, Some(EndReason::Finished));
    let scores = summary.tmt().unwrap();
    assert!(scores.part_a_completed && scores.part_b_completed);
    assert_eq!(summary.stimuli.len(), 12);
    assert!(scores.b_to_a_ratio > 0.0);
}

#[test]
fn missing_file_reports_its_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = AppConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn digit_span_runs_to_a_discontinue() {
    let config = TestVariant::DigitSpan.default_configuration();
    let summary = run_offline(config, 21).summary;
    assert_eq!(summary.end_reason, Some(EndReason::Finished));
    let scores = summary.digit_span().unwrap();
    assert!(scores.total_trials >= 2);
    assert!(scores.correct_trials <= scores.total_trials);
    assert_eq!(summary.responses.len() as u32, scores.total_trials);
}

#[test]
fn summary_json_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.json");
    let mut config = TestVariant::Cpt.default_configuration();
    config.test_duration_ms = 20_000;
    let summary = run_offline(config, 8).summary;

    write_json(&path, &summary).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["scores"]["variant"], "cpt");
    assert!(json["scores"]["reactionTimeSD"].is_number());
    assert_eq!(json["endReason"], "time-expired");

    let back: ResultSummary = serde_json::from_value(json).unwrap();
    assert_eq!(back.stimuli, summary.stimuli);
    assert_eq!(back.responses, summary.responses);
    assert_eq!(back.configuration, summary.configuration);
    assert_eq!(back.cpt().unwrap().total_targets, summary.cpt().unwrap().total_targets);
}
