use cogscreen_core::{EndReason, Response, Screen, SettingOverride, TestVariant};
use cogscreen_engine::{resolve, TestEngine};
use cogscreen_timing::ManualTimer;
use rand::rngs::StdRng;
use rand::SeedableRng;

type Engine = TestEngine<ManualTimer, StdRng>;

fn span_engine(overrides: &[(&str, &str)]) -> (Engine, ManualTimer) {
    let overrides: Vec<SettingOverride> = overrides
        .iter()
        .map(|(label, value)| SettingOverride::new(*label, *value))
        .collect();
    let timer = ManualTimer::new();
    let engine = TestEngine::with_configuration(
        resolve(TestVariant::DigitSpan, &overrides),
        timer.clone(),
        StdRng::seed_from_u64(5),
    );
    (engine, timer)
}

/// Steps through playback and returns the digits shown, once recall opens.
fn watch_playback(engine: &mut Engine, timer: &ManualTimer) -> Option<Vec<u8>> {
    let mut digits = Vec::new();
    let mut showing = false;
    while let Some(due) = engine.next_due() {
        timer.set(due);
        engine.update();
        match engine.screen() {
            Screen::Digit { value } => {
                if !showing {
                    digits.push(value);
                }
                showing = true;
            }
            Screen::Recall { length } => {
                assert_eq!(length, digits.len());
                return Some(digits);
            }
            _ => showing = false,
        }
    }
    None
}

#[test]
fn correct_recall_advances_to_max_length() {
    let (mut engine, timer) = span_engine(&[
        ("startLength", "2"),
        ("maxLength", "3"),
        ("trialsPerLength", "1"),
        ("stimulusDurationMs", "500"),
        ("interStimulusIntervalMs", "1000"),
    ]);
    engine.start();

    let first = watch_playback(&mut engine, &timer).unwrap();
    assert_eq!(first.len(), 2);
    timer.advance_ms(700);
    assert!(engine.respond(Response::Sequence(first)));

    let second = watch_playback(&mut engine, &timer).unwrap();
    assert_eq!(second.len(), 3);
    assert!(engine.respond(Response::Sequence(second)));

    assert!(engine.is_complete());
    let results = engine.get_results();
    assert_eq!(results.end_reason, Some(EndReason::Finished));
    assert_eq!(results.stimuli.len(), 2);
    assert_eq!(results.responses.len(), 2);
    assert_eq!(results.responses[0].response_time_ms, 700.0);
    let scores = results.digit_span().unwrap();
    assert_eq!(scores.highest_span_achieved, 3);
    assert_eq!(scores.correct_trials, 2);
    assert_eq!(scores.total_trials, 2);
}

#[test]
fn failed_length_discontinues() {
    let (mut engine, timer) = span_engine(&[("trialsPerLength", "1")]);
    engine.start();
    let digits = watch_playback(&mut engine, &timer).unwrap();
    let wrong: Vec<u8> = digits.iter().map(|d| (d + 1) % 10).collect();
    assert!(engine.respond(Response::Sequence(wrong)));

    let results = engine.get_results();
    assert_eq!(results.end_reason, Some(EndReason::Finished));
    assert!(!results.responses[0].correct);
    assert_eq!(results.digit_span().unwrap().highest_span_achieved, 0);
}

#[test]
fn typed_recall_ignores_separators() {
    let (mut engine, timer) = span_engine(&[("trialsPerLength", "1"), ("maxLength", "3")]);
    engine.start();
    let digits = watch_playback(&mut engine, &timer).unwrap();
    let typed = digits
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(" - ");
    assert!(engine.respond(Response::sequence_from_text(&typed)));
    assert!(engine.is_complete());
    assert!(engine.get_results().responses[0].correct);
}

#[test]
fn submission_during_playback_is_ignored() {
    let (mut engine, timer) = span_engine(&[]);
    engine.start();
    timer.set(1_000_000_000);
    engine.update();
    assert!(matches!(engine.screen(), Screen::Digit { .. }));
    assert!(!engine.respond(Response::Sequence(vec![1, 2, 3])));
}

#[test]
fn recall_timeout_resolves_the_trial_as_incorrect() {
    let (mut engine, timer) = span_engine(&[
        ("trialsPerLength", "1"),
        ("recallTimeLimitMs", "4000"),
    ]);
    engine.start();
    watch_playback(&mut engine, &timer).unwrap();
    while let Some(due) = engine.next_due() {
        timer.set(due);
        engine.update();
    }
    let results = engine.get_results();
    assert_eq!(results.end_reason, Some(EndReason::Finished));
    assert!(results.responses.is_empty());
    let scores = results.digit_span().unwrap();
    assert_eq!(scores.total_trials, 1);
    assert_eq!(scores.correct_trials, 0);
}
