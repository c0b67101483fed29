//! Settings resolver: reduces an ordered `{label, value}` override list onto
//! variant defaults. Bad input never fails the caller; the offending entry is
//! logged and the previous value kept.

use std::fmt;

use cogscreen_core::{
    CptConfig, DigitSpanConfig, SettingOverride, TestConfiguration, TestVariant, TmtConfig,
    VariantConfig,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::protocol::MAX_PART_B_ITEMS;

/// A raw override value after type inference.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    List(Vec<String>),
    Text(String),
}

impl SettingValue {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return SettingValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return SettingValue::Bool(false);
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return SettingValue::Number(n);
            }
        }
        if trimmed.contains(',') {
            return SettingValue::List(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            );
        }
        SettingValue::Text(trimmed.to_string())
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Number(n) => write!(f, "{}", n),
            SettingValue::List(items) => write!(f, "{}", items.join(",")),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingError {
    #[error("unknown setting `{0}`")]
    Unknown(String),
    #[error("`{label}` expects a number, got `{value}`")]
    NotANumber { label: String, value: String },
    #[error("`{label}` expects true or false, got `{value}`")]
    NotABool { label: String, value: String },
    #[error("`{label}` must be within {min}..={max}, got {value}")]
    OutOfRange {
        label: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("`{label}` needs at least one symbol")]
    EmptyList { label: String },
}

/// A configuration section that accepts overrides by normalized key. `value`
/// is `entry.value` after type inference; list fields read the raw text.
pub trait Configure {
    fn apply(
        &mut self,
        key: &str,
        entry: &SettingOverride,
        value: &SettingValue,
    ) -> Result<(), SettingError>;
}

/// Lowercases and strips `_`, `-` and spaces, so `targetProbability`,
/// `target_probability` and `Target Probability` all match.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolves overrides onto the defaults of `variant`.
pub fn resolve(variant: TestVariant, overrides: &[SettingOverride]) -> TestConfiguration {
    resolve_onto(variant.default_configuration(), overrides)
}

/// Applies overrides in order (last write wins) and sanitizes the result.
pub fn resolve_onto(
    mut config: TestConfiguration,
    overrides: &[SettingOverride],
) -> TestConfiguration {
    for o in overrides {
        let key = normalize_label(&o.label);
        let value = SettingValue::parse(&o.value);
        match config.apply(&key, o, &value) {
            Ok(()) => debug!("setting {} = {}", o.label, value),
            Err(err @ SettingError::Unknown(_)) => debug!("ignoring override: {}", err),
            Err(err) => warn!("ignoring override: {}", err),
        }
    }
    sanitize(config)
}

/// Repairs a configuration that bypassed the resolver: restores empty symbol
/// sets, clamps the probability and keeps counts and lengths usable.
pub fn sanitize(mut config: TestConfiguration) -> TestConfiguration {
    let variant = config.variant();
    if variant != TestVariant::Tmt && config.stimulus_duration_ms == 0 {
        let fixed = variant.default_configuration().stimulus_duration_ms;
        warn!("stimulus duration of 0 ms, using {}", fixed);
        config.stimulus_duration_ms = fixed;
    }
    match &mut config.settings {
        VariantConfig::Cpt(cpt) => {
            let defaults = CptConfig::default();
            if !(0.0..=1.0).contains(&cpt.target_probability) {
                let fixed = if cpt.target_probability.is_nan() {
                    defaults.target_probability
                } else {
                    cpt.target_probability.clamp(0.0, 1.0)
                };
                warn!(
                    "target probability {} out of range, using {}",
                    cpt.target_probability, fixed
                );
                cpt.target_probability = fixed;
            }
            if cpt.targets.is_empty() {
                warn!("empty target set, using defaults");
                cpt.targets = defaults.targets;
            }
            if cpt.non_targets.is_empty() {
                warn!("empty non-target set, using defaults");
                cpt.non_targets = defaults.non_targets;
            }
        }
        VariantConfig::Tmt(tmt) => {
            let defaults = TmtConfig::default();
            if tmt.part_a_items == 0 {
                tmt.part_a_items = defaults.part_a_items;
            }
            if tmt.part_b_items == 0 {
                tmt.part_b_items = defaults.part_b_items;
            }
            if tmt.part_b_items > MAX_PART_B_ITEMS {
                warn!(
                    "{} part B items exceed the alphabet, using {}",
                    tmt.part_b_items, MAX_PART_B_ITEMS
                );
                tmt.part_b_items = MAX_PART_B_ITEMS;
            }
            if !(0.0..=0.5).contains(&tmt.min_distance) {
                warn!("min distance {} out of range", tmt.min_distance);
                tmt.min_distance = defaults.min_distance;
            }
        }
        VariantConfig::DigitSpan(span) => {
            let defaults = DigitSpanConfig::default();
            if span.start_length == 0 {
                span.start_length = defaults.start_length;
            }
            if span.trials_per_length == 0 {
                span.trials_per_length = defaults.trials_per_length;
            }
            if span.max_length < span.start_length {
                warn!(
                    "max length {} below start length {}, raising it",
                    span.max_length, span.start_length
                );
                span.max_length = span.start_length;
            }
        }
    }
    config
}

fn number(label: &str, value: &SettingValue) -> Result<f64, SettingError> {
    match value {
        SettingValue::Number(n) => Ok(*n),
        other => Err(SettingError::NotANumber {
            label: label.to_string(),
            value: other.to_string(),
        }),
    }
}

fn in_range(label: &str, value: f64, min: f64, max: f64) -> Result<f64, SettingError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(SettingError::OutOfRange {
            label: label.to_string(),
            value,
            min,
            max,
        })
    }
}

fn millis(label: &str, value: &SettingValue) -> Result<u64, SettingError> {
    let n = in_range(label, number(label, value)?, 0.0, u64::MAX as f64)?;
    Ok(n.round() as u64)
}

fn count(label: &str, value: &SettingValue) -> Result<u32, SettingError> {
    let n = in_range(label, number(label, value)?, 1.0, u32::MAX as f64)?;
    Ok(n.round() as u32)
}

fn flag(label: &str, value: &SettingValue) -> Result<bool, SettingError> {
    match value {
        SettingValue::Bool(b) => Ok(*b),
        other => Err(SettingError::NotABool {
            label: label.to_string(),
            value: other.to_string(),
        }),
    }
}

fn symbols(label: &str, raw: &str) -> Result<Vec<String>, SettingError> {
    let list: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if list.is_empty() {
        return Err(SettingError::EmptyList {
            label: label.to_string(),
        });
    }
    Ok(list)
}

impl Configure for TestConfiguration {
    fn apply(
        &mut self,
        key: &str,
        entry: &SettingOverride,
        value: &SettingValue,
    ) -> Result<(), SettingError> {
        let label = entry.label.as_str();
        match key {
            "testdurationms" => self.test_duration_ms = millis(label, value)?,
            "stimulusdurationms" => self.stimulus_duration_ms = millis(label, value)?,
            "interstimulusintervalms" | "isims" => {
                self.inter_stimulus_interval_ms = millis(label, value)?
            }
            _ => match &mut self.settings {
                VariantConfig::Cpt(c) => c.apply(key, entry, value)?,
                VariantConfig::Tmt(c) => c.apply(key, entry, value)?,
                VariantConfig::DigitSpan(c) => c.apply(key, entry, value)?,
            },
        }
        Ok(())
    }
}

impl Configure for CptConfig {
    fn apply(
        &mut self,
        key: &str,
        entry: &SettingOverride,
        value: &SettingValue,
    ) -> Result<(), SettingError> {
        let label = entry.label.as_str();
        match key {
            "targetprobability" => {
                self.target_probability = in_range(label, number(label, value)?, 0.0, 1.0)?
            }
            "targets" => self.targets = symbols(label, &entry.value)?,
            "nontargets" => self.non_targets = symbols(label, &entry.value)?,
            _ => return Err(SettingError::Unknown(label.to_string())),
        }
        Ok(())
    }
}

impl Configure for TmtConfig {
    fn apply(
        &mut self,
        key: &str,
        entry: &SettingOverride,
        value: &SettingValue,
    ) -> Result<(), SettingError> {
        let label = entry.label.as_str();
        match key {
            "partaitems" => self.part_a_items = count(label, value)?,
            "partbitems" => self.part_b_items = count(label, value)?,
            "partatimelimitms" => self.part_a_time_limit_ms = millis(label, value)?,
            "partbtimelimitms" => self.part_b_time_limit_ms = millis(label, value)?,
            "mindistance" | "minimumdistance" => {
                self.min_distance = in_range(label, number(label, value)?, 0.0, 0.5)?
            }
            _ => return Err(SettingError::Unknown(label.to_string())),
        }
        Ok(())
    }
}

impl Configure for DigitSpanConfig {
    fn apply(
        &mut self,
        key: &str,
        entry: &SettingOverride,
        value: &SettingValue,
    ) -> Result<(), SettingError> {
        let label = entry.label.as_str();
        match key {
            "startlength" => self.start_length = count(label, value)?,
            "maxlength" => self.max_length = count(label, value)?,
            "trialsperlength" => self.trials_per_length = count(label, value)?,
            "recalltimelimitms" => self.recall_time_limit_ms = millis(label, value)?,
            "backward" => self.backward = flag(label, value)?,
            _ => return Err(SettingError::Unknown(label.to_string())),
        }
        Ok(())
    }
}
