use serde::{Deserialize, Serialize};

/// The three supported assessments.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestVariant {
    Cpt,
    Tmt,
    DigitSpan,
}

impl TestVariant {
    pub fn name(&self) -> &'static str {
        match self {
            TestVariant::Cpt => "Continuous Performance Test",
            TestVariant::Tmt => "Trail Making Test",
            TestVariant::DigitSpan => "Digit Span",
        }
    }

    pub fn default_configuration(&self) -> TestConfiguration {
        match self {
            TestVariant::Cpt => TestConfiguration {
                test_duration_ms: 300_000,
                stimulus_duration_ms: 250,
                inter_stimulus_interval_ms: 2_000,
                settings: VariantConfig::Cpt(CptConfig::default()),
            },
            TestVariant::Tmt => TestConfiguration {
                test_duration_ms: 480_000,
                stimulus_duration_ms: 0,
                inter_stimulus_interval_ms: 0,
                settings: VariantConfig::Tmt(TmtConfig::default()),
            },
            TestVariant::DigitSpan => TestConfiguration {
                test_duration_ms: 600_000,
                stimulus_duration_ms: 1_000,
                inter_stimulus_interval_ms: 1_500,
                settings: VariantConfig::DigitSpan(DigitSpanConfig::default()),
            },
        }
    }
}

/// One `{label, value}` pair from a question definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingOverride {
    pub label: String,
    pub value: String,
}

impl SettingOverride {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Fully resolved configuration of a run. Frozen once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfiguration {
    pub test_duration_ms: u64,
    pub stimulus_duration_ms: u64,
    pub inter_stimulus_interval_ms: u64,
    pub settings: VariantConfig,
}

impl TestConfiguration {
    pub fn variant(&self) -> TestVariant {
        match self.settings {
            VariantConfig::Cpt(_) => TestVariant::Cpt,
            VariantConfig::Tmt(_) => TestVariant::Tmt,
            VariantConfig::DigitSpan(_) => TestVariant::DigitSpan,
        }
    }

    pub fn cpt(&self) -> Option<&CptConfig> {
        match &self.settings {
            VariantConfig::Cpt(c) => Some(c),
            _ => None,
        }
    }

    pub fn tmt(&self) -> Option<&TmtConfig> {
        match &self.settings {
            VariantConfig::Tmt(c) => Some(c),
            _ => None,
        }
    }

    pub fn digit_span(&self) -> Option<&DigitSpanConfig> {
        match &self.settings {
            VariantConfig::DigitSpan(c) => Some(c),
            _ => None,
        }
    }
}

impl Default for TestConfiguration {
    fn default() -> Self {
        TestVariant::Cpt.default_configuration()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "kebab-case")]
pub enum VariantConfig {
    Cpt(CptConfig),
    Tmt(TmtConfig),
    DigitSpan(DigitSpanConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CptConfig {
    pub target_probability: f64,
    /// Only the first symbol is ever presented as a target.
    pub targets: Vec<String>,
    pub non_targets: Vec<String>,
}

impl Default for CptConfig {
    fn default() -> Self {
        Self {
            target_probability: 0.7,
            targets: vec!["X".to_string()],
            non_targets: ["A", "B", "C", "D", "E", "F", "H", "K"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TmtConfig {
    pub part_a_items: u32,
    pub part_b_items: u32,
    /// Zero disables the limit.
    pub part_a_time_limit_ms: u64,
    pub part_b_time_limit_ms: u64,
    /// Minimum distance between item centres, in unit-square coordinates.
    pub min_distance: f64,
}

impl Default for TmtConfig {
    fn default() -> Self {
        Self {
            part_a_items: 25,
            part_b_items: 25,
            part_a_time_limit_ms: 150_000,
            part_b_time_limit_ms: 300_000,
            min_distance: 0.12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitSpanConfig {
    pub start_length: u32,
    pub max_length: u32,
    pub trials_per_length: u32,
    /// Zero waits for the submission indefinitely.
    pub recall_time_limit_ms: u64,
    /// Recall in reverse presentation order.
    pub backward: bool,
}

impl Default for DigitSpanConfig {
    fn default() -> Self {
        Self {
            start_length: 3,
            max_length: 9,
            trials_per_length: 2,
            recall_time_limit_ms: 30_000,
            backward: false,
        }
    }
}
