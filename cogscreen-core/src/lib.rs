pub mod config;
pub mod phase;
pub mod stimulus;
pub mod summary;
pub mod trial;

pub use config::{
    CptConfig, DigitSpanConfig, SettingOverride, TestConfiguration, TestVariant, TmtConfig,
    VariantConfig,
};
pub use phase::RunState;
pub use stimulus::{Screen, StimulusEvent, TrailItem, TrailPart};
pub use summary::{CptScores, DigitSpanScores, EndReason, ResultSummary, Scores, TmtScores};
pub use trial::{Response, ResponseEvent};
