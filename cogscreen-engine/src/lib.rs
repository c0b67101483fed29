pub mod aggregate;
pub mod capture;
pub mod engine;
mod protocol;
mod scheduler;
pub mod settings;

pub use aggregate::{cpt_scores, digit_span_scores, tmt_scores, PartRecord, SpanTrial};
pub use capture::Outcome;
pub use engine::TestEngine;
pub use protocol::{digit_sequence, layout_trail, trail_labels, MAX_PART_B_ITEMS};
pub use scheduler::{presentation_gap_ms, COUNTDOWN_PERIOD_MS, LEAD_IN_MS};
pub use settings::{normalize_label, resolve, resolve_onto, sanitize, SettingError, SettingValue};
