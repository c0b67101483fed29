use serde::{Deserialize, Serialize};

/// Recorded response, at most one per stimulus window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEvent {
    pub stimulus_index: usize,
    pub response_time_ms: f64,
    pub correct: bool,
}

/// Raw input from the host's single trigger channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Key press (CPT).
    Press,
    /// Pointer-down on a trail item, by layout index (TMT).
    Select(usize),
    /// Submitted recall sequence (Digit Span).
    Sequence(Vec<u8>),
}

impl Response {
    /// Builds a recall submission from typed text, keeping only decimal digits.
    pub fn sequence_from_text(text: &str) -> Self {
        Response::Sequence(
            text.chars()
                .filter_map(|c| c.to_digit(10))
                .map(|d| d as u8)
                .collect(),
        )
    }
}
