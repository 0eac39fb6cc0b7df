use serde::{Deserialize, Serialize};

/// Configuration for the transcript analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Assumed speech rate used for every duration estimate (characters per minute).
    pub chars_per_minute: f64,
    /// Target length of one segment in minutes of estimated speech.
    pub segment_minutes: u32,
    /// Transcripts estimated longer than this are split into segments.
    pub segmentation_threshold_minutes: f64,
    /// Characters a segment may end on, preferred over a raw cut.
    pub sentence_terminators: String,
    /// Characters tried when no sentence terminator falls in the window.
    pub fallback_terminators: String,
    /// Characters kept on each side of a prefilter match.
    pub context_radius: usize,
    /// Contexts retained per merged filler word.
    pub max_contexts: usize,
    /// Suggestions retained in the merged report.
    pub max_suggestions: usize,
    /// Merged filler words below this confidence are dropped from the report's word list.
    pub min_confidence: f64,
    /// Per-request timeout for the classification service, in seconds.
    pub request_timeout_secs: u64,
    /// Maximum classification requests in flight. 0 = one per segment.
    pub max_concurrent_requests: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chars_per_minute: 350.0,
            segment_minutes: 5,
            segmentation_threshold_minutes: 5.0,
            sentence_terminators: "。．.？?！!".to_string(),
            fallback_terminators: "、，,".to_string(),
            context_radius: 10,
            max_contexts: 3,
            max_suggestions: 5,
            min_confidence: 0.0,
            request_timeout_secs: 60,
            max_concurrent_requests: 0,
        }
    }
}
