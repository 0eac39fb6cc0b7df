pub mod http;
pub mod instructions;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// One classification call: detection rules plus the text to classify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub instructions: String,
    #[serde(rename = "transcriptSegment")]
    pub transcript_segment: String,
}

/// A filler word as scored by the classification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedFillerWord {
    pub word: String,
    pub count: u32,
    /// Character offsets; segment-local in a response, transcript-global in a report.
    pub positions: Vec<usize>,
    /// 0.0-1.0
    pub confidence: f64,
    #[serde(default)]
    pub contexts: Vec<String>,
}

/// Wire shape of a classification response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub total_filler_count: u32,
    pub filler_rate_per_minute: f64,
    pub speaking_speed: f64,
    pub filler_words: Vec<ClassifiedFillerWord>,
    pub improvement_suggestions: Vec<String>,
}

/// Trait for pluggable semantic classification services.
#[async_trait]
pub trait SegmentClassifier: Send + Sync + 'static {
    /// Classifies one transcript segment.
    async fn classify(&self, request: ClassificationRequest) -> Result<ClassificationResponse, AnalysisError>;

    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Fails with `Configuration` when no request could possibly succeed
    /// (e.g. missing credential). Called once before a batch is dispatched.
    fn ensure_configured(&self) -> Result<(), AnalysisError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_wire_shape() {
        let json = r#"{
            "total_filler_count": 1,
            "filler_rate_per_minute": 3.5,
            "speaking_speed": 350.0,
            "filler_words": [
                {"word": "えー", "count": 1, "positions": [0], "confidence": 1.0}
            ],
            "improvement_suggestions": ["間を取りましょう"]
        }"#;
        let resp: ClassificationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.total_filler_count, 1);
        assert!(resp.filler_words[0].contexts.is_empty());

        let value = serde_json::to_value(&resp).unwrap();
        for key in [
            "total_filler_count",
            "filler_rate_per_minute",
            "speaking_speed",
            "filler_words",
            "improvement_suggestions",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_request_field_names() {
        let req = ClassificationRequest {
            instructions: "rules".into(),
            transcript_segment: "text".into(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["transcriptSegment"], "text");
        assert_eq!(value["instructions"], "rules");
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let json = r#"{"total_filler_count": 1, "filler_words": []}"#;
        assert!(serde_json::from_str::<ClassificationResponse>(json).is_err());
    }
}
