use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::instructions::build_instructions;
use crate::classifier::{ClassificationRequest, ClassifiedFillerWord, SegmentClassifier};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::lexicon::FillerLexicon;
use crate::segmenter::Segment;

/// Classification outcome for one segment, tagged with where the segment starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResult {
    pub segment_index: usize,
    pub segment_start_offset_seconds: f64,
    pub classified: Vec<ClassifiedFillerWord>,
    pub suggestions: Vec<String>,
    pub total_count: u32,
}

/// Fans segments out to a classifier and joins the results all-or-nothing.
pub struct ClassificationDispatcher {
    classifier: Arc<dyn SegmentClassifier>,
    timeout: Duration,
    max_in_flight: usize,
    max_contexts: usize,
}

impl ClassificationDispatcher {
    pub fn new(classifier: Arc<dyn SegmentClassifier>, config: &AnalysisConfig) -> Self {
        Self {
            classifier,
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_in_flight: config.max_concurrent_requests,
            max_contexts: config.max_contexts,
        }
    }

    /// Classifies every segment concurrently.
    ///
    /// On success every request has completed and results are in segment
    /// order. The first failing request ends the batch immediately: requests
    /// still in flight are dropped without being awaited, queued ones are never
    /// sent, and no partial result is returned.
    pub async fn classify(
        &self,
        segments: &[Segment],
        lexicon: &FillerLexicon,
        language: &str,
    ) -> Result<Vec<SegmentResult>, AnalysisError> {
        self.classifier.ensure_configured()?;

        if segments.is_empty() {
            return Ok(Vec::new());
        }

        let instructions = build_instructions(lexicon, language);
        let limit = if self.max_in_flight == 0 {
            segments.len()
        } else {
            self.max_in_flight
        };

        info!(
            segments = segments.len(),
            in_flight = limit,
            backend = %self.classifier.name(),
            "Dispatching classification batch"
        );
        let started = Instant::now();

        let mut results: Vec<SegmentResult> = stream::iter(segments)
            .map(|segment| self.classify_segment(segment, &instructions))
            .buffer_unordered(limit)
            .boxed()
            .try_collect()
            .await
            .inspect_err(|e| warn!("Classification batch aborted: {}", e))?;
        results.sort_by_key(|r| r.segment_index);

        info!(
            segments = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Classification batch complete"
        );
        Ok(results)
    }

    async fn classify_segment(&self, segment: &Segment, instructions: &str) -> Result<SegmentResult, AnalysisError> {
        let request = ClassificationRequest {
            instructions: instructions.to_string(),
            transcript_segment: segment.text.clone(),
        };

        debug!(index = segment.index, chars = segment.text.chars().count(), "Classifying segment");
        let start = Instant::now();

        let response = match tokio::time::timeout(self.timeout, self.classifier.classify(request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AnalysisError::Network(format!(
                    "segment {} timed out after {}s",
                    segment.index,
                    self.timeout.as_secs()
                )));
            }
        };

        debug!(
            index = segment.index,
            total = response.total_filler_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Segment classified"
        );

        let classified = response
            .filler_words
            .into_iter()
            .map(|mut word| {
                word.confidence = word.confidence.clamp(0.0, 1.0);
                word.contexts.truncate(self.max_contexts);
                word
            })
            .collect();

        Ok(SegmentResult {
            segment_index: segment.index,
            segment_start_offset_seconds: segment.start_offset_seconds,
            classified,
            suggestions: response.improvement_suggestions,
            total_count: response.total_filler_count,
        })
    }
}
