use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifiedFillerWord;
use crate::config::AnalysisConfig;
use crate::dispatcher::SegmentResult;
use crate::error::AnalysisError;
use crate::transcript::Transcript;

/// The single authoritative analysis result for one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub total_filler_count: u32,
    pub filler_rate_per_minute: f64,
    /// Characters per minute over the whole transcript.
    pub speaking_speed: f64,
    /// Transcript-global positions, most frequent first.
    pub filler_words: Vec<ClassifiedFillerWord>,
    /// Deduplicated and sorted.
    pub suggestions: Vec<String>,
}

/// Reconciles per-segment classifications into one report.
#[derive(Debug, Clone)]
pub struct ResultMerger {
    chars_per_minute: f64,
    max_contexts: usize,
    max_suggestions: usize,
    min_confidence: f64,
}

impl ResultMerger {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            chars_per_minute: config.chars_per_minute,
            max_contexts: config.max_contexts,
            max_suggestions: config.max_suggestions,
            min_confidence: config.min_confidence,
        }
    }

    /// Merges segment results against the original transcript.
    ///
    /// Word entries are keyed by lowercase text. Segment-local positions are
    /// shifted by the segment's start offset converted to characters at the
    /// assumed speech rate; this is an estimate and drifts when real pacing
    /// differs from the assumed rate. Rates always use the whole transcript's
    /// duration estimate. The output depends only on the order of `results`,
    /// so callers should pass them in segment order.
    ///
    /// Counts or positions that overflow once combined are rejected as a
    /// malformed classification (`Decode`).
    pub fn merge(&self, results: &[SegmentResult], transcript: &Transcript) -> Result<AggregateReport, AnalysisError> {
        let total_filler_count = results
            .iter()
            .try_fold(0u32, |acc, r| acc.checked_add(r.total_count))
            .ok_or_else(|| AnalysisError::Decode("total filler count overflows".to_string()))?;

        let mut merged: Vec<ClassifiedFillerWord> = Vec::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();

        for result in results {
            let shift = self.position_shift(result.segment_start_offset_seconds);
            for word in &result.classified {
                let positions = word
                    .positions
                    .iter()
                    .map(|&p| p.checked_add(shift))
                    .collect::<Option<Vec<usize>>>()
                    .ok_or_else(|| {
                        AnalysisError::Decode(format!(
                            "position of '{}' in segment {} out of range",
                            word.word, result.segment_index
                        ))
                    })?;
                let key = word.word.to_lowercase();

                match by_key.get(&key) {
                    Some(&i) => {
                        let entry = &mut merged[i];
                        entry.count = entry.count.checked_add(word.count).ok_or_else(|| {
                            AnalysisError::Decode(format!("count of '{}' overflows", word.word))
                        })?;
                        entry.confidence = entry.confidence.max(word.confidence);
                        entry.positions.extend(positions);
                        entry.contexts.extend(word.contexts.iter().cloned());
                    }
                    None => {
                        by_key.insert(key, merged.len());
                        merged.push(ClassifiedFillerWord {
                            word: word.word.clone(),
                            count: word.count,
                            positions,
                            confidence: word.confidence,
                            contexts: word.contexts.clone(),
                        });
                    }
                }
            }
        }

        let mut filler_words: Vec<ClassifiedFillerWord> = merged
            .into_iter()
            .filter(|w| w.confidence >= self.min_confidence)
            .map(|mut w| {
                w.contexts.truncate(self.max_contexts);
                w
            })
            .collect();
        // Stable: equal counts keep first-seen order
        filler_words.sort_by(|a, b| b.count.cmp(&a.count));

        let suggestions: Vec<String> = results
            .iter()
            .flat_map(|r| r.suggestions.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(self.max_suggestions)
            .collect();

        let minutes = transcript.estimated_duration_minutes();
        let (filler_rate_per_minute, speaking_speed) = if minutes > 0.0 {
            (
                f64::from(total_filler_count) / minutes,
                transcript.char_count() as f64 / minutes,
            )
        } else {
            (0.0, 0.0)
        };

        Ok(AggregateReport {
            total_filler_count,
            filler_rate_per_minute,
            speaking_speed,
            filler_words,
            suggestions,
        })
    }

    /// Characters spoken before `offset_seconds` at the assumed rate.
    fn position_shift(&self, offset_seconds: f64) -> usize {
        (offset_seconds * self.chars_per_minute / 60.0).round().max(0.0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(w: &str, count: u32, positions: &[usize], confidence: f64, contexts: &[&str]) -> ClassifiedFillerWord {
        ClassifiedFillerWord {
            word: w.to_string(),
            count,
            positions: positions.to_vec(),
            confidence,
            contexts: contexts.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn result(index: usize, offset: f64, total: u32, words: Vec<ClassifiedFillerWord>, suggestions: &[&str]) -> SegmentResult {
        SegmentResult {
            segment_index: index,
            segment_start_offset_seconds: offset,
            classified: words,
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            total_count: total,
        }
    }

    fn merger() -> ResultMerger {
        ResultMerger::new(&AnalysisConfig::default())
    }

    #[test]
    fn test_single_segment_is_identity() {
        let transcript = Transcript::new("えー、今日はですね、プレゼンをします。", 350.0);
        let input = word("えー", 1, &[0], 1.0, &["えー、今日"]);
        let results = vec![result(0, 0.0, 1, vec![input.clone()], &["間を取りましょう"])];

        let report = merger().merge(&results, &transcript).unwrap();
        assert_eq!(report.total_filler_count, 1);
        assert_eq!(report.filler_words, vec![input]);
        assert_eq!(report.suggestions, vec!["間を取りましょう"]);

        let minutes = 19.0 / 350.0;
        assert!((report.filler_rate_per_minute - 1.0 / minutes).abs() < 1e-9);
        assert!((report.speaking_speed - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_positions_remapped_by_offset() {
        let transcript = Transcript::new("x".repeat(4000), 350.0);
        let results = vec![
            result(0, 0.0, 1, vec![word("um", 1, &[3], 0.9, &[])], &[]),
            result(1, 300.0, 2, vec![word("Um", 2, &[0, 10], 0.6, &[])], &[]),
        ];
        let report = merger().merge(&results, &transcript).unwrap();
        assert_eq!(report.filler_words.len(), 1);
        let um = &report.filler_words[0];
        assert_eq!(um.word, "um");
        assert_eq!(um.count, 3);
        // 300s * 350 cpm / 60 = 1750 chars
        assert_eq!(um.positions, vec![3, 1750, 1760]);
        assert!((um.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_count_conservation_and_sort() {
        let transcript = Transcript::new("x".repeat(5000), 350.0);
        let results = vec![
            result(0, 0.0, 4, vec![word("so", 1, &[1], 0.8, &[]), word("uh", 3, &[2, 4, 6], 1.0, &[])], &[]),
            result(1, 300.0, 7, vec![word("so", 5, &[0], 0.7, &[])], &[]),
            result(2, 600.0, 0, vec![], &[]),
        ];
        let report = merger().merge(&results, &transcript).unwrap();
        assert_eq!(report.total_filler_count, 11);
        let words: Vec<(&str, u32)> = report.filler_words.iter().map(|w| (w.word.as_str(), w.count)).collect();
        assert_eq!(words, vec![("so", 6), ("uh", 3)]);
        assert!((report.filler_rate_per_minute - 11.0 / (5000.0 / 350.0)).abs() < 1e-9);
    }

    #[test]
    fn test_contexts_truncated_to_three() {
        let transcript = Transcript::new("x".repeat(4000), 350.0);
        let results = vec![
            result(0, 0.0, 2, vec![word("um", 2, &[0, 1], 1.0, &["a", "b"])], &[]),
            result(1, 300.0, 2, vec![word("um", 2, &[0, 1], 1.0, &["c", "d"])], &[]),
        ];
        let report = merger().merge(&results, &transcript).unwrap();
        assert_eq!(report.filler_words[0].contexts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_suggestions_deduplicated_capped_sorted() {
        let transcript = Transcript::new("x".repeat(4000), 350.0);
        let results = vec![
            result(0, 0.0, 0, vec![], &["g", "b", "a", "f"]),
            result(1, 300.0, 0, vec![], &["b", "e", "d", "c"]),
        ];
        let report = merger().merge(&results, &transcript).unwrap();
        assert_eq!(report.suggestions, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let transcript = Transcript::new("x".repeat(4000), 350.0);
        let results = vec![
            result(0, 0.0, 2, vec![word("a", 1, &[0], 1.0, &[]), word("b", 1, &[1], 1.0, &[])], &["z", "y"]),
            result(1, 300.0, 2, vec![word("c", 1, &[0], 1.0, &[]), word("B", 1, &[1], 1.0, &[])], &["x"]),
        ];
        let first = serde_json::to_string(&merger().merge(&results, &transcript).unwrap()).unwrap();
        let second = serde_json::to_string(&merger().merge(&results, &transcript).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_low_confidence_words_dropped_when_configured() {
        let transcript = Transcript::new("x".repeat(100), 350.0);
        let merger = ResultMerger::new(&AnalysisConfig {
            min_confidence: 0.5,
            ..AnalysisConfig::default()
        });
        let results = vec![result(
            0,
            0.0,
            2,
            vec![word("like", 1, &[0], 0.3, &[]), word("um", 1, &[5], 0.95, &[])],
            &[],
        )];
        let report = merger.merge(&results, &transcript).unwrap();
        assert_eq!(report.filler_words.len(), 1);
        assert_eq!(report.filler_words[0].word, "um");
        // the segment total is still conserved
        assert_eq!(report.total_filler_count, 2);
    }

    #[test]
    fn test_empty_transcript_has_zero_rates() {
        let report = merger().merge(&[], &Transcript::new("", 350.0)).unwrap();
        assert_eq!(report.total_filler_count, 0);
        assert!((report.filler_rate_per_minute - 0.0).abs() < 1e-9);
        assert!((report.speaking_speed - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_count_overflow_is_decode_error() {
        let transcript = Transcript::new("x".repeat(4000), 350.0);
        let results = vec![
            result(0, 0.0, u32::MAX, vec![], &[]),
            result(1, 300.0, u32::MAX, vec![], &[]),
        ];
        let err = merger().merge(&results, &transcript).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn test_word_count_overflow_is_decode_error() {
        let transcript = Transcript::new("x".repeat(4000), 350.0);
        let results = vec![
            result(0, 0.0, 1, vec![word("um", u32::MAX, &[0], 1.0, &[])], &[]),
            result(1, 300.0, 1, vec![word("um", 1, &[0], 1.0, &[])], &[]),
        ];
        let err = merger().merge(&results, &transcript).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn test_out_of_range_position_is_decode_error() {
        let transcript = Transcript::new("x".repeat(4000), 350.0);
        let results = vec![result(1, 300.0, 1, vec![word("um", 1, &[usize::MAX], 1.0, &[])], &[])];
        let err = merger().merge(&results, &transcript).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(msg) if msg.contains("um")));
    }
}
