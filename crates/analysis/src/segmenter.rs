use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::transcript::Transcript;

/// A contiguous slice of a transcript, analysed on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub text: String,
    /// Approximate start in the recording: `index * segment_minutes * 60`.
    /// Advisory only, not derived from transcription timestamps.
    pub start_offset_seconds: f64,
}

/// Splits long transcripts into segments of roughly equal estimated duration.
#[derive(Debug, Clone)]
pub struct Segmenter {
    chars_per_minute: f64,
    threshold_minutes: f64,
    sentence_terminators: Vec<char>,
    fallback_terminators: Vec<char>,
}

impl Segmenter {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            chars_per_minute: config.chars_per_minute,
            threshold_minutes: config.segmentation_threshold_minutes,
            sentence_terminators: config.sentence_terminators.chars().collect(),
            fallback_terminators: config.fallback_terminators.chars().collect(),
        }
    }

    /// Whether a transcript is long enough to be split.
    pub fn needs_split(&self, transcript: &Transcript) -> bool {
        transcript.estimated_duration_minutes() > self.threshold_minutes
    }

    /// Segments for a transcript: split when long, otherwise the whole text at offset 0.
    pub fn plan(&self, transcript: &Transcript, target_minutes: u32) -> Vec<Segment> {
        if self.needs_split(transcript) {
            self.split(transcript.text(), target_minutes)
        } else {
            vec![Segment {
                index: 0,
                text: transcript.text().to_string(),
                start_offset_seconds: 0.0,
            }]
        }
    }

    /// Cuts `text` into windows of `chars_per_minute * target_minutes` characters.
    ///
    /// Every window but the last ends just after the nearest sentence terminator
    /// searching backwards, else the nearest fallback terminator, else at the raw
    /// window edge. Cuts always fall between characters, so concatenating the
    /// segment texts reproduces `text` exactly.
    pub fn split(&self, text: &str, target_minutes: u32) -> Vec<Segment> {
        let chars: Vec<char> = text.chars().collect();
        let window = ((self.chars_per_minute * f64::from(target_minutes)).floor() as usize).max(1);

        let mut segments = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let proposed_end = (start + window).min(chars.len());
            let end = if proposed_end == chars.len() {
                proposed_end
            } else {
                let slice = &chars[start..proposed_end];
                self.last_cut(slice, &self.sentence_terminators)
                    .or_else(|| self.last_cut(slice, &self.fallback_terminators))
                    .map_or(proposed_end, |cut| start + cut)
            };

            let index = segments.len();
            segments.push(Segment {
                index,
                text: chars[start..end].iter().collect(),
                start_offset_seconds: index as f64 * f64::from(target_minutes) * 60.0,
            });
            start = end;
        }
        segments
    }

    /// Length of `slice` up to and including its last terminator, if any.
    fn last_cut(&self, slice: &[char], terminators: &[char]) -> Option<usize> {
        slice
            .iter()
            .rposition(|c| terminators.contains(c))
            .map(|pos| pos + 1)
    }
}
