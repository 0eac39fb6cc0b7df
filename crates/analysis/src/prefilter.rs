//! Local, network-free filler candidate scan.
//!
//! Finds literal occurrences of lexicon terms that stand on their own, i.e. are
//! not glued to a neighbouring word character. The result is diagnostic only:
//! it never feeds into the aggregate report, but gives a cheap lower bound to
//! compare the classifier against.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lexicon::FillerLexicon;
use crate::merger::AggregateReport;

/// Context characters kept on each side of a match by [`scan`].
pub const DEFAULT_CONTEXT_RADIUS: usize = 10;

/// All local occurrences of one lexicon term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub word: String,
    /// Zero-based character offsets into the scanned text.
    pub positions: Vec<usize>,
    pub contexts: Vec<String>,
}

impl CandidateMatch {
    pub fn count(&self) -> usize {
        self.positions.len()
    }
}

/// Characters that make a neighbouring match part of a longer word.
///
/// Latin letters and digits (ASCII, Latin-1 and Latin Extended-A/B, full-width
/// forms) and kana. Kanji are deliberately absent: in Japanese a filler such as
/// "その" is routinely followed directly by a kanji noun ("その話").
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c,
            '\u{00C0}'..='\u{00D6}'
            | '\u{00D8}'..='\u{00F6}'
            | '\u{00F8}'..='\u{024F}'
            | '\u{3041}'..='\u{309F}' // hiragana
            | '\u{30A0}'..='\u{30FF}' // katakana, incl. the prolonged sound mark
            | '\u{FF10}'..='\u{FF19}'
            | '\u{FF21}'..='\u{FF3A}'
            | '\u{FF41}'..='\u{FF5A}'
            | '\u{FF66}'..='\u{FF9F}' // half-width katakana
        )
}

/// Compiled lexicon, reusable across scans.
pub struct Prefilter {
    patterns: Vec<(String, Regex)>,
    context_radius: usize,
}

impl Prefilter {
    pub fn new(lexicon: &FillerLexicon, context_radius: usize) -> Self {
        let patterns = lexicon
            .terms()
            .iter()
            .filter_map(|term| {
                match RegexBuilder::new(&regex::escape(term))
                    .case_insensitive(true)
                    .build()
                {
                    Ok(re) => Some((term.clone(), re)),
                    Err(e) => {
                        warn!(%term, "Skipping filler term that does not compile: {}", e);
                        None
                    }
                }
            })
            .collect();

        Self {
            patterns,
            context_radius,
        }
    }

    /// Scans `text`, returning one entry per term with at least one match, in lexicon order.
    pub fn scan(&self, text: &str) -> Vec<CandidateMatch> {
        let char_starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let char_offset = |byte: usize| char_starts.partition_point(|&b| b < byte);

        let mut results = Vec::new();
        for (term, re) in &self.patterns {
            let mut positions = Vec::new();
            let mut contexts = Vec::new();
            let mut at = 0;

            while let Some(m) = re.find_at(text, at) {
                let before = text[..m.start()].chars().next_back();
                let after = text[m.end()..].chars().next();
                let bounded = !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char);

                if bounded {
                    let start = char_offset(m.start());
                    let end = char_offset(m.end());
                    positions.push(start);
                    contexts.push(self.context(text, &char_starts, start, end));
                    at = m.end();
                } else {
                    // Retry one character later; a shifted match may stand alone.
                    at = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
                }

                if at >= text.len() {
                    break;
                }
            }

            if !positions.is_empty() {
                results.push(CandidateMatch {
                    word: term.clone(),
                    positions,
                    contexts,
                });
            }
        }
        results
    }

    /// The match plus `context_radius` characters either side, clipped to the text.
    fn context(&self, text: &str, char_starts: &[usize], start: usize, end: usize) -> String {
        let from = start.saturating_sub(self.context_radius);
        let to = (end + self.context_radius).min(char_starts.len());
        let from_byte = char_starts[from];
        let to_byte = char_starts.get(to).copied().unwrap_or(text.len());
        text[from_byte..to_byte].to_string()
    }
}

/// Scans `text` for every lexicon term with the default context radius.
pub fn scan(text: &str, lexicon: &FillerLexicon) -> Vec<CandidateMatch> {
    Prefilter::new(lexicon, DEFAULT_CONTEXT_RADIUS).scan(text)
}

/// Local vs. classifier count for one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCoverage {
    pub word: String,
    pub local_count: usize,
    pub remote_count: u32,
}

/// How the local scan compares with the merged classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconCoverage {
    pub terms: Vec<TermCoverage>,
    /// Terms found locally that the classifier never reported.
    pub missed_by_classifier: Vec<String>,
}

/// Compares local candidates with a merged report, term by term.
pub fn coverage(candidates: &[CandidateMatch], report: &AggregateReport) -> LexiconCoverage {
    let remote: HashMap<String, u32> = report
        .filler_words
        .iter()
        .map(|w| (w.word.to_lowercase(), w.count))
        .collect();

    let mut result = LexiconCoverage::default();
    for candidate in candidates {
        let remote_count = remote.get(&candidate.word.to_lowercase()).copied().unwrap_or(0);
        if remote_count == 0 {
            result.missed_by_classifier.push(candidate.word.clone());
        }
        result.terms.push(TermCoverage {
            word: candidate.word.clone(),
            local_count: candidate.count(),
            remote_count,
        });
    }
    result
}
