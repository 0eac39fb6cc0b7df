use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Built-in Japanese filler terms.
pub const JAPANESE_FILLERS: &[&str] = &[
    "えー",
    "えーと",
    "えっと",
    "ええと",
    "あー",
    "あのー",
    "あの",
    "その",
    "まあ",
    "なんか",
    "ちょっと",
    "やっぱり",
    "うーん",
    "なんていうか",
];

/// Built-in English filler terms.
pub const ENGLISH_FILLERS: &[&str] = &[
    "um",
    "umm",
    "uh",
    "uhh",
    "er",
    "ah",
    "hmm",
    "like",
    "basically",
    "actually",
    "literally",
    "you know",
    "I mean",
    "kind of",
    "sort of",
    "so",
    "well",
];

/// Built-in terms for a language code. Unknown languages have none.
pub fn builtin_terms(language: &str) -> &'static [&'static str] {
    match primary_subtag(language).as_str() {
        "ja" => JAPANESE_FILLERS,
        "en" => ENGLISH_FILLERS,
        _ => &[],
    }
}

/// "ja-JP" -> "ja", "EN" -> "en".
pub(crate) fn primary_subtag(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Ordered, de-duplicated set of filler terms for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillerLexicon {
    language: String,
    terms: Vec<String>,
}

impl FillerLexicon {
    /// Built-in terms followed by `custom`, trimmed, empties dropped,
    /// case-insensitive duplicates removed (first occurrence wins).
    pub fn new<I, S>(language: &str, custom: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let builtin = builtin_terms(language).iter().map(|t| t.to_string());
        let custom = custom.into_iter().map(|t| t.as_ref().to_string());
        Self::from_terms(language, builtin.chain(custom))
    }

    /// A lexicon made of exactly these terms, with no built-in list.
    pub fn from_terms<I, S>(language: &str, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.to_lowercase()))
            .collect();
        Self {
            language: language.to_string(),
            terms,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Supplies the active lexicon for a language.
pub trait LexiconProvider: Send + Sync + 'static {
    fn current_lexicon(&self, language: &str) -> FillerLexicon;
}

/// Lexicon provider backed by a fixed language -> custom terms map.
#[derive(Debug, Clone, Default)]
pub struct StaticLexiconProvider {
    custom: HashMap<String, Vec<String>>,
}

impl StaticLexiconProvider {
    pub fn new(custom: HashMap<String, Vec<String>>) -> Self {
        Self { custom }
    }
}

impl LexiconProvider for StaticLexiconProvider {
    fn current_lexicon(&self, language: &str) -> FillerLexicon {
        let custom = self
            .custom
            .get(language)
            .or_else(|| self.custom.get(&primary_subtag(language)))
            .map(Vec::as_slice)
            .unwrap_or_default();
        FillerLexicon::new(language, custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_by_language_tag() {
        assert_eq!(builtin_terms("ja"), JAPANESE_FILLERS);
        assert_eq!(builtin_terms("ja-JP"), JAPANESE_FILLERS);
        assert_eq!(builtin_terms("EN_us"), ENGLISH_FILLERS);
        assert!(builtin_terms("de").is_empty());
    }

    #[test]
    fn test_custom_terms_appended_and_deduplicated() {
        let lexicon = FillerLexicon::new("en", ["  Um ", "right", "", "RIGHT"]);
        let terms = lexicon.terms();
        assert_eq!(terms.len(), ENGLISH_FILLERS.len() + 1);
        assert_eq!(terms.last().unwrap(), "right");
        assert_eq!(terms.iter().filter(|t| t.eq_ignore_ascii_case("um")).count(), 1);
    }

    #[test]
    fn test_unknown_language_uses_custom_only() {
        let lexicon = FillerLexicon::new("de", ["äh", "ähm"]);
        assert_eq!(lexicon.terms(), ["äh", "ähm"]);
        assert_eq!(lexicon.language(), "de");
    }

    #[test]
    fn test_static_provider_falls_back_to_primary_subtag() {
        let mut custom = HashMap::new();
        custom.insert("ja".to_string(), vec!["なんだろう".to_string()]);
        let provider = StaticLexiconProvider::new(custom);

        let lexicon = provider.current_lexicon("ja-JP");
        assert!(lexicon.terms().iter().any(|t| t == "なんだろう"));
        assert!(lexicon.terms().iter().any(|t| t == "えー"));

        let en = provider.current_lexicon("en");
        assert_eq!(en.len(), ENGLISH_FILLERS.len());
    }
}
