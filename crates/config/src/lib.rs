use std::collections::HashMap;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use speechcoach_analysis::classifier::http::ClassifierConfig;
use speechcoach_analysis::{AnalysisConfig, StaticLexiconProvider};

/// Top-level application settings.
///
/// Sources are layered: built-in defaults, then an optional TOML file, then
/// `SPEECHCOACH__*` environment variables (`__` separates sections, e.g.
/// `SPEECHCOACH__CLASSIFIER__API_KEY`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Language code used when the caller does not pass one (e.g. "ja", "en").
    pub language: String,
    /// Directory analysis records are written to. None = discard reports.
    pub output_dir: Option<String>,
    pub analysis: AnalysisConfig,
    pub classifier: ClassifierConfig,
    pub lexicon: LexiconSettings,
}

/// User-supplied filler terms, per language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconSettings {
    pub custom: HashMap<String, Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "ja".to_string(),
            output_dir: None,
            analysis: AnalysisConfig::default(),
            classifier: ClassifierConfig::default(),
            lexicon: LexiconSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from defaults, an optional file, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix("SPEECHCOACH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Lexicon provider serving the built-in terms plus the configured custom ones.
    pub fn lexicon_provider(&self) -> StaticLexiconProvider {
        StaticLexiconProvider::new(self.lexicon.custom.clone())
    }
}

#[cfg(test)]
mod tests {
    use speechcoach_analysis::{FillerLexicon, LexiconProvider};

    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.language, "ja");
        assert!((settings.analysis.chars_per_minute - 350.0).abs() < 0.001);
        assert_eq!(settings.analysis.segment_minutes, 5);
        assert!(settings.output_dir.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speechcoach.toml");
        std::fs::write(
            &path,
            r#"
language = "en"
output_dir = "/tmp/reports"

[analysis]
chars_per_minute = 900.0
max_concurrent_requests = 4

[classifier]
model = "gpt-4o"

[lexicon.custom]
en = ["you see", "right"]
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.language, "en");
        assert_eq!(settings.output_dir.as_deref(), Some("/tmp/reports"));
        assert!((settings.analysis.chars_per_minute - 900.0).abs() < 0.001);
        assert_eq!(settings.analysis.max_concurrent_requests, 4);
        // Untouched keys keep their defaults
        assert_eq!(settings.analysis.segment_minutes, 5);
        assert_eq!(settings.classifier.model, "gpt-4o");

        let provider = settings.lexicon_provider();
        let en = provider.current_lexicon("en-US");
        assert!(en.terms().iter().any(|t| t == "you see"));
        assert_eq!(en.terms().last().map(String::as_str), Some("right"));
        // built-in terms are not duplicated
        assert_eq!(en.terms().iter().filter(|t| t.as_str() == "um").count(), 1);
        assert_eq!(provider.current_lexicon("ja"), FillerLexicon::new("ja", Vec::<String>::new()));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(Settings::load(Some(&path)).is_err());
    }
}
