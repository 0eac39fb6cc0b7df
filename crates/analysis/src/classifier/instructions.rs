use crate::lexicon::{FillerLexicon, primary_subtag};

const RESPONSE_SCHEMA: &str = r#"{
  "total_filler_count": <int>,
  "filler_rate_per_minute": <number>,
  "speaking_speed": <number>,
  "filler_words": [
    {"word": <string>, "count": <int>, "positions": [<int>], "confidence": <number 0-1>, "contexts": [<string>]}
  ],
  "improvement_suggestions": [<string>]
}"#;

/// Builds the detection rules sent with every segment of a run.
pub fn build_instructions(lexicon: &FillerLexicon, language: &str) -> String {
    let terms = lexicon
        .terms()
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let rules = match primary_subtag(language).as_str() {
        "ja" => JAPANESE_RULES,
        _ => GENERIC_RULES,
    };

    format!(
        "You analyse speech transcripts for filler words.\n\
         Language: {language}\n\
         Filler terms: [{terms}]\n\n\
         {rules}\n\n\
         Confidence bands:\n\
         - 1.0: unmistakable filler (hesitation sound, isolated discourse marker)\n\
         - 0.7-0.9: very likely filler, meaning barely changes if removed\n\
         - 0.5-0.7: plausible filler\n\
         - below 0.5: ambiguous; report only if the sentence reads naturally without it\n\n\
         Positions are zero-based character offsets into the given text. \
         Keep at most 3 short contexts per word. \
         Give up to 5 concrete improvement suggestions in the transcript's language.\n\n\
         Respond with JSON only, exactly in this shape:\n{RESPONSE_SCHEMA}"
    )
}

const JAPANESE_RULES: &str = "Detection rules:\n\
- Count a term only when it stands alone; never inside a longer word (\"その\" in \"そのため\" is not a filler).\n\
- \"その\", \"あの\" used as demonstratives before a noun they refer to are not fillers.\n\
- \"ちょっと\", \"やっぱり\", \"なんか\" are fillers only when removing them keeps the meaning.\n\
- Exclude compounds and idioms (\"まあまあ\", \"えーっ!\" as surprise).\n\
- Elongated variants (\"えーー\", \"あのー\") count as the base term.";

const GENERIC_RULES: &str = "Detection rules:\n\
- Match whole words only; never count a term inside a longer word (\"um\" in \"umbrella\").\n\
- Words like \"like\", \"so\", \"well\", \"actually\" are fillers only when they carry no meaning \
(not comparisons, conclusions, or adverbs of manner).\n\
- Exclude fixed expressions and compound uses (\"kind of car\", \"as well\").\n\
- Matching is case-insensitive.";
