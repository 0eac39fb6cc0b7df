pub mod srt_parser;
pub mod txt_parser;

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

pub use srt_parser::{SrtEntry, parse_srt};
pub use txt_parser::parse_txt;

/// Reference to a recording handed to the transcription collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioHandle {
    pub path: PathBuf,
}

impl AudioHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Trait for pluggable speech-to-text collaborators.
#[async_trait]
pub trait Transcriber: Send + Sync + 'static {
    /// Produces the transcript for a recording.
    async fn transcribe(&self, audio: &AudioHandle) -> anyhow::Result<String>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}

/// Resolves a recording to an existing transcript file instead of running ASR.
///
/// A `.txt` or `.srt` handle is read directly; any other handle is matched to a
/// sidecar with the same stem (`talk.m4a` -> `talk.txt`, then `talk.srt`).
/// Timestamped formats are flattened to their text, one entry per line.
#[derive(Debug, Clone, Default)]
pub struct TranscriptFileSource;

impl TranscriptFileSource {
    fn resolve(path: &Path) -> Option<PathBuf> {
        if is_transcript_file(path) {
            return Some(path.to_path_buf());
        }
        ["txt", "srt"]
            .iter()
            .map(|ext| path.with_extension(ext))
            .find(|candidate| candidate.is_file())
    }
}

fn is_transcript_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("txt" | "srt")
    )
}

/// Flattens transcript file content to plain text according to its format.
pub fn transcript_text(path: &Path, content: &str) -> String {
    let is_srt = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("srt"));

    if is_srt {
        parse_srt(content)
            .into_iter()
            .map(|e| e.text)
            .collect::<Vec<_>>()
            .join("\n")
    } else if txt_parser::is_speaker_format(content) {
        parse_txt(content).join("\n")
    } else {
        content.trim_end().to_string()
    }
}

#[async_trait]
impl Transcriber for TranscriptFileSource {
    async fn transcribe(&self, audio: &AudioHandle) -> anyhow::Result<String> {
        let path = Self::resolve(&audio.path)
            .with_context(|| format!("No transcript found for '{}'", audio.path.display()))?;

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read transcript '{}'", path.display()))?;

        let text = transcript_text(&path, &content);
        debug!(file = %path.display(), chars = text.chars().count(), "Transcript loaded");
        Ok(text)
    }

    fn name(&self) -> &str {
        "transcript_file"
    }
}
