use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classifier::SegmentClassifier;
use crate::config::AnalysisConfig;
use crate::dispatcher::ClassificationDispatcher;
use crate::error::AnalysisError;
use crate::lexicon::LexiconProvider;
use crate::merger::{AggregateReport, ResultMerger};
use crate::prefilter::{self, Prefilter};
use crate::segmenter::Segmenter;
use crate::sink::{AnalysisRecord, ReportSink};
use crate::source::{AudioHandle, Transcriber};
use crate::transcript::Transcript;

/// Where a run currently is. `Complete` and `Failed` are terminal.
#[derive(Debug, Clone)]
pub enum AnalysisState {
    Idle,
    Transcribing,
    Segmenting,
    Classifying,
    Merging,
    Complete(Arc<AggregateReport>),
    Failed(AnalysisError),
}

impl AnalysisState {
    /// Human-readable step label for presentation layers.
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisState::Idle => "Waiting",
            AnalysisState::Transcribing => "Transcribing audio",
            AnalysisState::Segmenting => "Splitting transcript",
            AnalysisState::Classifying => "Detecting filler words",
            AnalysisState::Merging => "Merging results",
            AnalysisState::Complete(_) => "Analysis complete",
            AnalysisState::Failed(_) => "Analysis failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisState::Complete(_) | AnalysisState::Failed(_))
    }

    /// Position along the happy path; `None` for `Failed`, which keeps the last value.
    fn ordinal(&self) -> Option<u8> {
        match self {
            AnalysisState::Idle => Some(0),
            AnalysisState::Transcribing => Some(1),
            AnalysisState::Segmenting => Some(2),
            AnalysisState::Classifying => Some(3),
            AnalysisState::Merging => Some(4),
            AnalysisState::Complete(_) => Some(5),
            AnalysisState::Failed(_) => None,
        }
    }
}

const FINAL_ORDINAL: f64 = 5.0;

/// Snapshot published on every state transition.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub state: AnalysisState,
    pub step: String,
    /// 0.0-1.0, never decreases within a run.
    pub progress: f64,
}

impl ProgressEvent {
    fn idle() -> Self {
        Self {
            step: AnalysisState::Idle.label().to_string(),
            state: AnalysisState::Idle,
            progress: 0.0,
        }
    }
}

/// Drives one recording through transcription, classification, merge and hand-off.
///
/// Collaborators are injected so each can be swapped for a fake. Runs are not
/// retried; a failed run is restarted by calling [`run`](Self::run) again.
/// One run at a time per orchestrator: progress is published on a single channel.
pub struct AnalysisOrchestrator {
    transcriber: Arc<dyn Transcriber>,
    classifier: Arc<dyn SegmentClassifier>,
    lexicon: Arc<dyn LexiconProvider>,
    sink: Arc<dyn ReportSink>,
    config: AnalysisConfig,
    progress_tx: watch::Sender<ProgressEvent>,
}

impl AnalysisOrchestrator {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        classifier: Arc<dyn SegmentClassifier>,
        lexicon: Arc<dyn LexiconProvider>,
        sink: Arc<dyn ReportSink>,
        config: AnalysisConfig,
    ) -> Self {
        let (progress_tx, _) = watch::channel(ProgressEvent::idle());

        info!(
            transcriber = %transcriber.name(),
            classifier = %classifier.name(),
            "Analysis orchestrator created"
        );

        Self {
            transcriber,
            classifier,
            lexicon,
            sink,
            config,
            progress_tx,
        }
    }

    /// Returns a receiver that observes every progress event.
    pub fn subscribe(&self) -> watch::Receiver<ProgressEvent> {
        self.progress_tx.subscribe()
    }

    /// The most recently published progress event.
    pub fn current(&self) -> ProgressEvent {
        self.progress_tx.borrow().clone()
    }

    /// Runs a full analysis of one recording.
    ///
    /// `cancel` is observed between transitions and while waiting on
    /// transcription or classification; in-flight work is dropped and the run
    /// ends in `Failed(Cancelled)`. The report is published as `Complete` only
    /// after the sink accepted it.
    pub async fn run(
        &self,
        audio: &AudioHandle,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<AggregateReport, AnalysisError> {
        self.progress_tx.send_replace(ProgressEvent::idle());
        let started = Instant::now();
        info!(audio = %audio.path.display(), %language, "Analysis started");

        match self.execute(audio, language, cancel).await {
            Ok(report) => {
                self.transition(AnalysisState::Complete(Arc::new(report.clone())));
                info!(
                    total = report.total_filler_count,
                    rate = report.filler_rate_per_minute,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Analysis complete"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(step = %self.current().step, "Analysis failed: {}", e);
                self.transition(AnalysisState::Failed(e.clone()));
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        audio: &AudioHandle,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<AggregateReport, AnalysisError> {
        // 1. Transcribe
        self.advance(AnalysisState::Transcribing, cancel)?;
        let text = until_cancelled(cancel, async {
            self.transcriber
                .transcribe(audio)
                .await
                .map_err(|e| AnalysisError::Transcription(format!("{e:#}")))
        })
        .await?;

        let transcript = Transcript::new(text, self.config.chars_per_minute);
        if transcript.is_blank() {
            return Err(AnalysisError::Input("transcript is empty".to_string()));
        }

        let lexicon = self.lexicon.current_lexicon(language);
        if lexicon.is_empty() {
            warn!(%language, "No filler terms configured for language");
        }

        let candidates = Prefilter::new(&lexicon, self.config.context_radius).scan(transcript.text());
        debug!(
            terms = candidates.len(),
            occurrences = candidates.iter().map(|c| c.count()).sum::<usize>(),
            "Local filler candidates"
        );

        // 2. Segment (long transcripts only)
        let segmenter = Segmenter::new(&self.config);
        let segments = if segmenter.needs_split(&transcript) {
            self.advance(AnalysisState::Segmenting, cancel)?;
            let segments = segmenter.split(transcript.text(), self.config.segment_minutes);
            info!(
                segments = segments.len(),
                estimated_minutes = transcript.estimated_duration_minutes(),
                "Transcript segmented"
            );
            segments
        } else {
            segmenter.plan(&transcript, self.config.segment_minutes)
        };

        // 3. Classify
        self.advance(AnalysisState::Classifying, cancel)?;
        let dispatcher = ClassificationDispatcher::new(Arc::clone(&self.classifier), &self.config);
        let results = until_cancelled(cancel, dispatcher.classify(&segments, &lexicon, language)).await?;

        // 4. Merge
        self.advance(AnalysisState::Merging, cancel)?;
        let report = ResultMerger::new(&self.config).merge(&results, &transcript)?;

        let coverage = prefilter::coverage(&candidates, &report);
        if !coverage.missed_by_classifier.is_empty() {
            debug!(missed = ?coverage.missed_by_classifier, "Terms found locally but not classified as fillers");
        }

        // 5. Hand off
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        let record = AnalysisRecord::new(language, transcript.char_count(), report.clone());
        self.sink
            .store(&record)
            .await
            .map_err(|e| AnalysisError::Persistence(format!("{e:#}")))?;

        Ok(report)
    }

    /// Enters a non-terminal state unless the run was cancelled.
    fn advance(&self, state: AnalysisState, cancel: &CancellationToken) -> Result<(), AnalysisError> {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        self.transition(state);
        Ok(())
    }

    fn transition(&self, state: AnalysisState) {
        self.progress_tx.send_modify(|event| {
            if let Some(ordinal) = state.ordinal() {
                event.progress = event.progress.max(f64::from(ordinal) / FINAL_ORDINAL);
            }
            event.step = state.label().to_string();
            event.state = state;
        });
        debug!(step = %self.progress_tx.borrow().step, "Analysis state changed");
    }
}

/// Resolves `fut` unless `cancel` fires first, in which case `fut` is dropped.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, AnalysisError>>,
) -> Result<T, AnalysisError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AnalysisError::Cancelled),
        result = fut => result,
    }
}
