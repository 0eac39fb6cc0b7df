pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod lexicon;
pub mod merger;
pub mod orchestrator;
pub mod prefilter;
pub mod segmenter;
pub mod sink;
pub mod source;
pub mod transcript;

pub use classifier::{ClassificationRequest, ClassificationResponse, ClassifiedFillerWord, SegmentClassifier};
pub use config::AnalysisConfig;
pub use dispatcher::{ClassificationDispatcher, SegmentResult};
pub use error::AnalysisError;
pub use lexicon::{FillerLexicon, LexiconProvider, StaticLexiconProvider};
pub use merger::{AggregateReport, ResultMerger};
pub use orchestrator::{AnalysisOrchestrator, AnalysisState, ProgressEvent};
pub use prefilter::{CandidateMatch, Prefilter};
pub use segmenter::{Segment, Segmenter};
pub use sink::{AnalysisRecord, JsonFileSink, NullSink, ReportSink};
pub use source::{AudioHandle, Transcriber, TranscriptFileSource};
pub use transcript::Transcript;
