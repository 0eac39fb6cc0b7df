use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use speechcoach_analysis::classifier::http::HttpClassifier;
use speechcoach_analysis::source::transcript_text;
use speechcoach_analysis::{
    AnalysisOrchestrator, AudioHandle, JsonFileSink, LexiconProvider, NullSink, Prefilter, ReportSink,
    TranscriptFileSource,
};
use speechcoach_config::Settings;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Filler-word analysis for speech transcripts.
#[derive(Parser)]
#[command(name = "speechcoach", version)]
struct Cli {
    /// Settings file (TOML). Environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full analysis and print the aggregate report.
    Analyze {
        /// Recording or transcript (.txt / .srt). Recordings need a sidecar transcript.
        file: PathBuf,

        /// Language code; defaults to the configured language.
        #[arg(long)]
        language: Option<String>,

        /// Directory to store the analysis record in.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run only the local lexicon scan and print the candidates.
    Scan {
        /// Transcript (.txt / .srt).
        file: PathBuf,

        #[arg(long)]
        language: Option<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Command::Analyze { file, language, out } => {
            let language = language.unwrap_or_else(|| settings.language.clone());
            analyze(&settings, &file, &language, out).await
        }
        Command::Scan { file, language } => {
            let language = language.unwrap_or_else(|| settings.language.clone());
            scan(&settings, &file, &language).await
        }
    }
}

async fn analyze(settings: &Settings, file: &Path, language: &str, out: Option<PathBuf>) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(settings.analysis.request_timeout_secs);
    let classifier = HttpClassifier::with_timeout(settings.classifier.clone(), timeout)?;

    let sink: Arc<dyn ReportSink> = match out.or_else(|| settings.output_dir.as_ref().map(PathBuf::from)) {
        Some(dir) => {
            info!(dir = %dir.display(), "Storing analysis records");
            Arc::new(JsonFileSink::new(dir))
        }
        None => Arc::new(NullSink),
    };

    let orchestrator = AnalysisOrchestrator::new(
        Arc::new(TranscriptFileSource),
        Arc::new(classifier),
        Arc::new(settings.lexicon_provider()),
        sink,
        settings.analysis.clone(),
    );

    let mut progress = orchestrator.subscribe();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let event = progress.borrow_and_update().clone();
            info!(state = event.state.label(), progress = event.progress, "{}", event.step);
        }
    });

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling analysis");
                cancel.cancel();
            }
        });
    }

    let report = orchestrator.run(&AudioHandle::new(file), language, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn scan(settings: &Settings, file: &Path, language: &str) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read '{}'", file.display()))?;
    let text = transcript_text(file, &content);

    let lexicon = settings.lexicon_provider().current_lexicon(language);
    if lexicon.is_empty() {
        warn!(language, "No filler terms for language");
    }

    let candidates = Prefilter::new(&lexicon, settings.analysis.context_radius).scan(&text);
    println!("{}", serde_json::to_string_pretty(&candidates)?);
    Ok(())
}
