use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use moodscope_core::analysis::domain::global_result::GlobalResult;
use moodscope_core::detection::domain::analysis_fault::AnalysisFault;
use moodscope_core::detection::domain::frame_analyzer::{FrameAnalyzer, FrameAnalyzerFactory};
use moodscope_core::detection::infrastructure::onnx_emotion_classifier::OnnxEmotionClassifier;
use moodscope_core::detection::infrastructure::onnx_yolo_feature_detector::{
    OnnxYoloFeatureDetector, DEFAULT_CONFIDENCE,
};
use moodscope_core::pipeline::analysis_request::{
    AnalysisMode, AnalysisRequest, AnalysisTarget, InputValidationError,
};
use moodscope_core::pipeline::analyze_video_use_case::AnalyzeVideoUseCase;
use moodscope_core::pipeline::infrastructure::threaded_worker_pool::ThreadedWorkerPool;
use moodscope_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use moodscope_core::pipeline::realtime_session::RealtimeSession;
use moodscope_core::report::domain::analysis_report::AnalysisReport;
use moodscope_core::report::domain::report_renderer::ReportRenderer;
use moodscope_core::report::infrastructure::latex_report_renderer::LatexReportRenderer;
use moodscope_core::report::infrastructure::text_report_renderer::TextReportRenderer;
use moodscope_core::shared::constants::{DEFAULT_BATCH_WORKERS, EMOTION_MODEL, FACE_MODEL};
use moodscope_core::shared::model_resolver::{self, ModelSpec};
use moodscope_core::video::infrastructure::ffmpeg_source::FfmpegSource;
use moodscope_core::video::infrastructure::image_file_writer::ImageFileWriter;

#[cfg(target_os = "macos")]
const DEFAULT_DEVICE: &str = "0";
#[cfg(target_os = "macos")]
const DEFAULT_DEVICE_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const DEFAULT_DEVICE: &str = "video=Integrated Camera";
#[cfg(target_os = "windows")]
const DEFAULT_DEVICE_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const DEFAULT_DEVICE: &str = "/dev/video0";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const DEFAULT_DEVICE_FORMAT: &str = "video4linux2";

/// Report name used for live sessions.
const LIVE_REPORT_NAME: &str = "live";

/// Emotion analysis of recorded videos and live camera streams.
#[derive(Parser)]
#[command(name = "moodscope")]
struct Cli {
    /// Input video, or a folder of videos (batch mode only).
    input: Option<PathBuf>,

    /// Number of parallel analysis workers (batch mode).
    #[arg(short = 't', long, default_value_t = DEFAULT_BATCH_WORKERS)]
    workers: usize,

    /// Analysis mode: batch or realtime.
    #[arg(long, default_value = "batch")]
    mode: String,

    /// Capture device for realtime mode.
    #[arg(long, default_value = DEFAULT_DEVICE)]
    device: String,

    /// ffmpeg input format of the capture device.
    #[arg(long, default_value = DEFAULT_DEVICE_FORMAT)]
    device_format: String,

    /// Seconds to wait before realtime capture starts.
    #[arg(long, default_value = "10")]
    countdown: u64,

    /// Directory for LaTeX reports and exemplar images.
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Write the percentage breakdown as JSON to this file. In folder mode
    /// this is a directory that receives one `<video>.json` per input.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Keep the peak-confidence frame per emotion in batch mode.
    #[arg(long)]
    exemplars: bool,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Use this face/landmark model instead of the cached download.
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Use this emotion model instead of the cached download.
    #[arg(long)]
    classifier_model: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let target = validate(&cli)?;
    let factory = build_analyzer_factory(&cli)?;

    match target {
        AnalysisTarget::File(path) => {
            let result = run_batch(&cli, &path, factory)?;
            write_outputs(&cli, &report_name(&path), &result, cli.json.as_deref())?;
        }
        AnalysisTarget::Folder(videos) => {
            let factory: Arc<dyn FrameAnalyzerFactory> = Arc::from(factory);
            analyze_folder(&videos, |path| {
                let result = run_batch(&cli, path, Box::new(SharedFactory(factory.clone())))?;
                let name = report_name(path);
                let json = cli
                    .json
                    .as_deref()
                    .map(|dir| dir.join(format!("{name}.json")));
                write_outputs(&cli, &name, &result, json.as_deref())
            })?;
        }
        AnalysisTarget::Live => {
            let result = run_realtime(&cli, factory.create()?)?;
            write_outputs(&cli, LIVE_REPORT_NAME, &result, cli.json.as_deref())?;
        }
    }

    Ok(())
}

/// Analyzes every video in turn. A failing video is logged and skipped;
/// the error lists every video that failed.
fn analyze_folder(
    videos: &[PathBuf],
    mut analyze: impl FnMut(&Path) -> Result<(), Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut failed = Vec::new();
    for (i, path) in videos.iter().enumerate() {
        log::info!("[{}/{}] Analyzing {}", i + 1, videos.len(), path.display());
        if let Err(e) = analyze(path) {
            log::warn!("Skipping {}: {e}", path.display());
            failed.push(path.display().to_string());
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} of {} videos failed: {}",
            failed.len(),
            videos.len(),
            failed.join(", ")
        )
        .into())
    }
}

fn run_batch(
    cli: &Cli,
    input: &Path,
    factory: Box<dyn FrameAnalyzerFactory>,
) -> Result<GlobalResult, Box<dyn std::error::Error>> {
    let source = FfmpegSource::open_file(input)?;
    let mut use_case = AnalyzeVideoUseCase::new(
        Box::new(source),
        factory,
        Box::new(ThreadedWorkerPool::new()),
        Box::new(StdoutPipelineLogger::default()),
        Some(cli.workers),
        cli.exemplars,
    );
    Ok(use_case.execute()?)
}

fn run_realtime(
    cli: &Cli,
    analyzer: FrameAnalyzer,
) -> Result<GlobalResult, Box<dyn std::error::Error>> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    countdown(cli.countdown, &cancelled);
    if cancelled.load(Ordering::SeqCst) {
        return Err("Cancelled before capture started".into());
    }

    let source = FfmpegSource::open_device(&cli.device, &cli.device_format)?;
    log::info!("Capturing from {} (press Ctrl-C to stop)", cli.device);
    let session = RealtimeSession::new(Box::new(source), analyzer, cancelled);
    let mut logger = StdoutPipelineLogger::default();
    Ok(session.run(&mut logger)?)
}

fn countdown(seconds: u64, cancelled: &AtomicBool) {
    for remaining in (1..=seconds).rev() {
        if cancelled.load(Ordering::SeqCst) {
            break;
        }
        eprint!("\rCapture starts in {remaining:>2}s");
        std::thread::sleep(Duration::from_secs(1));
    }
    if seconds > 0 {
        eprintln!();
    }
}

fn write_outputs(
    cli: &Cli,
    name: &str,
    result: &GlobalResult,
    json: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = AnalysisReport::new(name, result);
    TextReportRenderer::stdout().render(&report)?;

    if let Some(dir) = &cli.report_dir {
        let renderer = LatexReportRenderer::new(dir, Box::new(ImageFileWriter::new()));
        if let Err(e) = renderer.render(&report) {
            log::warn!("Report not written: {e}");
        }
    }

    if let Some(path) = json {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, report.percentages.view().to_json()?)?;
        log::info!("Percentages written to {}", path.display());
    }
    Ok(())
}

/// Resolves both models once; every worker then loads its own sessions.
fn build_analyzer_factory(
    cli: &Cli,
) -> Result<Box<dyn FrameAnalyzerFactory>, Box<dyn std::error::Error>> {
    let detector_path = resolve_model(FACE_MODEL, cli.detector_model.as_deref())?;
    let classifier_path = resolve_model(EMOTION_MODEL, cli.classifier_model.as_deref())?;
    let confidence = cli.confidence;

    Ok(Box::new(move || -> Result<FrameAnalyzer, AnalysisFault> {
        let detector =
            OnnxYoloFeatureDetector::new(&detector_path, confidence).map_err(AnalysisFault::backend)?;
        let classifier =
            OnnxEmotionClassifier::new(&classifier_path).map_err(AnalysisFault::backend)?;
        Ok(FrameAnalyzer::new(Box::new(detector), Box::new(classifier)))
    }))
}

fn resolve_model(
    spec: ModelSpec,
    override_path: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", spec.name);
    let path = model_resolver::resolve(spec, override_path, None, Some(Box::new(download_progress)))?;
    Ok(path)
}

/// Lets one factory serve several videos in folder mode.
struct SharedFactory(Arc<dyn FrameAnalyzerFactory>);

impl FrameAnalyzerFactory for SharedFactory {
    fn create(&self) -> Result<FrameAnalyzer, AnalysisFault> {
        self.0.create()
    }
}

fn validate(cli: &Cli) -> Result<AnalysisTarget, Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    let mode: AnalysisMode = cli.mode.parse()?;
    if mode == AnalysisMode::Realtime && cli.exemplars {
        return Err(InputValidationError::BatchOnlyOption("--exemplars").into());
    }
    let request = AnalysisRequest {
        input: cli.input.clone(),
        workers: cli.workers,
        mode,
    };
    Ok(request.validate()?)
}

fn report_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("video")
        .to_string()
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
