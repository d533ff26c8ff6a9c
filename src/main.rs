use anyhow::{Context, Result};
use clap::Parser;
use posefx::capture::{CaptureSource, WebcamCapture};
use posefx::config::Resolution;
use posefx::output::{OutputSink, V4L2Output};
use posefx::overlay::Rasterizer;
use posefx::pose::{self, PoseEngine};
use posefx::{AnonymizerConfig, FrameAnonymizer};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Output v4l2loopback device path
    #[arg(short, long, default_value = "/dev/video10")]
    output_device: String,

    /// Capture/output resolution preset
    #[arg(long, value_enum, default_value_t = Resolution::Medium)]
    res: Resolution,

    /// Flip video horizontally
    #[arg(long)]
    mirror: bool,

    /// Path to pose model (ONNX file); defaults to the model for --res
    #[arg(long)]
    model: Option<PathBuf>,

    /// Replace people with the estimated background
    #[arg(long)]
    anonymize: bool,

    /// Minimum keypoint score to draw
    #[arg(long, default_value_t = posefx::config::DEFAULT_KEYPOINT_THRESHOLD)]
    keypoint_threshold: f32,

    /// TTF/OTF font for the status line; without one no text is drawn
    #[arg(long)]
    font: Option<PathBuf>,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let (sink_width, sink_height) = args.res.sink_size();
    tracing::info!("posefx starting");
    tracing::info!("Resolution: {}x{}", sink_width, sink_height);
    tracing::info!("Target FPS: {}", args.fps);

    let model_path = args
        .model
        .clone()
        .unwrap_or_else(|| args.res.default_model_path());
    tracing::info!("Loading model: {}", model_path.display());
    let mut engine = pose::create_default_engine(&model_path, args.res.model_size())
        .context("Failed to load pose model")?;

    let mut capture = WebcamCapture::new(
        args.input_device,
        args.res.source_size(),
        args.res.sink_size(),
        args.mirror,
    )
    .context("Failed to initialize webcam capture")?;

    let mut output = V4L2Output::new(&args.output_device, sink_width, sink_height)
        .context("Failed to initialize v4l2loopback output")?;

    let rasterizer = match &args.font {
        Some(path) => Rasterizer::with_font(path)?,
        None => {
            tracing::warn!("No --font given, status text will not be drawn");
            Rasterizer::new()
        }
    };

    let mut anonymizer = FrameAnonymizer::new(AnonymizerConfig {
        anonymize: args.anonymize,
        keypoint_threshold: args.keypoint_threshold,
    });

    run_pipeline(
        &mut capture,
        engine.as_mut(),
        &mut anonymizer,
        &rasterizer,
        &mut output,
        args.fps,
    )
}

fn run_pipeline<C, O>(
    capture: &mut C,
    engine: &mut dyn PoseEngine,
    anonymizer: &mut FrameAnonymizer,
    rasterizer: &Rasterizer,
    output: &mut O,
    target_fps: u32,
) -> Result<()>
where
    C: CaptureSource,
    O: OutputSink,
{
    let frame_duration = Duration::from_secs_f32(1.0 / target_fps.max(1) as f32);

    tracing::info!("Starting main pipeline loop");
    tracing::info!("Press Ctrl+C to stop");

    loop {
        let loop_start = Instant::now();

        let frame = capture
            .capture_frame()
            .context("Failed to capture frame")?;

        let detection = engine.detect(&frame).context("Failed to run pose model")?;

        let mut processed = anonymizer
            .process(&frame, &detection, loop_start)
            .context("Failed to process frame")?;
        rasterizer.draw(&mut processed.frame, &processed.overlay);

        output
            .write_frame(&processed.frame)
            .context("Failed to write frame")?;

        // Log stats every 30 frames
        if anonymizer.timing().frames() % 30 == 0 {
            tracing::info!("Frame {}: {}", anonymizer.timing().frames(), processed.status);
        }

        // Frame rate limiting
        let elapsed = loop_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }
}
