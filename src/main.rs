//! Digit Canvas - draw a digit, snapshot it, classify it
//!
//! Headless demo shell around the drawing pipeline: scripted gestures stand
//! in for a touch screen, and predictions print to the log instead of a UI
//! label.

use anyhow::Context;
use digit_canvas::app::cli::{Cli, Commands};
use digit_canvas::app::config::Config;
use digit_canvas::canvas::{Bitmap, GestureRingBuffer, Rasterizer};
use digit_canvas::classify::{Classifier, LinearClassifier, LinearModel, RemoteClassifier};
use digit_canvas::snapshot::{display_channel, DisplayState, LoopConfig};
use digit_canvas::workflow::{scripted_digit, DrawingSession};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    // Execute command
    match cli.command {
        Commands::Demo {
            digit,
            ticks,
            model,
            remote,
            preview,
        } => {
            run_demo(digit, ticks, model, remote, preview, &config)?;
        }
        Commands::Classify {
            input,
            digit,
            model,
        } => {
            run_classify(input, digit, model, &config)?;
        }
        Commands::MakeModel { output } => {
            run_make_model(&output, &config)?;
        }
        Commands::Config => {
            println!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Pick the classification backend: remote endpoint if one is named on the
/// command line or in config, the on-device model otherwise. Model loading
/// failures abort here rather than limping along without a classifier.
fn build_classifier(
    model: Option<PathBuf>,
    remote: Option<String>,
    config: &Config,
) -> anyhow::Result<Arc<dyn Classifier>> {
    if let Some(endpoint) = remote.or_else(|| config.remote.endpoint.clone()) {
        info!(endpoint = %endpoint, "using remote classification service");
        let classifier = RemoteClassifier::new(
            endpoint,
            Duration::from_millis(config.remote.timeout_ms),
            config.remote.max_retries,
        )?;
        return Ok(Arc::new(classifier));
    }

    let path = model.unwrap_or_else(|| config.model.path.clone());
    let classifier = LinearClassifier::load(&path)
        .with_context(|| format!("could not load classification model {}", path.display()))?;
    Ok(Arc::new(classifier))
}

fn rasterizer_for(config: &Config) -> Rasterizer {
    Rasterizer {
        stroke_width: config.canvas.stroke_width,
        ..Rasterizer::default()
    }
}

fn run_demo(
    digit: u8,
    ticks: u64,
    model: Option<PathBuf>,
    remote: Option<String>,
    preview: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let classifier = build_classifier(model, remote, config)?;
    info!(digit, ticks, backend = classifier.name(), "starting demo");

    let session = DrawingSession::new(config.canvas.width, config.canvas.height, rasterizer_for(config));

    // Feed the scripted gestures the way a platform input callback would:
    // through the lock-free ring buffer
    let buffer = GestureRingBuffer::with_capacity(config.canvas.ring_buffer_size);
    let stats = buffer.stats();
    let (mut producer, mut consumer) = buffer.split();
    for event in scripted_digit(digit, config.canvas.width, config.canvas.height)? {
        producer.push(event);
    }
    let applied = session.drain_gestures(&mut consumer);
    debug!(
        applied,
        dropped = stats.events_dropped.load(std::sync::atomic::Ordering::Relaxed),
        "gesture feed drained"
    );

    let loop_config = LoopConfig {
        period: config.schedule.period(),
        initial_delay: config.schedule.initial_delay(),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let final_state = runtime.block_on(async {
        let (tx, mut rx) = display_channel();
        let snapshot_loop = session.start_loop(classifier, tx, loop_config);

        // This task plays the display context: it drains the hand-off
        // channel and owns the prediction label
        let mut state = DisplayState::default();
        let deadline = tokio::time::Instant::now()
            + loop_config.initial_delay
            + loop_config.period * ticks as u32;

        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if rx.drain_into(&mut state) > 0 {
                if let Some(label) = state.label() {
                    info!(
                        tick = state.last_tick(),
                        label,
                        confidence = state.confidence().unwrap_or(0.0),
                        "prediction updated"
                    );
                }
            }
        }

        snapshot_loop.shutdown().await;
        // Late results may still be in flight; give them one drain
        tokio::time::sleep(Duration::from_millis(100)).await;
        rx.drain_into(&mut state);
        state
    });

    match final_state.label() {
        Some(label) => println!(
            "Prediction: {} ({:.0}%)",
            label,
            final_state.confidence().unwrap_or(0.0) * 100.0
        ),
        None => println!("Prediction: (none)"),
    }

    if preview {
        if let Some(bitmap) = final_state.preview() {
            let name = chrono::Local::now()
                .format("preview_%Y%m%d_%H%M%S.pgm")
                .to_string();
            std::fs::write(&name, bitmap.encode_pgm())?;
            info!(file = %name, "preview snapshot written");
        }
    }

    Ok(())
}

fn run_classify(
    input: Option<PathBuf>,
    digit: u8,
    model: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<()> {
    let classifier = build_classifier(model, None, config)?;

    let bitmap = match input {
        Some(path) => {
            let data = std::fs::read(&path)
                .with_context(|| format!("could not read {}", path.display()))?;
            Bitmap::decode_pgm(&data)?
        }
        None => {
            let session =
                DrawingSession::new(config.canvas.width, config.canvas.height, rasterizer_for(config));
            for event in scripted_digit(digit, config.canvas.width, config.canvas.height)? {
                session.apply(event);
            }
            session
                .snapshot()
                .context("canvas has zero area; nothing to classify")?
        }
    };

    let predictions = classifier.classify(&bitmap)?;
    if predictions.is_empty() {
        println!("No candidates returned");
        return Ok(());
    }

    println!("{:<8} {:>10}", "label", "confidence");
    for prediction in &predictions {
        println!("{:<8} {:>9.1}%", prediction.label, prediction.confidence * 100.0);
    }
    Ok(())
}

/// Build the bundled demo model: each digit's scripted drawing, rasterized
/// and downscaled to the model input size, becomes that digit's template row.
fn run_make_model(output: &Path, config: &Config) -> anyhow::Result<()> {
    let mut labels = Vec::new();
    let mut templates = Vec::new();

    for digit in 0..=9u8 {
        let session =
            DrawingSession::new(config.canvas.width, config.canvas.height, rasterizer_for(config));
        for event in scripted_digit(digit, config.canvas.width, config.canvas.height)? {
            session.apply(event);
        }
        let bitmap = session
            .snapshot()
            .context("canvas has zero area; cannot build templates")?;
        templates.push(bitmap.downscale(config.model.input_width, config.model.input_height)?);
        labels.push(digit.to_string());
    }

    let model = LinearModel::from_templates(labels, &templates)?;
    let classifier = LinearClassifier::from_model(model)?;
    classifier.save(output)?;
    info!(
        path = %output.display(),
        input = %format!("{}x{}", config.model.input_width, config.model.input_height),
        "demo model written"
    );
    println!("Wrote {}", output.display());
    Ok(())
}
