use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use moodlens_core::page::{decode_upload, ShownImage};
use moodlens_core::{
    render, Analyzer, CommandClassifier, DetectorBackend, EmotionClassifier, EmotionLabel, Locale,
    OnnxEmotionClassifier, PageController, PageView, UiText, UploadedFile,
};
use moodlens_hw::{Camera, SnapshotOptions};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod session;
mod ui;

use config::{ClassifierKind, Config};
use session::CameraSettings;
use ui::Painter;

#[derive(Parser)]
#[command(name = "moodlens", about = "Emotion feedback for face photos")]
struct Cli {
    /// Config file (default: ~/.config/moodlens/moodlens.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// UI language: ko or en
    #[arg(long, global = true)]
    locale: Option<Locale>,

    /// Classifier implementation
    #[arg(long, global = true, value_enum)]
    classifier: Option<ClassifierKind>,

    /// Directory with det_10g.onnx and facial_expression.onnx
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Face detector: scrfd or skip
    #[arg(long, global = true)]
    detector: Option<DetectorBackend>,

    /// V4L2 device for the camera surface
    #[arg(long, global = true)]
    camera: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive camera and upload session (default)
    Session,
    /// Analyze one JPG/JPEG/PNG file
    Analyze {
        file: PathBuf,
        /// Print the raw scores as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the recognized emotions and their feedback
    Emotions,
    /// List V4L2 capture devices
    Devices,
}

type BoxedClassifier = Box<dyn EmotionClassifier + Send>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    if let Some(classifier) = cli.classifier {
        config.classifier = classifier;
    }
    if let Some(dir) = cli.model_dir {
        config.model_dir = dir;
    }
    if let Some(backend) = cli.detector {
        config.detector_backend = backend;
    }
    if let Some(device) = cli.camera {
        config.camera_device = device;
    }
    tracing::debug!(?config, "effective configuration");

    let mut painter = Painter::new(std::io::stdout(), use_color());

    match cli.command.unwrap_or(Commands::Session) {
        Commands::Session => {
            let page = PageController::new(analyzer(&config)?, config.locale);
            let text = page.text();
            let sidebar = page.sidebar();
            let settings = CameraSettings {
                device: config.camera_device.clone(),
                width: config.camera_width,
                height: config.camera_height,
                snapshot: SnapshotOptions {
                    warmup_frames: config.warmup_frames,
                    ..SnapshotOptions::default()
                },
            };
            let handle = session::spawn_page(page, settings)?;
            session::run(handle, &mut painter, text, &sidebar).await?;
        }
        Commands::Analyze { file, json } => {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let bytes = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let image = decode_upload(&UploadedFile { name, bytes })
                .with_context(|| format!("loading {}", file.display()))?;

            let mut analyzer = analyzer(&config)?;
            let result = analyzer.analyze(&image)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let text = UiText::for_locale(config.locale);
                let view = PageView {
                    image: Some(ShownImage {
                        caption: text.uploaded_caption,
                        width: image.width(),
                        height: image.height(),
                    }),
                    result: Some(render(&result, config.locale)),
                    analyzed: true,
                    ..PageView::default()
                };
                painter.view(&view, text)?;
            }
        }
        Commands::Emotions => {
            for label in EmotionLabel::ALL {
                let fb = label.feedback(config.locale);
                println!("{:<9} {} {:<6} {}  {}", label.as_str(), fb.emoji, fb.name, fb.color, fb.message);
            }
        }
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("no V4L2 capture devices found");
            }
            for dev in devices {
                println!("{}  {} ({}, {})", dev.path, dev.name, dev.driver, dev.bus);
            }
        }
    }

    Ok(())
}

fn analyzer(config: &Config) -> Result<Analyzer<BoxedClassifier>> {
    let classifier = build_classifier(config)?;
    let analyzer = Analyzer::new(classifier, config.detector_backend);
    Ok(match &config.temp_dir {
        Some(dir) => analyzer.with_temp_dir(dir),
        None => analyzer,
    })
}

fn build_classifier(config: &Config) -> Result<BoxedClassifier> {
    match config.classifier {
        ClassifierKind::Onnx => {
            let detector_path = config.detector_model_path();
            let detector = match config.detector_backend {
                DetectorBackend::Scrfd => Some(detector_path.as_path()),
                DetectorBackend::Skip => None,
            };
            let fer_path = config.fer_model_path();
            let classifier = OnnxEmotionClassifier::load(&fer_path, detector, config.fer_layout)
                .with_context(|| format!("loading models from {}", config.model_dir.display()))?;
            Ok(Box::new(classifier))
        }
        ClassifierKind::Command => {
            let line = config
                .command
                .as_deref()
                .context("classifier = \"command\" needs `command` (or MOODLENS_CLASSIFIER_COMMAND)")?;
            let classifier = CommandClassifier::from_command_line(line)
                .with_context(|| format!("empty classifier command: {line:?}"))?;
            tracing::info!(command = line, "using external classifier");
            Ok(Box::new(classifier))
        }
    }
}

fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
