//! Interactive session: a command loop on stdin driving the page controller.
//!
//! The controller and the camera live on a dedicated OS thread; the async loop
//! parses commands, forwards page commands over a channel and paints replies.

use crate::ui::Painter;
use anyhow::{Context, Result};
use image::DynamicImage;
use moodlens_core::{
    EmotionClassifier, Notice, PageController, PageEvent, PageView, SessionState, UploadedFile,
};
use moodlens_hw::{Camera, SnapshotOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};

/// A command that changes or queries the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCommand {
    CameraOn,
    CameraOff,
    /// Take a still from the camera, or use the given image file as the still.
    Snap(Option<PathBuf>),
    Analyze,
    Clear,
    Upload(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Page(PageCommand),
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "on" => Command::Page(PageCommand::CameraOn),
        "off" => Command::Page(PageCommand::CameraOff),
        "snap" => Command::Page(PageCommand::Snap((!rest.is_empty()).then(|| PathBuf::from(rest)))),
        "analyze" => Command::Page(PageCommand::Analyze),
        "clear" => Command::Page(PageCommand::Clear),
        "upload" => {
            if rest.is_empty() {
                return Err("usage: upload <file>".to_string());
            }
            Command::Page(PageCommand::Upload(PathBuf::from(rest)))
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };

    if !rest.is_empty() && !matches!(command, Command::Page(PageCommand::Snap(_) | PageCommand::Upload(_))) {
        return Err(format!("{word} takes no arguments"));
    }
    Ok(Some(command))
}

/// Where the camera lives and how stills are taken.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub snapshot: SnapshotOptions,
}

/// Reply to one page command.
pub struct PageReply {
    pub view: PageView,
    pub state: SessionState,
    pub has_snapshot: bool,
}

struct PageRequest {
    command: PageCommand,
    reply: oneshot::Sender<PageReply>,
}

/// Clone-safe handle to the page thread.
#[derive(Clone)]
pub struct PageHandle {
    tx: mpsc::Sender<PageRequest>,
}

impl PageHandle {
    pub async fn send(&self, command: PageCommand) -> Result<PageReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PageRequest {
                command,
                reply: reply_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("page thread exited"))?;
        reply_rx.await.context("page thread dropped the request")
    }
}

/// Owns the controller and, while the camera is on, the open device.
struct PageWorker<C> {
    page: PageController<C>,
    settings: CameraSettings,
    camera: Option<Camera>,
}

impl<C: EmotionClassifier> PageWorker<C> {
    fn handle(&mut self, command: PageCommand) -> PageView {
        let text = self.page.text();
        match command {
            PageCommand::CameraOn => self.page.handle(PageEvent::CameraOn),
            PageCommand::CameraOff => {
                if self.camera.take().is_some() {
                    tracing::debug!(device = %self.settings.device, "camera released");
                }
                self.page.handle(PageEvent::CameraOff)
            }
            PageCommand::Snap(_) if !self.page.state().camera_enabled => {
                notice(Notice::Info(text.camera_disabled.to_string()))
            }
            PageCommand::Snap(Some(path)) => match image::open(&path) {
                Ok(image) => self.page.handle(PageEvent::Snapshot(image)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot open still");
                    notice(Notice::Error(format!("{}: {e}", text.unreadable_upload)))
                }
            },
            PageCommand::Snap(None) => match self.capture() {
                Ok(image) => self.page.handle(PageEvent::Snapshot(image)),
                Err(e) => self.page.handle(PageEvent::CameraFailed(e.to_string())),
            },
            PageCommand::Analyze => self.page.handle(PageEvent::ConfirmCapture),
            PageCommand::Clear => self.page.handle(PageEvent::ClearSnapshot),
            PageCommand::Upload(path) => match read_upload(&path) {
                Ok(file) => self.page.handle(PageEvent::Upload(file)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot read upload");
                    notice(Notice::Error(format!("{}: {e}", text.unreadable_upload)))
                }
            },
        }
    }

    /// Open the device on first use, then take one still.
    fn capture(&mut self) -> Result<DynamicImage, moodlens_hw::CameraError> {
        let camera = match self.camera.take() {
            Some(camera) => camera,
            None => Camera::open(&self.settings.device, self.settings.width, self.settings.height)?,
        };
        let still = camera.snapshot(self.settings.snapshot);
        self.camera = Some(camera);
        Ok(DynamicImage::ImageRgb8(still?))
    }
}

fn notice(notice: Notice) -> PageView {
    PageView {
        notices: vec![notice],
        ..PageView::default()
    }
}

fn read_upload(path: &Path) -> std::io::Result<UploadedFile> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedFile { name, bytes })
}

/// Spawn the page controller on a dedicated OS thread.
pub fn spawn_page<C>(page: PageController<C>, settings: CameraSettings) -> Result<PageHandle>
where
    C: EmotionClassifier + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<PageRequest>(4);
    let mut worker = PageWorker {
        page,
        settings,
        camera: None,
    };

    std::thread::Builder::new()
        .name("moodlens-page".into())
        .spawn(move || {
            tracing::debug!("page thread started");
            while let Some(req) = rx.blocking_recv() {
                let view = worker.handle(req.command);
                let _ = req.reply.send(PageReply {
                    view,
                    state: worker.page.state(),
                    has_snapshot: worker.page.has_snapshot(),
                });
            }
            tracing::debug!("page thread exiting");
        })
        .context("failed to spawn page thread")?;

    Ok(PageHandle { tx })
}

/// Read commands from stdin until `quit`, end of input or Ctrl-C.
pub async fn run<W: Write>(
    handle: PageHandle,
    painter: &mut Painter<W>,
    text: &'static moodlens_core::UiText,
    sidebar: &moodlens_core::Sidebar,
) -> Result<()> {
    painter.header(text)?;
    painter.sidebar(sidebar)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = SessionState::default();
    let mut has_snapshot = false;

    loop {
        prompt(state)?;
        let line = tokio::select! {
            line = lines.next_line() => line.context("reading stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                None
            }
        };
        let Some(line) = line else { break };

        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(Command::Help)) => painter.sidebar(sidebar)?,
            Ok(Some(Command::Page(command))) => {
                if runs_analysis(&command, state, has_snapshot) {
                    painter.analyzing(text)?;
                }
                let reply = handle.send(command).await?;
                state = reply.state;
                has_snapshot = reply.has_snapshot;
                painter.view(&reply.view, text)?;
            }
            Err(msg) => println!("{msg}"),
        }
    }

    println!();
    Ok(())
}

/// Whether the controller will call the classifier for `command`.
fn runs_analysis(command: &PageCommand, state: SessionState, has_snapshot: bool) -> bool {
    match command {
        PageCommand::Upload(_) => true,
        PageCommand::Analyze => state.camera_enabled && has_snapshot,
        PageCommand::Snap(_) => state.capture_confirmed,
        _ => false,
    }
}

fn prompt(state: SessionState) -> std::io::Result<()> {
    let mark = match (state.camera_enabled, state.capture_confirmed) {
        (false, _) => "camera off",
        (true, false) => "camera on",
        (true, true) => "captured",
    };
    let mut out = std::io::stdout();
    write!(out, "[{mark}] > ")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodlens_core::{
        AnalysisResult, AnalyzeRequest, Analyzer, ClassifierError, ClassifierResponse,
        DetectorBackend, Locale,
    };

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("on"), Ok(Some(Command::Page(PageCommand::CameraOn))));
        assert_eq!(parse_command("  OFF "), Ok(Some(Command::Page(PageCommand::CameraOff))));
        assert_eq!(parse_command("analyze"), Ok(Some(Command::Page(PageCommand::Analyze))));
        assert_eq!(parse_command("clear"), Ok(Some(Command::Page(PageCommand::Clear))));
        assert_eq!(parse_command("help"), Ok(Some(Command::Help)));
        assert_eq!(parse_command("q"), Ok(Some(Command::Quit)));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn test_parse_paths() {
        assert_eq!(parse_command("snap"), Ok(Some(Command::Page(PageCommand::Snap(None)))));
        assert_eq!(
            parse_command("snap me.jpg"),
            Ok(Some(Command::Page(PageCommand::Snap(Some(PathBuf::from("me.jpg"))))))
        );
        assert_eq!(
            parse_command("upload my face.png"),
            Ok(Some(Command::Page(PageCommand::Upload(PathBuf::from("my face.png")))))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("upload").is_err());
        assert!(parse_command("dance").is_err());
        assert!(parse_command("on now").is_err());
    }

    #[test]
    fn test_runs_analysis() {
        let off = SessionState::default();
        let on = SessionState { camera_enabled: true, capture_confirmed: false };
        let captured = SessionState { camera_enabled: true, capture_confirmed: true };
        assert!(runs_analysis(&PageCommand::Upload(PathBuf::from("a.png")), off, false));
        assert!(!runs_analysis(&PageCommand::Analyze, off, false));
        assert!(!runs_analysis(&PageCommand::Analyze, on, false));
        assert!(runs_analysis(&PageCommand::Analyze, on, true));
        assert!(!runs_analysis(&PageCommand::Snap(None), on, true));
        assert!(runs_analysis(&PageCommand::Snap(None), captured, true));
        assert!(!runs_analysis(&PageCommand::CameraOff, captured, true));
    }

    struct FixedClassifier;

    impl EmotionClassifier for FixedClassifier {
        fn analyze(
            &mut self,
            _image_path: &Path,
            _request: &AnalyzeRequest,
        ) -> Result<ClassifierResponse, ClassifierError> {
            let scores = [("surprise".to_string(), 70.0), ("fear".to_string(), 30.0)]
                .into_iter()
                .collect();
            Ok(ClassifierResponse::Single(AnalysisResult::from_scores(scores).unwrap()))
        }
    }

    fn worker() -> PageWorker<FixedClassifier> {
        let analyzer = Analyzer::new(FixedClassifier, DetectorBackend::Skip);
        PageWorker {
            page: PageController::new(analyzer, Locale::En),
            settings: CameraSettings {
                device: "/dev/moodlens-no-such-camera".into(),
                width: 640,
                height: 480,
                snapshot: SnapshotOptions::default(),
            },
            camera: None,
        }
    }

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(8, 8, image::Rgb([100, 100, 100]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_snap_from_file_then_analyze() {
        let dir = tempfile::tempdir().unwrap();
        let still = write_png(dir.path(), "still.png");
        let mut worker = worker();

        worker.handle(PageCommand::CameraOn);
        let view = worker.handle(PageCommand::Snap(Some(still)));
        assert!(!view.analyzed);
        let view = worker.handle(PageCommand::Analyze);
        assert!(view.analyzed);
        assert_eq!(view.result.unwrap().headline.label, "surprise");
        assert!(worker.page.state().capture_confirmed);
    }

    #[test]
    fn test_snap_while_camera_off_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let still = write_png(dir.path(), "still.png");
        let mut worker = worker();

        let view = worker.handle(PageCommand::Snap(Some(still)));
        assert_eq!(view.notices, vec![Notice::Info("The camera is off.".into())]);
        assert!(!worker.page.has_snapshot());
    }

    #[test]
    fn test_missing_camera_reports_error() {
        let mut worker = worker();
        worker.handle(PageCommand::CameraOn);
        let view = worker.handle(PageCommand::Snap(None));
        match &view.notices[..] {
            [Notice::Error(msg)] => assert!(msg.starts_with("Camera error: device not found")),
            other => panic!("unexpected notices: {other:?}"),
        }
        assert!(worker.camera.is_none());
    }

    #[test]
    fn test_upload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let face = write_png(dir.path(), "face.png");
        let mut worker = worker();

        let view = worker.handle(PageCommand::Upload(face));
        assert!(view.analyzed);
        assert_eq!(view.image.unwrap().caption, "Uploaded image");

        let view = worker.handle(PageCommand::Upload(dir.path().join("gone.png")));
        assert!(matches!(view.notices.as_slice(), [Notice::Error(_)]));
    }

    #[tokio::test]
    async fn test_page_thread_round_trip() {
        let w = worker();
        let handle = spawn_page(w.page, w.settings).unwrap();
        let reply = handle.send(PageCommand::CameraOn).await.unwrap();
        assert!(reply.state.camera_enabled);
        let reply = handle.send(PageCommand::CameraOff).await.unwrap();
        assert_eq!(reply.state, SessionState::default());
    }
}
