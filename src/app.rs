use crate::api::{self, ApiClient, FileTokenStore, ProcessedResult};
use crate::camera::{CameraHandle, CameraWorker, FileSource, FrameFormat, FrameSource};
use crate::command::{Command, HELP_TEXT};
use crate::config::Config;
use crate::download;
use crate::encode;
use crate::messages::UploadOutcome;
use crate::session::{CAMERA_FAILED_MESSAGE, CaptureSession, StagingState, UploadDisposition};

use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub struct App {
    config: Config,
    session: CaptureSession,
    camera: CameraHandle,
    api: Arc<ApiClient>,
    upload_tx: mpsc::Sender<UploadOutcome>,
    upload_rx: mpsc::Receiver<UploadOutcome>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let camera = Self::setup_camera(&config)?;
        let api = Arc::new(Self::setup_api_client(&config)?);
        let (upload_tx, upload_rx) = mpsc::channel(10);

        Ok(Self {
            config,
            session: CaptureSession::new(),
            camera,
            api,
            upload_tx,
            upload_rx,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        self.start_camera().await;

        println!("{HELP_TEXT}");

        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        loop {
            tracing::debug!("Main loop: waiting for event");
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read input")? else {
                        tracing::info!("Input closed, shutting down");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match Command::parse(&line) {
                        Ok(Command::Quit) => break,
                        Ok(command) => {
                            if let Err(e) = self.handle_command(command).await {
                                tracing::error!("Error handling command: {:#}", e);
                                println!("{e:#}");
                            }
                        }
                        Err(e) => println!("{e}. Type 'help' for commands."),
                    }
                }
                Some(outcome) = self.upload_rx.recv() => {
                    self.handle_upload_outcome(outcome);
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    break;
                }
            }
        }

        // Unmount: release the camera no matter what state we are in
        self.camera.stop().await?;
        tracing::info!("Scanner shutdown complete");
        Ok(())
    }

    async fn handle_command(&mut self, command: Command) -> Result<()> {
        tracing::debug!("Handling {:?} in state {:?}", command, self.session.state());

        match command {
            Command::Capture => self.handle_capture().await,
            Command::Retake => {
                self.session.retake()?;
                println!("Staged capture discarded.");
                Ok(())
            }
            Command::Save => {
                let index = self.session.save()?;
                println!("Saved to gallery as entry {index}.");
                Ok(())
            }
            Command::Delete(index) => {
                let removed = self.session.delete(index)?;
                println!("Deleted {} from the gallery.", removed.image.name);
                Ok(())
            }
            Command::Download(index) => self.handle_download(index),
            Command::Gallery => {
                self.print_gallery();
                Ok(())
            }
            Command::Help => {
                println!("{HELP_TEXT}");
                Ok(())
            }
            Command::Quit => Ok(()),
        }
    }

    /// Capture, stage, and kick off the auto-upload
    async fn handle_capture(&mut self) -> Result<()> {
        if self.session.state() == StagingState::CameraOff {
            // Retry acquisition instead of failing the capture outright
            self.start_camera().await;
        }
        if self.session.state() != StagingState::CameraOn {
            bail!(
                "Capture is only valid with the camera on (state: {:?})",
                self.session.state()
            );
        }

        let frame = match self.camera.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Capture failed: {:#}", e);
                self.session.camera_failed(CAMERA_FAILED_MESSAGE);
                println!("{CAMERA_FAILED_MESSAGE}");
                return Ok(());
            }
        };

        let image = encode::encode_frame(frame, self.config.jpeg_quality).await?;
        println!("Captured {} ({} bytes). Processing image...", image.name, image.bytes.len());

        let generation = self.session.stage(image.clone())?;
        self.spawn_upload(generation, image);
        self.session.upload_started(generation);
        Ok(())
    }

    fn spawn_upload(&self, generation: u64, image: encode::TempImage) {
        let api = self.api.clone();
        let upload_tx = self.upload_tx.clone();

        tokio::spawn(async move {
            let result = api::upload_image(&api, &image).await;
            let _ = upload_tx.send(UploadOutcome { generation, result }).await;
        });
    }

    fn handle_upload_outcome(&mut self, outcome: UploadOutcome) {
        match self.session.upload_finished(outcome.generation, outcome.result) {
            UploadDisposition::Applied => {
                // upload_finished only applies outcomes for the live capture
                if let Some(result) = self.session.result().cloned() {
                    self.render_result(&result);
                }
            }
            UploadDisposition::Failed => {
                if let Some(message) = self.session.upload_error() {
                    println!("{message}");
                }
            }
            UploadDisposition::Stale => {
                tracing::info!("Ignored upload response for a discarded capture");
            }
        }
    }

    fn render_result(&self, result: &ProcessedResult) {
        if result.found {
            println!("Barcode detected:");
            for barcode in &result.barcodes {
                println!("  type: {}  data: {}", barcode.kind, barcode.data);
            }
        } else {
            println!("No barcode detected in this image. Try again with a clearer image.");
        }

        if !result.processed_image.is_empty() {
            match self.write_annotated_image(&result.processed_image) {
                Ok(path) => println!("Annotated image written to {path:?}"),
                Err(e) => tracing::warn!("Could not write annotated image: {:#}", e),
            }
        }
    }

    /// The annotated preview arrives base64-encoded; decode it next to the
    /// confirmed captures.
    fn write_annotated_image(&self, encoded: &str) -> Result<std::path::PathBuf> {
        let bytes = BASE64
            .decode(encoded)
            .context("Annotated image is not valid base64")?;
        download::save_blob(&self.config.downloads_dir, "processed-preview.jpg", &bytes)
    }

    fn handle_download(&self, index: usize) -> Result<()> {
        let entry = self
            .session
            .gallery()
            .get(index)
            .with_context(|| format!("No gallery entry {index}"))?;

        let path = download::save_blob(
            &self.config.downloads_dir,
            &entry.image.name,
            &entry.image.bytes,
        )?;
        println!("Downloaded to {path:?}");
        Ok(())
    }

    fn print_gallery(&self) {
        let gallery = self.session.gallery();
        if gallery.is_empty() {
            println!("Gallery is empty.");
            return;
        }
        for (index, entry) in gallery.iter().enumerate() {
            let decoded = match &entry.result {
                Some(result) if result.found => format!("{} barcode(s)", result.barcodes.len()),
                Some(_) => "no barcode".to_string(),
                None => "not decoded".to_string(),
            };
            println!("  [{index}] {}  ({decoded})", entry.image.name);
        }
    }

    async fn start_camera(&mut self) {
        match self.camera.start().await {
            Ok(()) => {
                self.session.camera_started();
                tracing::info!("Camera ready");
            }
            Err(e) => {
                tracing::error!("Error accessing camera: {:#}", e);
                self.session.camera_failed(CAMERA_FAILED_MESSAGE);
                println!("{CAMERA_FAILED_MESSAGE}");
            }
        }
    }

    fn setup_camera(config: &Config) -> Result<CameraHandle> {
        let source = Self::build_source(config)?;
        let format = FrameFormat {
            width: config.capture_width,
            height: config.capture_height,
        };
        tracing::debug!(
            "Requested capture format {}x{} ({:.2}:1)",
            format.width,
            format.height,
            format.aspect_ratio()
        );

        // The worker owns the (possibly !Send) device handle, so it runs on
        // the LocalSet via spawn_local.
        let (camera_tx, camera_rx) = mpsc::channel(10);
        let worker = CameraWorker::new(format, camera_rx, source);
        tokio::task::spawn_local(worker.run());

        Ok(CameraHandle::new(camera_tx))
    }

    fn build_source(config: &Config) -> Result<Box<dyn FrameSource>> {
        match config.camera_source.as_str() {
            "file" => Ok(Box::new(FileSource::new(&config.frames_dir))),
            #[cfg(feature = "camera-v4l2")]
            "v4l2" => Ok(Box::new(crate::camera::V4l2Source::new(
                &config.camera_device,
            ))),
            #[cfg(not(feature = "camera-v4l2"))]
            "v4l2" => bail!("This build has no V4L2 support (enable the camera-v4l2 feature)"),
            other => bail!("Unknown camera source: {}", other),
        }
    }

    fn setup_api_client(config: &Config) -> Result<ApiClient> {
        let credentials = Arc::new(FileTokenStore::new(&config.token_path));
        Ok(ApiClient::new(
            &config.api_base_url,
            Duration::from_secs(config.timeout),
            credentials,
        )?
        .with_unauthorized_hook(|| {
            tracing::error!("Unauthorized! Check the token file and sign in again.");
        }))
    }
}
