use super::frame::{Frame, FrameFormat};
use super::source::FrameSource;
use crate::messages::CameraCommand;
use anyhow::{Result, anyhow, bail};
use tokio::sync::{mpsc, oneshot};

/// Owns the frame source and serializes all access to it
///
/// The camera device is exclusively owned by this worker: start, capture and
/// stop requests arrive over a command channel, so there is never more than
/// one active acquisition and the device is released exactly once.
///
/// Note: sources may wrap `!Send` device handles, so the worker must be
/// spawned on a LocalSet using tokio::task::spawn_local.
pub struct CameraWorker {
    format: FrameFormat,
    cmd_rx: mpsc::Receiver<CameraCommand>,
    source: Box<dyn FrameSource>,
}

impl CameraWorker {
    pub fn new(
        format: FrameFormat,
        cmd_rx: mpsc::Receiver<CameraCommand>,
        source: Box<dyn FrameSource>,
    ) -> Self {
        Self {
            format,
            cmd_rx,
            source,
        }
    }

    pub async fn run(mut self) {
        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                CameraCommand::Start(reply) => {
                    let result = if self.source.is_open() {
                        Ok(())
                    } else {
                        self.source.open(self.format)
                    };

                    if let Err(e) = &result {
                        tracing::error!("Failed to open camera: {:#}", e);
                    }
                    let _ = reply.send(result);
                }

                CameraCommand::Capture(reply) => {
                    let result = self.source.grab().and_then(|frame| {
                        if frame.pixels.len() != frame.expected_len() {
                            bail!("Source returned a malformed frame buffer");
                        }
                        Ok(frame)
                    });
                    if let Err(e) = &result {
                        tracing::error!("Failed to grab frame: {:#}", e);
                    }
                    let _ = reply.send(result);
                }

                CameraCommand::Stop(reply) => {
                    self.source.stop();
                    let _ = reply.send(());
                }
            }
        }

        // Command channel closed: release the device no matter what state
        // the session was in.
        self.source.stop();
        tracing::debug!("Camera worker exited");
    }
}

/// Handle for communicating with the CameraWorker
#[derive(Clone)]
pub struct CameraHandle {
    tx: mpsc::Sender<CameraCommand>,
}

impl CameraHandle {
    pub fn new(tx: mpsc::Sender<CameraCommand>) -> Self {
        Self { tx }
    }

    pub async fn start(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CameraCommand::Start(reply))
            .await
            .map_err(|e| anyhow!("Failed to send start command: {}", e))?;

        rx.await
            .map_err(|e| anyhow!("Failed to receive start response: {}", e))?
    }

    pub async fn capture(&self) -> Result<Frame> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CameraCommand::Capture(reply))
            .await
            .map_err(|e| anyhow!("Failed to send capture command: {}", e))?;

        rx.await
            .map_err(|e| anyhow!("Failed to receive capture response: {}", e))?
    }

    pub async fn stop(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CameraCommand::Stop(reply))
            .await
            .map_err(|e| anyhow!("Failed to send stop command: {}", e))?;

        rx.await
            .map_err(|e| anyhow!("Failed to receive stop response: {}", e))
    }
}
