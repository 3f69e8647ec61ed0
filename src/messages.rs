use crate::api::ProcessedResult;
use crate::camera::Frame;
use anyhow::Result;
use tokio::sync::oneshot;

/// Commands for the camera worker
pub enum CameraCommand {
    Start(oneshot::Sender<Result<()>>),
    Capture(oneshot::Sender<Result<Frame>>),
    Stop(oneshot::Sender<()>),
}

/// Result of a finished upload, tagged with the staging generation it was
/// started for so late responses can be matched against the current capture
pub struct UploadOutcome {
    pub generation: u64,
    pub result: Result<ProcessedResult>,
}
