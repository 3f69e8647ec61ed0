use crate::api::ProcessedResult;
use crate::encode::TempImage;
use anyhow::{Result, bail};

pub const CAMERA_FAILED_MESSAGE: &str =
    "Unable to access camera. Please grant camera permissions.";
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to process the image. Please try again.";

/// Staging lifecycle of the current capture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StagingState {
    CameraOff,
    CameraOn,
    /// TempImage present, no result yet (also the state after a failed upload)
    Staged,
    /// Upload in flight
    Processing,
    /// TempImage plus its ProcessedResult
    Resolved,
}

/// A capture the user chose to keep, with whatever result was attached at
/// save time
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub image: TempImage,
    pub result: Option<ProcessedResult>,
}

/// What became of an upload outcome when it arrived
#[derive(Debug, PartialEq, Eq)]
pub enum UploadDisposition {
    Applied,
    Failed,
    /// The capture it belonged to is gone; the response was discarded
    Stale,
}

/// The capture/upload state machine
///
/// Pure bookkeeping, no I/O: the app loop feeds it camera outcomes, staged
/// images and upload outcomes, and reads back what to show. At most one
/// TempImage exists at a time and a ProcessedResult never outlives the
/// TempImage it was decoded from.
///
/// Every staging bumps a generation counter and upload outcomes carry the
/// generation they were started for, so a response that arrives after a
/// retake or a newer capture is recognized as stale and dropped instead of
/// being displayed against the wrong image.
pub struct CaptureSession {
    state: StagingState,
    temp_image: Option<TempImage>,
    result: Option<ProcessedResult>,
    gallery: Vec<CapturedImage>,
    generation: u64,
    camera_error: Option<String>,
    upload_error: Option<String>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            state: StagingState::CameraOff,
            temp_image: None,
            result: None,
            gallery: Vec::new(),
            generation: 0,
            camera_error: None,
            upload_error: None,
        }
    }

    pub fn state(&self) -> StagingState {
        self.state
    }

    pub fn temp_image(&self) -> Option<&TempImage> {
        self.temp_image.as_ref()
    }

    pub fn result(&self) -> Option<&ProcessedResult> {
        self.result.as_ref()
    }

    pub fn gallery(&self) -> &[CapturedImage] {
        &self.gallery
    }

    pub fn camera_error(&self) -> Option<&str> {
        self.camera_error.as_deref()
    }

    pub fn upload_error(&self) -> Option<&str> {
        self.upload_error.as_deref()
    }

    /// Camera acquisition succeeded
    pub fn camera_started(&mut self) {
        self.camera_error = None;
        if self.state == StagingState::CameraOff {
            self.state = StagingState::CameraOn;
        }
    }

    /// Camera acquisition failed; the session stays usable for a retry
    pub fn camera_failed(&mut self, message: impl Into<String>) {
        self.camera_error = Some(message.into());
    }

    /// Stage a fresh capture. Any previous result is cleared atomically with
    /// staging, and the returned generation must accompany the upload so its
    /// outcome can be matched back.
    pub fn stage(&mut self, image: TempImage) -> Result<u64> {
        if self.state != StagingState::CameraOn {
            bail!("Capture is only valid with the camera on (state: {:?})", self.state);
        }

        self.result = None;
        self.upload_error = None;
        self.temp_image = Some(image);
        self.generation += 1;
        self.state = StagingState::Staged;
        Ok(self.generation)
    }

    /// The auto-upload for the given staging left the ground
    pub fn upload_started(&mut self, generation: u64) {
        if generation == self.generation && self.state == StagingState::Staged {
            self.state = StagingState::Processing;
        }
    }

    /// Apply an upload outcome, unless the capture it belongs to is gone
    pub fn upload_finished(
        &mut self,
        generation: u64,
        outcome: Result<ProcessedResult>,
    ) -> UploadDisposition {
        if generation != self.generation || self.temp_image.is_none() {
            tracing::debug!(
                "Discarding stale upload outcome (generation {} vs {})",
                generation,
                self.generation
            );
            return UploadDisposition::Stale;
        }

        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.upload_error = None;
                self.state = StagingState::Resolved;
                UploadDisposition::Applied
            }
            Err(_) => {
                // TempImage is kept so the user can retry or retake
                self.upload_error = Some(UPLOAD_FAILED_MESSAGE.to_string());
                self.state = StagingState::Staged;
                UploadDisposition::Failed
            }
        }
    }

    /// Discard the staged capture and its result. Valid while an upload is
    /// still in flight; the late response will be dropped as stale.
    pub fn retake(&mut self) -> Result<()> {
        match self.state {
            StagingState::Staged | StagingState::Processing | StagingState::Resolved => {
                self.temp_image = None;
                self.result = None;
                self.upload_error = None;
                self.generation += 1;
                self.state = StagingState::CameraOn;
                Ok(())
            }
            state => bail!("Nothing staged to retake (state: {:?})", state),
        }
    }

    /// Confirm the staged capture into the gallery; returns its index
    pub fn save(&mut self) -> Result<usize> {
        if !matches!(self.state, StagingState::Staged | StagingState::Resolved) {
            bail!("Nothing staged to save (state: {:?})", self.state);
        }
        let image = match self.temp_image.take() {
            Some(image) => image,
            None => bail!("Staged state without a staged image"),
        };

        self.gallery.push(CapturedImage {
            image,
            result: self.result.take(),
        });
        self.upload_error = None;
        self.generation += 1;
        self.state = StagingState::CameraOn;
        Ok(self.gallery.len() - 1)
    }

    /// Remove one gallery entry; later entries shift down, earlier ones are
    /// untouched
    pub fn delete(&mut self, index: usize) -> Result<CapturedImage> {
        if index >= self.gallery.len() {
            bail!(
                "No gallery entry {} (gallery holds {})",
                index,
                self.gallery.len()
            );
        }
        Ok(self.gallery.remove(index))
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}
