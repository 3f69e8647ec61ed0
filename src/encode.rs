use crate::camera::Frame;
use anyhow::{Context, Result};
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use std::sync::atomic::{AtomicU64, Ordering};

/// Matches the 0.9 canvas export quality the service is tuned for
pub const JPEG_QUALITY: u8 = 90;

/// The staged, not-yet-confirmed capture: a named in-memory JPEG
#[derive(Debug, Clone)]
pub struct TempImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

static CAPTURE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Time-based name plus a process-local sequence, so two captures within the
/// same millisecond still get distinct names.
fn capture_name() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = CAPTURE_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("barcode-capture-{millis}-{seq}.jpg")
}

/// Encode a captured frame as JPEG at its native resolution.
///
/// Encoding runs on the blocking pool so a large frame never stalls the
/// event loop.
pub async fn encode_frame(frame: Frame, quality: u8) -> Result<TempImage> {
    tokio::task::spawn_blocking(move || {
        let img = RgbImage::from_raw(frame.width, frame.height, frame.pixels)
            .context("Frame buffer does not match its dimensions")?;

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality)
            .encode_image(&img)
            .context("Failed to encode frame as JPEG")?;

        Ok(TempImage {
            name: capture_name(),
            bytes,
        })
    })
    .await
    .context("JPEG encode task panicked")?
}
