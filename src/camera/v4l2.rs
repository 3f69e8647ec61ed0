use super::frame::{Frame, FrameFormat};
use super::source::FrameSource;
use anyhow::{Context, Result, bail};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

/// Real camera source via Video4Linux2
///
/// Negotiates MJPG at the requested size (the driver may pick the closest
/// supported resolution) and decodes each compressed frame to RGB8. A fresh
/// mmap stream is mapped per grab; still capture is far below the rate where
/// that overhead matters.
pub struct V4l2Source {
    path: String,
    device: Option<Device>,
}

impl V4l2Source {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            device: None,
        }
    }
}

impl FrameSource for V4l2Source {
    fn open(&mut self, format: FrameFormat) -> Result<()> {
        let device = Device::with_path(&self.path)
            .with_context(|| format!("Failed to open camera device {}", self.path))?;

        let wanted = v4l::Format::new(format.width, format.height, FourCC::new(b"MJPG"));
        let negotiated = device
            .set_format(&wanted)
            .context("Failed to negotiate capture format")?;

        if &negotiated.fourcc.repr != b"MJPG" {
            bail!(
                "Camera {} does not support MJPG capture (got {})",
                self.path,
                negotiated.fourcc
            );
        }

        tracing::info!(
            "Camera {} opened at {}x{}",
            self.path,
            negotiated.width,
            negotiated.height
        );
        self.device = Some(device);
        Ok(())
    }

    fn grab(&mut self) -> Result<Frame> {
        let device = self
            .device
            .as_ref()
            .context("Camera source is not open")?;

        let mut stream = Stream::with_buffers(device, Type::VideoCapture, 4)
            .context("Failed to map capture buffers")?;

        // First frame after streamon is often stale or half-exposed
        let _ = stream.next().context("Failed to dequeue warmup frame")?;
        let (buf, meta) = stream.next().context("Failed to dequeue frame")?;

        let img = image::load_from_memory(&buf[..meta.bytesused as usize])
            .context("Failed to decode MJPG frame")?
            .to_rgb8();

        let (width, height) = img.dimensions();
        Ok(Frame {
            width,
            height,
            pixels: img.into_raw(),
        })
    }

    fn stop(&mut self) {
        if self.device.take().is_some() {
            tracing::info!("Camera {} released", self.path);
        }
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }
}
