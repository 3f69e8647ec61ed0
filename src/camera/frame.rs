// NOTE: Frames are always tightly-packed 8-bit RGB. Every source converts to
// this layout at the grab boundary so the encode path never has to care about
// the device's native pixel format.

/// Requested capture format (the device may negotiate a different native size)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameFormat {
    pub width: u32,
    pub height: u32,
}

impl FrameFormat {
    pub const BYTES_PER_PIXEL: usize = 3;

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        // 16:9, the sweet spot for barcode scanning distance
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// A single captured frame at the source's native resolution
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// RGB8, row-major, `width * height * 3` bytes
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * FrameFormat::BYTES_PER_PIXEL
    }
}
