use super::frame::{Frame, FrameFormat};
use anyhow::Result;

/// Trait for camera-style frame acquisition
///
/// Implementations own the underlying device handle. `stop` must be
/// idempotent: the device is released on the first call and later calls are
/// no-ops, so a worker shutdown racing an explicit stop never double-frees
/// the device.
pub trait FrameSource {
    /// Acquire the device and negotiate a capture format
    fn open(&mut self, format: FrameFormat) -> Result<()>;

    /// Grab one frame at the device's native resolution
    ///
    /// Only valid between `open` and `stop`.
    fn grab(&mut self) -> Result<Frame>;

    /// Release the device (idempotent)
    fn stop(&mut self);

    fn is_open(&self) -> bool;
}
