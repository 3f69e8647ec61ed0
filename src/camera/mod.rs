pub mod file;
pub mod frame;
pub mod source;
#[cfg(feature = "camera-v4l2")]
pub mod v4l2;
pub mod worker;

pub use file::FileSource;
pub use frame::{Frame, FrameFormat};
pub use source::FrameSource;
#[cfg(feature = "camera-v4l2")]
pub use v4l2::V4l2Source;
pub use worker::{CameraHandle, CameraWorker};
