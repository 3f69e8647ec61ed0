use super::frame::{Frame, FrameFormat};
use super::source::FrameSource;
use anyhow::{Context, Result, bail};
use std::path::PathBuf;

/// Frame source backed by image files in a directory
///
/// Stands in for a physical camera: each `grab` decodes the next image file
/// (sorted by name, wrapping around) at its native resolution. This is the
/// default source so the scanner works on machines without a capture device,
/// and it is what the tests drive.
pub struct FileSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    open: bool,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            next: 0,
            open: false,
        }
    }

    fn scan_dir(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read frames directory: {:?}", self.dir))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("jpg") | Some("jpeg") | Some("png") | Some("bmp")
                )
            })
            .collect();

        files.sort();
        Ok(files)
    }
}

impl FrameSource for FileSource {
    fn open(&mut self, _format: FrameFormat) -> Result<()> {
        let files = self.scan_dir()?;
        if files.is_empty() {
            bail!("No image files found in {:?}", self.dir);
        }

        tracing::info!("File source opened with {} frame(s) from {:?}", files.len(), self.dir);
        self.files = files;
        self.next = 0;
        self.open = true;
        Ok(())
    }

    fn grab(&mut self) -> Result<Frame> {
        if !self.open {
            bail!("File source is not open");
        }

        let path = &self.files[self.next % self.files.len()];
        self.next += 1;

        let img = image::open(path)
            .with_context(|| format!("Failed to decode frame file: {:?}", path))?
            .to_rgb8();

        let (width, height) = img.dimensions();
        Ok(Frame {
            width,
            height,
            pixels: img.into_raw(),
        })
    }

    fn stop(&mut self) {
        if self.open {
            tracing::info!("File source stopped");
            self.open = false;
            self.files.clear();
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
